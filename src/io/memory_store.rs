use chrono::Utc;
use uuid::Uuid;

use crate::io::store::{Store, StoreError};
use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId, ItemSet};
use crate::model::project::{Project, ProjectDraft, ProjectId};
use crate::model::user::UserId;

/// A store that lives entirely in process memory.
///
/// It enforces the same referential rules as the file store: a parent must
/// exist in the same project.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    projects: Vec<Project>,
    items: ItemSet,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    /// Start with existing records.
    pub fn with_records(projects: Vec<Project>, items: Vec<Item>) -> Self {
        MemoryStore {
            projects,
            items: ItemSet::from_items(items),
        }
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    fn check_parent(&self, parent: Option<&ItemId>, project: &ProjectId) -> Result<(), StoreError> {
        if let Some(parent) = parent {
            match self.items.get(parent.as_str()) {
                Some(p) if &p.project_id == project => {}
                _ => {
                    return Err(StoreError::Rejected(format!(
                        "parent {} does not exist in project {}",
                        parent, project
                    )));
                }
            }
        }
        Ok(())
    }
}

impl Store for MemoryStore {
    fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|p| &p.owner_id == owner)
            .cloned()
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        let project = Project {
            id: ProjectId::new(Uuid::new_v4().to_string()),
            name: draft.name.clone(),
            owner_id: draft.owner_id.clone(),
            created_at: Utc::now(),
        };
        self.projects.push(project.clone());
        Ok(project)
    }

    fn list_items(&self, project: &ProjectId) -> Result<Vec<Item>, StoreError> {
        Ok(self
            .items
            .iter()
            .filter(|i| &i.project_id == project)
            .cloned()
            .collect())
    }

    fn insert_item(&mut self, draft: &ItemDraft, project: &ProjectId) -> Result<Item, StoreError> {
        self.check_parent(draft.parent_id.as_ref(), project)?;
        let item = Item {
            id: ItemId::generate(),
            name: draft.name.clone(),
            image_url: draft.image_url.clone(),
            note: draft.note.clone(),
            parent_id: draft.parent_id.clone(),
            project_id: project.clone(),
            created_at: Utc::now(),
        };
        self.items.push(item.clone());
        Ok(item)
    }

    fn update_item(&mut self, id: &ItemId, changes: &ItemChanges) -> Result<(), StoreError> {
        let project = self
            .items
            .get(id.as_str())
            .map(|i| i.project_id.clone())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(parent) = &changes.parent_id {
            self.check_parent(parent.as_ref(), &project)?;
        }
        if let Some(item) = self.items.get_mut(id.as_str()) {
            changes.apply_to(item);
        }
        Ok(())
    }

    fn delete_items(&mut self, ids: &[ItemId]) -> Result<(), StoreError> {
        self.items.remove_all(ids);
        Ok(())
    }
}
