use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde::de::DeserializeOwned;
use tempfile::NamedTempFile;
use uuid::Uuid;

use crate::io::store::{Store, StoreError};
use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId};
use crate::model::project::{Project, ProjectDraft, ProjectId};
use crate::model::user::UserId;

const PROJECTS_FILE: &str = "projects.json";
const ITEMS_FILE: &str = "items.json";

/// One row of `projects.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectRow {
    pub id: String,
    pub name: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
}

/// One row of `items.json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRow {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    #[serde(default)]
    pub parent_id: Option<String>,
    pub project_id: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ProjectRow> for Project {
    fn from(row: &ProjectRow) -> Self {
        Project {
            id: ProjectId::new(&row.id),
            name: row.name.clone(),
            owner_id: UserId::new(&row.owner_id),
            created_at: row.created_at,
        }
    }
}

impl From<&ItemRow> for Item {
    fn from(row: &ItemRow) -> Self {
        Item {
            id: ItemId::new(&row.id),
            name: row.name.clone(),
            image_url: row.image_url.clone(),
            note: row.note.clone(),
            parent_id: row.parent_id.as_deref().map(ItemId::from),
            project_id: ProjectId::new(&row.project_id),
            created_at: row.created_at,
        }
    }
}

/// Write a file atomically: temp file in the same directory, then rename.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

/// A store backed by two JSON row files in one directory.
///
/// Every mutation rewrites the affected file. If the write fails the
/// in-memory rows are put back, so the store never reports a state it
/// could not persist.
#[derive(Debug)]
pub struct FileStore {
    dir: PathBuf,
    projects: Vec<ProjectRow>,
    items: Vec<ItemRow>,
}

impl FileStore {
    /// Open the store in `dir`, creating the directory if needed. Missing
    /// row files count as empty.
    pub fn open(dir: &Path) -> Result<Self, StoreError> {
        fs::create_dir_all(dir).map_err(|e| StoreError::WriteError {
            path: dir.to_path_buf(),
            source: e,
        })?;
        Ok(FileStore {
            dir: dir.to_path_buf(),
            projects: read_rows(&dir.join(PROJECTS_FILE))?,
            items: read_rows(&dir.join(ITEMS_FILE))?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn save_projects(&self) -> Result<(), StoreError> {
        write_rows(&self.dir.join(PROJECTS_FILE), &self.projects)
    }

    fn save_items(&self) -> Result<(), StoreError> {
        write_rows(&self.dir.join(ITEMS_FILE), &self.items)
    }

    /// Run `edit` on the item rows and persist; restore the old rows if the
    /// write fails.
    fn commit_items(&mut self, edit: impl FnOnce(&mut Vec<ItemRow>)) -> Result<(), StoreError> {
        let saved = self.items.clone();
        edit(&mut self.items);
        if let Err(e) = self.save_items() {
            self.items = saved;
            return Err(e);
        }
        Ok(())
    }

    fn check_parent(&self, parent: Option<&ItemId>, project: &str) -> Result<(), StoreError> {
        if let Some(parent) = parent
            && !self
                .items
                .iter()
                .any(|row| row.id == parent.as_str() && row.project_id == project)
        {
            return Err(StoreError::Rejected(format!(
                "parent {} does not exist in project {}",
                parent, project
            )));
        }
        Ok(())
    }
}

fn read_rows<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, StoreError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => {
            return Err(StoreError::ReadError {
                path: path.to_path_buf(),
                source: e,
            });
        }
    };
    if text.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str(&text).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })
}

fn write_rows<T: Serialize>(path: &Path, rows: &[T]) -> Result<(), StoreError> {
    let mut content = serde_json::to_string_pretty(rows).map_err(|e| StoreError::Corrupt {
        path: path.to_path_buf(),
        source: e,
    })?;
    content.push('\n');
    atomic_write(path, content.as_bytes()).map_err(|e| StoreError::WriteError {
        path: path.to_path_buf(),
        source: e,
    })
}

impl Store for FileStore {
    fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>, StoreError> {
        let mut projects: Vec<Project> = self
            .projects
            .iter()
            .filter(|row| row.owner_id == owner.as_str())
            .map(Project::from)
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(projects)
    }

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError> {
        let row = ProjectRow {
            id: Uuid::new_v4().to_string(),
            name: draft.name.clone(),
            owner_id: draft.owner_id.to_string(),
            created_at: Utc::now(),
        };
        self.projects.push(row.clone());
        if let Err(e) = self.save_projects() {
            self.projects.pop();
            return Err(e);
        }
        Ok(Project::from(&row))
    }

    fn list_items(&self, project: &ProjectId) -> Result<Vec<Item>, StoreError> {
        Ok(self
            .items
            .iter()
            .filter(|row| row.project_id == project.as_str())
            .map(Item::from)
            .collect())
    }

    fn insert_item(&mut self, draft: &ItemDraft, project: &ProjectId) -> Result<Item, StoreError> {
        self.check_parent(draft.parent_id.as_ref(), project.as_str())?;
        let row = ItemRow {
            id: ItemId::generate().to_string(),
            name: draft.name.clone(),
            image_url: draft.image_url.clone(),
            note: draft.note.clone(),
            parent_id: draft.parent_id.as_ref().map(|p| p.to_string()),
            project_id: project.to_string(),
            created_at: Utc::now(),
        };
        let item = Item::from(&row);
        self.commit_items(|rows| rows.push(row))?;
        Ok(item)
    }

    fn update_item(&mut self, id: &ItemId, changes: &ItemChanges) -> Result<(), StoreError> {
        let index = self
            .items
            .iter()
            .position(|row| row.id == id.as_str())
            .ok_or_else(|| StoreError::NotFound(id.to_string()))?;
        if let Some(parent) = &changes.parent_id {
            let project = self.items[index].project_id.clone();
            self.check_parent(parent.as_ref(), &project)?;
        }
        self.commit_items(|rows| {
            let row = &mut rows[index];
            if let Some(name) = &changes.name {
                row.name = name.clone();
            }
            if let Some(note) = &changes.note {
                row.note = note.clone();
            }
            if let Some(url) = &changes.image_url {
                row.image_url = url.clone();
            }
            if let Some(parent) = &changes.parent_id {
                row.parent_id = parent.as_ref().map(|p| p.to_string());
            }
        })
    }

    fn delete_items(&mut self, ids: &[ItemId]) -> Result<(), StoreError> {
        self.commit_items(|rows| rows.retain(|row| !ids.iter().any(|id| id.as_str() == row.id)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn open(tmp: &TempDir) -> FileStore {
        FileStore::open(&tmp.path().join("data")).unwrap()
    }

    fn home(store: &mut FileStore) -> Project {
        store
            .insert_project(&ProjectDraft {
                name: "Home".into(),
                owner_id: UserId::new("alice"),
            })
            .unwrap()
    }

    #[test]
    fn rows_survive_reopen() {
        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        let project = home(&mut store);
        let room = store
            .insert_item(&ItemDraft::new("Living Room"), &project.id)
            .unwrap();
        store
            .insert_item(
                &ItemDraft::new("Batteries")
                    .with_note("AA")
                    .in_folder(Some(room.id.clone())),
                &project.id,
            )
            .unwrap();

        let reopened = open(&tmp);
        let items = reopened.list_items(&project.id).unwrap();
        assert_eq!(items.len(), 2);
        assert_eq!(items[1].parent_id, Some(room.id));
        assert_eq!(items[1].note.as_deref(), Some("AA"));
        let projects = reopened.list_projects(&UserId::new("alice")).unwrap();
        assert_eq!(projects, vec![project]);
    }

    #[test]
    fn rows_are_snake_case() {
        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        let project = home(&mut store);
        store.insert_item(&ItemDraft::new("Box"), &project.id).unwrap();

        let text = fs::read_to_string(store.dir().join(ITEMS_FILE)).unwrap();
        assert!(text.contains("\"project_id\""));
        assert!(text.contains("\"parent_id\""));
        assert!(!text.contains("projectId"));
        let text = fs::read_to_string(store.dir().join(PROJECTS_FILE)).unwrap();
        assert!(text.contains("\"owner_id\": \"alice\""));
    }

    #[test]
    fn update_and_delete_persist() {
        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        let project = home(&mut store);
        let a = store.insert_item(&ItemDraft::new("A"), &project.id).unwrap();
        let b = store.insert_item(&ItemDraft::new("B"), &project.id).unwrap();
        store
            .update_item(
                &b.id,
                &ItemChanges {
                    name: Some("Bee".into()),
                    parent_id: Some(Some(a.id.clone())),
                    ..Default::default()
                },
            )
            .unwrap();
        store.delete_items(&[a.id.clone()]).unwrap();

        let items = open(&tmp).list_items(&project.id).unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].name, "Bee");
        assert_eq!(items[0].parent_id, Some(a.id));
    }

    #[test]
    fn rejects_missing_parent_and_unknown_item() {
        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        let project = home(&mut store);
        let draft = ItemDraft::new("x").in_folder(Some(ItemId::new("ghost")));
        assert!(matches!(
            store.insert_item(&draft, &project.id),
            Err(StoreError::Rejected(_))
        ));
        assert!(matches!(
            store.update_item(&ItemId::new("ghost"), &ItemChanges::default()),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn corrupt_file_is_reported() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path().join("data");
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join(ITEMS_FILE), "[{not json").unwrap();
        assert!(matches!(
            FileStore::open(&dir),
            Err(StoreError::Corrupt { .. })
        ));
    }

    #[cfg(unix)]
    #[test]
    fn failed_write_restores_rows() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = TempDir::new().unwrap();
        let mut store = open(&tmp);
        let project = home(&mut store);
        store.insert_item(&ItemDraft::new("Kept"), &project.id).unwrap();

        let dir = store.dir().to_path_buf();
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o500)).unwrap();
        // Root ignores directory permissions; nothing to observe then.
        let probe = dir.join(".probe");
        let writable = fs::write(&probe, b"").is_ok();
        let result = store.insert_item(&ItemDraft::new("Lost"), &project.id);
        fs::set_permissions(&dir, fs::Permissions::from_mode(0o700)).unwrap();
        if writable {
            let _ = fs::remove_file(probe);
            return;
        }

        assert!(matches!(result, Err(StoreError::WriteError { .. })));
        let names: Vec<String> = store
            .list_items(&project.id)
            .unwrap()
            .into_iter()
            .map(|i| i.name)
            .collect();
        assert_eq!(names, vec!["Kept".to_string()]);
    }
}
