//! Application state for one signed-in user working in one project.
//!
//! `Session` owns the store handle, the project list, the optimistic item
//! cache and the navigator. Every mutation follows the same two steps:
//! `begin_*` validates and applies the change locally, the caller talks to
//! the store, and `settle_*` either keeps the change (adopting whatever the
//! store returned) or undoes it.

pub mod pending;

use std::sync::mpsc::Receiver;

use chrono::{Local, Utc};

use crate::io::store::{Store, StoreError};
use crate::model::config::DeletePolicy;
use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId, ItemSet};
use crate::model::project::{Project, ProjectDraft, ProjectId};
use crate::model::user::User;
use crate::ops::item_ops::{self, MoveCheck, MutationError};
use crate::ops::navigation::{Navigator, ViewMode};
use crate::ops::search;
use crate::ops::tree::{self, TreeError};

use pending::Scope;
pub use pending::{Outcome, PendingCreate, PendingDelete, PendingMove, PendingUpdate};

/// Error type for session operations other than item mutations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("not signed in")]
    NotSignedIn,
    #[error("no project selected")]
    NoProject,
    #[error("unknown project: {0}")]
    UnknownProject(ProjectId),
    #[error("project name cannot be empty")]
    EmptyName,
    #[error("folder not found: {0}")]
    UnknownFolder(ItemId),
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Mutation(#[from] MutationError),
}

pub struct Session<S: Store> {
    store: S,
    user: Option<User>,
    projects: Vec<Project>,
    current_project: Option<ProjectId>,
    items: ItemSet,
    nav: Navigator,
    delete_policy: DeletePolicy,
}

impl<S: Store> Session<S> {
    pub fn new(store: S) -> Self {
        Session {
            store,
            user: None,
            projects: Vec::new(),
            current_project: None,
            items: ItemSet::new(),
            nav: Navigator::new(),
            delete_policy: DeletePolicy::default(),
        }
    }

    pub fn with_delete_policy(mut self, policy: DeletePolicy) -> Self {
        self.delete_policy = policy;
        self
    }

    /// Tear the session down and hand back the store.
    pub fn close(self) -> S {
        tracing::debug!(items = self.items.len(), "session closed");
        self.store
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    // -----------------------------------------------------------------------
    // Identity and projects
    // -----------------------------------------------------------------------

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    /// Switch identity. Signing out, or signing in as someone else, drops
    /// every project, item and navigation entry of the previous user.
    pub fn set_user(&mut self, user: Option<User>) {
        let same = match (&self.user, &user) {
            (Some(old), Some(new)) => old.id == new.id,
            (None, None) => true,
            _ => false,
        };
        if !same {
            self.projects.clear();
            self.current_project = None;
            self.items = ItemSet::new();
            self.nav.reset();
        }
        self.user = user;
    }

    /// Apply every identity change queued on `rx`. Returns how many were seen.
    pub fn follow_identity(&mut self, rx: &Receiver<Option<User>>) -> usize {
        let mut seen = 0;
        for user in rx.try_iter() {
            self.set_user(user);
            seen += 1;
        }
        seen
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    /// Reload the signed-in user's projects, newest first.
    pub fn fetch_projects(&mut self) -> Result<&[Project], SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotSignedIn)?;
        match self.store.list_projects(&user.id) {
            Ok(projects) => {
                self.projects = projects;
                Ok(&self.projects)
            }
            Err(e) => {
                tracing::error!(error = %e, "could not fetch projects");
                Err(e.into())
            }
        }
    }

    /// Create a project owned by the signed-in user and put it first in
    /// the list.
    pub fn create_project(&mut self, name: &str) -> Result<Project, SessionError> {
        let user = self.user.as_ref().ok_or(SessionError::NotSignedIn)?;
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let draft = ProjectDraft {
            name: name.to_string(),
            owner_id: user.id.clone(),
        };
        let project = self.store.insert_project(&draft).inspect_err(|e| {
            tracing::error!(error = %e, "could not create project");
        })?;
        tracing::debug!(project = %project.id, "project created");
        self.projects.insert(0, project.clone());
        Ok(project)
    }

    pub fn current_project(&self) -> Option<&Project> {
        let id = self.current_project.as_ref()?;
        self.projects.iter().find(|p| &p.id == id)
    }

    pub fn current_project_id(&self) -> Option<&ProjectId> {
        self.current_project.as_ref()
    }

    /// Select a project (or none). Items and navigation are cleared first,
    /// then the project's items are fetched.
    pub fn set_current_project(&mut self, project: Option<ProjectId>) -> Result<(), SessionError> {
        if let Some(id) = &project
            && !self.projects.iter().any(|p| &p.id == id)
        {
            return Err(SessionError::UnknownProject(id.clone()));
        }
        self.current_project = project;
        self.items = ItemSet::new();
        self.nav.reset();
        if self.current_project.is_some() {
            self.fetch_items()?;
        }
        Ok(())
    }

    /// Replace the item cache with the current project's stored items.
    pub fn fetch_items(&mut self) -> Result<usize, SessionError> {
        let project = self.current_project.as_ref().ok_or(SessionError::NoProject)?;
        match self.store.list_items(project) {
            Ok(items) => {
                self.items = ItemSet::from_items(items);
                Ok(self.items.len())
            }
            Err(e) => {
                tracing::error!(error = %e, project = %project, "could not fetch items");
                Err(e.into())
            }
        }
    }

    /// Pick up where a previous run left off: select `project` and adopt
    /// `nav`, dropping any folder reference that no longer exists.
    pub fn resume(&mut self, project: Option<ProjectId>, nav: Navigator) -> Result<(), SessionError> {
        self.set_current_project(project)?;
        if self.current_project.is_none() {
            self.nav.set_view(nav.view());
            return Ok(());
        }
        self.nav = nav;
        let missing: Vec<ItemId> = self
            .nav
            .history()
            .iter()
            .flatten()
            .chain(self.nav.current())
            .filter(|id| !self.items.contains(id.as_str()))
            .cloned()
            .collect();
        if !missing.is_empty() {
            tracing::debug!(count = missing.len(), "dropping stale navigation entries");
            self.nav.forget(&missing);
            if self.nav.current().is_some_and(|c| missing.contains(c)) {
                self.nav.relocate(None);
            }
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn items(&self) -> &ItemSet {
        &self.items
    }

    pub fn item(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn children(&self, folder: Option<&str>) -> Vec<&Item> {
        tree::children_of(&self.items, folder)
    }

    /// Contents of the folder being viewed
    pub fn current_children(&self) -> Vec<&Item> {
        tree::children_of(&self.items, self.nav.current().map(|id| id.as_str()))
    }

    pub fn parent(&self, id: &str) -> Option<&Item> {
        tree::parent_of(&self.items, id)
    }

    pub fn path(&self, id: &str) -> Result<Vec<&Item>, TreeError> {
        tree::path_of(&self.items, id)
    }

    /// Breadcrumb for the folder being viewed: its ancestors, then itself
    pub fn current_path(&self) -> Result<Vec<&Item>, TreeError> {
        let Some(current) = self.nav.current() else {
            return Ok(Vec::new());
        };
        let mut path = tree::path_of(&self.items, current.as_str())?;
        path.extend(self.items.get(current.as_str()));
        Ok(path)
    }

    pub fn flat_view(&self) -> Vec<&Item> {
        search::flat_view(&self.items)
    }

    pub fn search(&self, query: &str) -> Vec<&Item> {
        search::search_text(&self.items, query)
    }

    // -----------------------------------------------------------------------
    // Navigation
    // -----------------------------------------------------------------------

    pub fn navigator(&self) -> &Navigator {
        &self.nav
    }

    pub fn current_folder(&self) -> Option<&ItemId> {
        self.nav.current()
    }

    pub fn view(&self) -> ViewMode {
        self.nav.view()
    }

    fn check_folder(&self, folder: Option<&ItemId>) -> Result<(), SessionError> {
        match folder {
            Some(id) if !self.items.contains(id.as_str()) => {
                Err(SessionError::UnknownFolder(id.clone()))
            }
            _ => Ok(()),
        }
    }

    pub fn navigate_to(&mut self, folder: Option<ItemId>) -> Result<(), SessionError> {
        self.check_folder(folder.as_ref())?;
        self.nav.navigate_to(folder);
        Ok(())
    }

    pub fn back(&mut self) -> bool {
        self.nav.back()
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.nav.set_view(view);
    }

    /// Leave the flat view for the folder that holds `item_id`.
    pub fn reveal(&mut self, item_id: &str) -> Result<(), SessionError> {
        let item = self
            .items
            .get(item_id)
            .ok_or_else(|| SessionError::UnknownFolder(ItemId::new(item_id)))?;
        let folder = item
            .parent_id
            .clone()
            .filter(|p| self.items.contains(p.as_str()));
        self.nav.reveal(folder);
        Ok(())
    }

    fn scope(&self) -> Scope {
        Scope {
            owner: self.user.as_ref().map(|u| u.id.clone()),
            project: self.current_project.clone(),
        }
    }

    /// Put back the items as they were at `begin_*`, unless the user or
    /// project changed in between; the cache then belongs to someone else.
    fn restore(&mut self, scope: &Scope, snapshot: ItemSet) {
        if *scope == self.scope() {
            self.items = snapshot;
        } else {
            tracing::warn!(
                project = ?scope.project,
                "session changed while in flight, snapshot discarded"
            );
        }
    }

    // -----------------------------------------------------------------------
    // Create
    // -----------------------------------------------------------------------

    /// Validate a new item and show it immediately under a temporary id.
    pub fn begin_create(&mut self, mut draft: ItemDraft) -> Result<PendingCreate, MutationError> {
        let project = self
            .current_project
            .clone()
            .ok_or(MutationError::NoProject)
            .inspect_err(|e| tracing::warn!(error = %e, "create rejected"))?;
        item_ops::validate_create(&self.items, &draft)
            .inspect_err(|e| tracing::warn!(error = %e, "create rejected"))?;
        draft.name = item_ops::resolve_name(&draft.name, Local::now());
        let item = item_ops::optimistic_item(&draft, &project, Utc::now());
        let temp_id = item.id.clone();
        self.items.push(item);
        Ok(PendingCreate {
            temp_id,
            draft,
            project,
        })
    }

    /// Adopt the stored record in place of the placeholder, or drop the
    /// placeholder if the store failed.
    pub fn settle_create(
        &mut self,
        pending: PendingCreate,
        result: Result<Item, StoreError>,
    ) -> Outcome<Item> {
        let temp = pending.temp_id.as_str();
        match result {
            Ok(item) => {
                if self.items.replace(temp, item.clone()) {
                    self.items.reparent_children(temp, &item.id);
                    self.nav.remap(temp, &item.id);
                } else if self.items.contains(temp) {
                    // the confirmed id is already cached; fold the placeholder into it
                    self.items.reparent_children(temp, &item.id);
                    self.nav.remap(temp, &item.id);
                    self.items.remove(temp);
                    tracing::warn!(temp, id = %item.id, "item already present, placeholder dropped");
                } else if self.current_project.as_ref() == Some(&item.project_id) {
                    // placeholder vanished while in flight; the store still has the item
                    self.items.push(item.clone());
                }
                tracing::debug!(temp, id = %item.id, "create confirmed");
                Outcome::Confirmed(item)
            }
            Err(e) => {
                self.items.remove(temp);
                tracing::error!(error = %e, temp, "create failed, rolled back");
                Outcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn add_item(&mut self, draft: ItemDraft) -> Result<Outcome<Item>, MutationError> {
        let pending = self.begin_create(draft)?;
        let result = self.store.insert_item(pending.draft(), pending.project());
        Ok(self.settle_create(pending, result))
    }

    // -----------------------------------------------------------------------
    // Delete
    // -----------------------------------------------------------------------

    /// Remove an item and everything inside it.
    pub fn begin_delete(&mut self, item_id: &str) -> Result<PendingDelete, MutationError> {
        let ids = item_ops::plan_delete(&self.items, item_id)
            .inspect_err(|e| tracing::warn!(error = %e, "delete rejected"))?;
        let snapshot = self.items.clone();
        let parent = self
            .items
            .get(item_id)
            .and_then(|item| item.parent_id.clone());
        self.items.remove_all(&ids);

        if self.nav.current().is_some_and(|c| ids.contains(c)) {
            let landing = match self.delete_policy {
                DeletePolicy::Root => None,
                DeletePolicy::Parent => parent.filter(|p| self.items.contains(p.as_str())),
            };
            self.nav.relocate(landing);
        }
        self.nav.forget(&ids);

        Ok(PendingDelete {
            ids,
            snapshot,
            scope: self.scope(),
        })
    }

    pub fn settle_delete(
        &mut self,
        pending: PendingDelete,
        result: Result<(), StoreError>,
    ) -> Outcome<usize> {
        match result {
            Ok(()) => {
                tracing::debug!(count = pending.ids.len(), "delete confirmed");
                Outcome::Confirmed(pending.ids.len())
            }
            Err(e) => {
                self.restore(&pending.scope, pending.snapshot);
                tracing::error!(error = %e, "delete failed, rolled back");
                Outcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    /// Delete an item with its descendants. Confirms with the number of
    /// items removed.
    pub fn delete_item(&mut self, item_id: &str) -> Result<Outcome<usize>, MutationError> {
        let pending = self.begin_delete(item_id)?;
        let result = self.store.delete_items(&pending.ids_vec());
        Ok(self.settle_delete(pending, result))
    }

    // -----------------------------------------------------------------------
    // Move
    // -----------------------------------------------------------------------

    /// Re-parent an item. `Ok(None)` means there is nothing to do.
    pub fn begin_move(
        &mut self,
        item_id: &str,
        new_parent: Option<&str>,
    ) -> Result<Option<PendingMove>, MutationError> {
        let check = item_ops::validate_move(&self.items, item_id, new_parent)
            .inspect_err(|e| tracing::warn!(error = %e, "move rejected"))?;
        if check == MoveCheck::Unchanged {
            return Ok(None);
        }
        let snapshot = self.items.clone();
        let new_parent = new_parent.map(ItemId::from);
        item_ops::apply_move(&mut self.items, item_id, new_parent.clone())?;
        Ok(Some(PendingMove {
            item_id: ItemId::new(item_id),
            changes: ItemChanges::move_to(new_parent),
            snapshot,
            scope: self.scope(),
        }))
    }

    pub fn settle_move(&mut self, pending: PendingMove, result: Result<(), StoreError>) -> Outcome<()> {
        match result {
            Ok(()) => {
                tracing::debug!(id = %pending.item_id, "move confirmed");
                Outcome::Confirmed(())
            }
            Err(e) => {
                self.restore(&pending.scope, pending.snapshot);
                tracing::error!(error = %e, id = %pending.item_id, "move failed, rolled back");
                Outcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn move_item(
        &mut self,
        item_id: &str,
        new_parent: Option<&str>,
    ) -> Result<Outcome<()>, MutationError> {
        let Some(pending) = self.begin_move(item_id, new_parent)? else {
            return Ok(Outcome::Unchanged);
        };
        let result = self.store.update_item(pending.item_id(), pending.changes());
        Ok(self.settle_move(pending, result))
    }

    // -----------------------------------------------------------------------
    // Update
    // -----------------------------------------------------------------------

    /// Change name, note or photo. A `parent_id` change goes through the
    /// same checks as a move. `Ok(None)` means there is nothing to do.
    pub fn begin_update(
        &mut self,
        item_id: &str,
        mut changes: ItemChanges,
    ) -> Result<Option<PendingUpdate>, MutationError> {
        if !self.items.contains(item_id) {
            let e = MutationError::NotFound(ItemId::new(item_id));
            tracing::warn!(error = %e, "update rejected");
            return Err(e);
        }
        if let Some(parent) = &changes.parent_id {
            let check = item_ops::validate_move(
                &self.items,
                item_id,
                parent.as_ref().map(|p| p.as_str()),
            )
            .inspect_err(|e| tracing::warn!(error = %e, "update rejected"))?;
            if check == MoveCheck::Unchanged {
                changes.parent_id = None;
            }
        }
        if changes.is_empty() {
            return Ok(None);
        }
        if let Some(name) = &changes.name {
            changes.name = Some(item_ops::resolve_name(name, Local::now()));
        }
        let snapshot = self.items.clone();
        item_ops::apply_changes(&mut self.items, item_id, &changes)?;
        Ok(Some(PendingUpdate {
            item_id: ItemId::new(item_id),
            changes,
            snapshot,
            scope: self.scope(),
        }))
    }

    pub fn settle_update(
        &mut self,
        pending: PendingUpdate,
        result: Result<(), StoreError>,
    ) -> Outcome<()> {
        match result {
            Ok(()) => {
                tracing::debug!(id = %pending.item_id, "update confirmed");
                Outcome::Confirmed(())
            }
            Err(e) => {
                self.restore(&pending.scope, pending.snapshot);
                tracing::error!(error = %e, id = %pending.item_id, "update failed, rolled back");
                Outcome::RolledBack {
                    reason: e.to_string(),
                }
            }
        }
    }

    pub fn update_item(
        &mut self,
        item_id: &str,
        changes: ItemChanges,
    ) -> Result<Outcome<()>, MutationError> {
        let Some(pending) = self.begin_update(item_id, changes)? else {
            return Ok(Outcome::Unchanged);
        };
        let result = self.store.update_item(pending.item_id(), pending.changes());
        Ok(self.settle_update(pending, result))
    }
}
