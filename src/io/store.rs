//! The authoritative store port.
//!
//! A `Store` owns the durable copy of projects and items. The session keeps
//! its own optimistic copy and reconciles against whatever a store call
//! returns.

use std::path::PathBuf;

use crate::model::item::{Item, ItemChanges, ItemDraft, ItemId};
use crate::model::project::{Project, ProjectDraft, ProjectId};
use crate::model::user::UserId;

/// Error type for store calls
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record not found: {0}")]
    NotFound(String),
    #[error("store rejected the request: {0}")]
    Rejected(String),
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("corrupt store file {path}: {source}")]
    Corrupt {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Create/read/update/delete over items (keyed by project) and projects
/// (keyed by owner).
pub trait Store {
    /// The owner's projects, newest first.
    fn list_projects(&self, owner: &UserId) -> Result<Vec<Project>, StoreError>;

    fn insert_project(&mut self, draft: &ProjectDraft) -> Result<Project, StoreError>;

    /// All items of a project, in stored order.
    fn list_items(&self, project: &ProjectId) -> Result<Vec<Item>, StoreError>;

    /// Insert an item; the returned record carries the authoritative id and
    /// creation time.
    fn insert_item(&mut self, draft: &ItemDraft, project: &ProjectId) -> Result<Item, StoreError>;

    fn update_item(&mut self, id: &ItemId, changes: &ItemChanges) -> Result<(), StoreError>;

    /// Delete every listed id. Ids that are already gone are ignored.
    fn delete_items(&mut self, ids: &[ItemId]) -> Result<(), StoreError>;
}
