//! Tokens for mutations that have been applied locally but not yet settled
//! against the store.
//!
//! A token is created by one of the `Session::begin_*` calls and consumed by
//! the matching `settle_*` call, so each mutation settles exactly once.

use indexmap::IndexSet;

use crate::model::item::{ItemChanges, ItemDraft, ItemId, ItemSet};
use crate::model::project::ProjectId;
use crate::model::user::UserId;

/// How a mutation ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    /// The store accepted the change; local state now mirrors it
    Confirmed(T),
    /// Nothing to do; the store was not called
    Unchanged,
    /// The store refused or failed; the optimistic change was undone
    RolledBack { reason: String },
}

impl<T> Outcome<T> {
    pub fn is_confirmed(&self) -> bool {
        matches!(self, Outcome::Confirmed(_))
    }

    pub fn is_rolled_back(&self) -> bool {
        matches!(self, Outcome::RolledBack { .. })
    }

    pub fn confirmed(self) -> Option<T> {
        match self {
            Outcome::Confirmed(value) => Some(value),
            _ => None,
        }
    }
}

/// The user and project a local change was made under. A rollback only
/// applies while both are still current.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct Scope {
    pub(super) owner: Option<UserId>,
    pub(super) project: Option<ProjectId>,
}

/// An optimistic item waiting for the store to assign its real id
#[derive(Debug)]
#[must_use = "a pending create must be settled"]
pub struct PendingCreate {
    pub(super) temp_id: ItemId,
    pub(super) draft: ItemDraft,
    pub(super) project: ProjectId,
}

impl PendingCreate {
    /// Placeholder id the item carries until it is confirmed
    pub fn temp_id(&self) -> &ItemId {
        &self.temp_id
    }

    /// The payload to send to the store (name already resolved)
    pub fn draft(&self) -> &ItemDraft {
        &self.draft
    }

    pub fn project(&self) -> &ProjectId {
        &self.project
    }
}

/// A subtree removed locally, plus what to restore if the store fails
#[derive(Debug)]
#[must_use = "a pending delete must be settled"]
pub struct PendingDelete {
    pub(super) ids: IndexSet<ItemId>,
    pub(super) snapshot: ItemSet,
    pub(super) scope: Scope,
}

impl PendingDelete {
    /// The deleted item followed by its descendants
    pub fn ids(&self) -> &IndexSet<ItemId> {
        &self.ids
    }

    pub fn ids_vec(&self) -> Vec<ItemId> {
        self.ids.iter().cloned().collect()
    }
}

#[derive(Debug)]
#[must_use = "a pending move must be settled"]
pub struct PendingMove {
    pub(super) item_id: ItemId,
    pub(super) changes: ItemChanges,
    pub(super) snapshot: ItemSet,
    pub(super) scope: Scope,
}

impl PendingMove {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    /// A change set touching only `parent_id`
    pub fn changes(&self) -> &ItemChanges {
        &self.changes
    }
}

#[derive(Debug)]
#[must_use = "a pending update must be settled"]
pub struct PendingUpdate {
    pub(super) item_id: ItemId,
    pub(super) changes: ItemChanges,
    pub(super) snapshot: ItemSet,
    pub(super) scope: Scope,
}

impl PendingUpdate {
    pub fn item_id(&self) -> &ItemId {
        &self.item_id
    }

    pub fn changes(&self) -> &ItemChanges {
        &self.changes
    }
}
