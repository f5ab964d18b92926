use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::user::UserId;

string_id!(
    /// Identifier of a project; every item belongs to exactly one project
    ProjectId
);

/// A named collection of items owned by one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: ProjectId,
    pub name: String,
    pub owner_id: UserId,
    pub created_at: DateTime<Utc>,
}

/// Payload for creating a project. The store assigns id and timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProjectDraft {
    pub name: String,
    pub owner_id: UserId,
}
