//! Validation and local application of item mutations.
//!
//! These functions only touch the in-memory `ItemSet`. Talking to the store
//! and deciding between confirm and rollback is the session's job.

use chrono::{DateTime, Local, Utc};
use indexmap::IndexSet;

use crate::model::item::{default_item_name, Item, ItemChanges, ItemDraft, ItemId, ItemSet};
use crate::model::project::ProjectId;
use crate::ops::tree::{self, TreeError};

/// Error type for rejected mutations. Nothing has been changed when one of
/// these is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MutationError {
    #[error("item not found: {0}")]
    NotFound(ItemId),
    #[error("destination folder not found: {0}")]
    MissingParent(ItemId),
    #[error("cannot move {item} into {target}: it is inside {item}")]
    IntoDescendant { item: ItemId, target: ItemId },
    #[error("cannot move {item} into {target}: it belongs to another project")]
    CrossProject { item: ItemId, target: ItemId },
    #[error("no project selected")]
    NoProject,
    #[error(transparent)]
    Tree(#[from] TreeError),
}

/// Result of checking a proposed move
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveCheck {
    /// Moving an item onto itself: nothing to do
    Unchanged,
    /// Safe to apply
    Valid,
}

/// Use the given name, or a timestamped default when it is blank.
pub fn resolve_name(raw: &str, now: DateTime<Local>) -> String {
    if raw.trim().is_empty() {
        default_item_name(now)
    } else {
        raw.to_string()
    }
}

/// Check that a new item may be added under its requested parent.
pub fn validate_create(items: &ItemSet, draft: &ItemDraft) -> Result<(), MutationError> {
    if let Some(parent) = &draft.parent_id
        && !items.contains(parent.as_str())
    {
        return Err(MutationError::MissingParent(parent.clone()));
    }
    Ok(())
}

/// Build the placeholder item shown until the store confirms the create.
pub fn optimistic_item(draft: &ItemDraft, project: &ProjectId, now: DateTime<Utc>) -> Item {
    Item {
        id: ItemId::temporary(),
        name: draft.name.clone(),
        image_url: draft.image_url.clone(),
        note: draft.note.clone(),
        parent_id: draft.parent_id.clone(),
        project_id: project.clone(),
        created_at: now,
    }
}

/// Ids removed by deleting `item_id`: the item followed by all of its
/// descendants.
pub fn plan_delete(items: &ItemSet, item_id: &str) -> Result<IndexSet<ItemId>, MutationError> {
    let item = items
        .get(item_id)
        .ok_or_else(|| MutationError::NotFound(ItemId::new(item_id)))?;
    let descendants = tree::descendants_of(items, item_id)?;
    let mut doomed = IndexSet::with_capacity(descendants.len() + 1);
    doomed.insert(item.id.clone());
    doomed.extend(descendants);
    Ok(doomed)
}

/// Check a move of `item_id` under `new_parent` (`None` = project root).
pub fn validate_move(
    items: &ItemSet,
    item_id: &str,
    new_parent: Option<&str>,
) -> Result<MoveCheck, MutationError> {
    if new_parent == Some(item_id) {
        return Ok(MoveCheck::Unchanged);
    }
    let item = items
        .get(item_id)
        .ok_or_else(|| MutationError::NotFound(ItemId::new(item_id)))?;
    let Some(target_id) = new_parent else {
        return Ok(MoveCheck::Valid);
    };
    let target = items
        .get(target_id)
        .ok_or_else(|| MutationError::MissingParent(ItemId::new(target_id)))?;
    if target.project_id != item.project_id {
        return Err(MutationError::CrossProject {
            item: item.id.clone(),
            target: target.id.clone(),
        });
    }
    if tree::descendants_of(items, item_id)?.contains(target_id) {
        return Err(MutationError::IntoDescendant {
            item: item.id.clone(),
            target: target.id.clone(),
        });
    }
    Ok(MoveCheck::Valid)
}

/// Change an item's parent. Only `parent_id` is touched.
pub fn apply_move(
    items: &mut ItemSet,
    item_id: &str,
    new_parent: Option<ItemId>,
) -> Result<(), MutationError> {
    let item = items
        .get_mut(item_id)
        .ok_or_else(|| MutationError::NotFound(ItemId::new(item_id)))?;
    item.parent_id = new_parent;
    Ok(())
}

/// Apply field changes to an item.
pub fn apply_changes(
    items: &mut ItemSet,
    item_id: &str,
    changes: &ItemChanges,
) -> Result<(), MutationError> {
    let item = items
        .get_mut(item_id)
        .ok_or_else(|| MutationError::NotFound(ItemId::new(item_id)))?;
    changes.apply_to(item);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, parent: Option<&str>) -> Item {
        Item {
            id: ItemId::new(id),
            name: id.to_string(),
            image_url: None,
            note: None,
            parent_id: parent.map(ItemId::from),
            project_id: ProjectId::new("p1"),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn chain() -> ItemSet {
        ItemSet::from_items([item("1", None), item("2", Some("1")), item("3", Some("2"))])
    }

    #[test]
    fn blank_names_get_a_default() {
        let now = Local.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        assert_eq!(resolve_name("   ", now), "Item 2025-06-01 12:00:00");
        assert_eq!(resolve_name("", now), "Item 2025-06-01 12:00:00");
        assert_eq!(resolve_name("Batteries", now), "Batteries");
    }

    #[test]
    fn create_under_missing_parent_is_rejected() {
        let items = chain();
        let draft = ItemDraft::new("x").in_folder(Some(ItemId::new("9")));
        assert_eq!(
            validate_create(&items, &draft),
            Err(MutationError::MissingParent(ItemId::new("9")))
        );
        assert!(validate_create(&items, &ItemDraft::new("x").in_folder(Some(ItemId::new("3")))).is_ok());
        assert!(validate_create(&items, &ItemDraft::new("x")).is_ok());
    }

    #[test]
    fn optimistic_item_gets_temp_id_and_project() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let draft = ItemDraft::new("Box").with_note("winter").in_folder(Some(ItemId::new("1")));
        let it = optimistic_item(&draft, &ProjectId::new("p9"), now);
        assert!(it.id.is_temporary());
        assert_eq!(it.project_id.as_str(), "p9");
        assert_eq!(it.parent_id, Some(ItemId::new("1")));
        assert_eq!(it.note.as_deref(), Some("winter"));
        assert_eq!(it.created_at, now);
    }

    #[test]
    fn delete_plan_covers_subtree() {
        let items = chain();
        let plan = plan_delete(&items, "1").unwrap();
        let ids: Vec<&str> = plan.iter().map(|i| i.as_str()).collect();
        assert_eq!(ids, vec!["1", "2", "3"]);
        assert_eq!(
            plan_delete(&items, "nope"),
            Err(MutationError::NotFound(ItemId::new("nope")))
        );
    }

    #[test]
    fn move_into_own_descendant_is_rejected() {
        let items = chain();
        assert_eq!(
            validate_move(&items, "1", Some("3")),
            Err(MutationError::IntoDescendant {
                item: ItemId::new("1"),
                target: ItemId::new("3"),
            })
        );
        assert!(matches!(
            validate_move(&items, "1", Some("2")),
            Err(MutationError::IntoDescendant { .. })
        ));
    }

    #[test]
    fn move_onto_itself_is_unchanged() {
        assert_eq!(validate_move(&chain(), "2", Some("2")), Ok(MoveCheck::Unchanged));
    }

    #[test]
    fn valid_moves() {
        let items = chain();
        assert_eq!(validate_move(&items, "3", Some("1")), Ok(MoveCheck::Valid));
        assert_eq!(validate_move(&items, "3", None), Ok(MoveCheck::Valid));
        assert_eq!(validate_move(&items, "2", None), Ok(MoveCheck::Valid));
    }

    #[test]
    fn move_checks_existence_and_project() {
        let mut items = chain();
        let mut foreign = item("f", None);
        foreign.project_id = ProjectId::new("p2");
        items.push(foreign);
        assert_eq!(
            validate_move(&items, "9", Some("1")),
            Err(MutationError::NotFound(ItemId::new("9")))
        );
        assert_eq!(
            validate_move(&items, "3", Some("9")),
            Err(MutationError::MissingParent(ItemId::new("9")))
        );
        assert!(matches!(
            validate_move(&items, "3", Some("f")),
            Err(MutationError::CrossProject { .. })
        ));
    }

    #[test]
    fn apply_move_touches_only_parent() {
        let mut items = chain();
        let before = items.get("3").unwrap().clone();
        apply_move(&mut items, "3", None).unwrap();
        let after = items.get("3").unwrap();
        assert_eq!(after.parent_id, None);
        assert_eq!(after.name, before.name);
        assert_eq!(after.created_at, before.created_at);
    }

    #[test]
    fn apply_changes_to_missing_item_fails() {
        let mut items = chain();
        let changes = ItemChanges {
            name: Some("x".into()),
            ..Default::default()
        };
        assert!(apply_changes(&mut items, "nope", &changes).is_err());
        apply_changes(&mut items, "2", &changes).unwrap();
        assert_eq!(items.get("2").unwrap().name, "x");
    }
}
