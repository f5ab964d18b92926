use serde::Serialize;

use crate::model::item::ItemSet;
use crate::ops::tree::{self, TreeError};

/// Structured result from `cubby check`, suitable for --json output.
#[derive(Debug, Default, Serialize)]
pub struct CheckResult {
    pub valid: bool,
    pub errors: Vec<CheckError>,
    pub warnings: Vec<CheckWarning>,
}

/// A validation error (the tree is not a forest).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckError {
    /// The item is its own ancestor
    #[serde(rename = "cycle")]
    Cycle { item_id: String, name: String },
}

/// A validation warning (tolerated, but worth a look).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type")]
pub enum CheckWarning {
    /// `parent_id` names an item that doesn't exist; shown at the root
    #[serde(rename = "dangling_parent")]
    DanglingParent {
        item_id: String,
        name: String,
        parent_id: String,
    },
    /// Optimistic item the store never confirmed
    #[serde(rename = "unconfirmed")]
    Unconfirmed { item_id: String, name: String },
    #[serde(rename = "empty_name")]
    EmptyName { item_id: String },
}

/// Validate an item collection and return structured results.
///
/// Read-only. Every item that sits on a cycle gets its own error.
pub fn check_items(items: &ItemSet) -> CheckResult {
    let mut result = CheckResult::default();

    for item in items.iter() {
        if let Some(parent) = &item.parent_id
            && !items.contains(parent.as_str())
        {
            result.warnings.push(CheckWarning::DanglingParent {
                item_id: item.id.to_string(),
                name: item.name.clone(),
                parent_id: parent.to_string(),
            });
        }
        if item.id.is_temporary() {
            result.warnings.push(CheckWarning::Unconfirmed {
                item_id: item.id.to_string(),
                name: item.name.clone(),
            });
        }
        if item.name.trim().is_empty() {
            result.warnings.push(CheckWarning::EmptyName {
                item_id: item.id.to_string(),
            });
        }

        // An item is on a cycle exactly when walking up from it comes back to it.
        if let Err(TreeError::CycleDetected(at)) = tree::path_of(items, item.id.as_str())
            && at == item.id
        {
            result.errors.push(CheckError::Cycle {
                item_id: item.id.to_string(),
                name: item.name.clone(),
            });
        }
    }

    result.valid = result.errors.is_empty();
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::{Item, ItemId};
    use crate::model::project::ProjectId;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

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

    #[test]
    fn clean_forest_is_valid() {
        let items = ItemSet::from_items([item("a", None), item("b", Some("a"))]);
        let result = check_items(&items);
        assert!(result.valid);
        assert!(result.errors.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn reports_cycle_members_but_not_hangers_on() {
        let items = ItemSet::from_items([
            item("a", Some("b")),
            item("b", Some("a")),
            item("c", Some("a")),
        ]);
        let result = check_items(&items);
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                CheckError::Cycle {
                    item_id: "a".into(),
                    name: "a".into()
                },
                CheckError::Cycle {
                    item_id: "b".into(),
                    name: "b".into()
                },
            ]
        );
    }

    #[test]
    fn warns_about_dangling_unconfirmed_and_unnamed() {
        let mut unnamed = item("u", None);
        unnamed.name = "  ".into();
        let temp = Item {
            id: ItemId::new("tmp-123"),
            ..item("x", None)
        };
        let items = ItemSet::from_items([item("a", Some("ghost")), temp, unnamed]);
        let result = check_items(&items);
        assert!(result.valid);
        assert_eq!(
            result.warnings,
            vec![
                CheckWarning::DanglingParent {
                    item_id: "a".into(),
                    name: "a".into(),
                    parent_id: "ghost".into()
                },
                CheckWarning::Unconfirmed {
                    item_id: "tmp-123".into(),
                    name: "x".into()
                },
                CheckWarning::EmptyName {
                    item_id: "u".into()
                },
            ]
        );
    }

    #[test]
    fn serializes_with_type_tags() {
        let items = ItemSet::from_items([item("a", Some("a"))]);
        let json = serde_json::to_value(check_items(&items)).unwrap();
        assert_eq!(json["valid"], false);
        assert_eq!(json["errors"][0]["type"], "cycle");
    }
}
