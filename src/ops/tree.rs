//! Hierarchy queries derived on demand from the flat item list.
//!
//! Nothing here keeps an index between calls; every function scans the
//! current `ItemSet`. Parent references that point nowhere are treated as
//! root-level, never as errors.

use std::collections::{HashMap, HashSet};

use indexmap::IndexSet;

use crate::model::item::{Item, ItemId, ItemSet};

/// Error type for tree traversal
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TreeError {
    #[error("cycle detected in parent chain at item {0}")]
    CycleDetected(ItemId),
}

/// Items directly inside `folder` (`None` = project root), in collection order.
pub fn children_of<'a>(items: &'a ItemSet, folder: Option<&str>) -> Vec<&'a Item> {
    items
        .iter()
        .filter(|item| item.parent_id.as_ref().map(|p| p.as_str()) == folder)
        .collect()
}

/// Number of items directly inside `folder`.
pub fn child_count(items: &ItemSet, folder: &str) -> usize {
    items
        .iter()
        .filter(|item| item.parent_id.as_ref().is_some_and(|p| p.as_str() == folder))
        .count()
}

/// Whether anything lives inside this item.
pub fn is_folder(items: &ItemSet, id: &str) -> bool {
    items
        .iter()
        .any(|item| item.parent_id.as_ref().is_some_and(|p| p.as_str() == id))
}

/// The item's parent, if it has one that exists.
pub fn parent_of<'a>(items: &'a ItemSet, item_id: &str) -> Option<&'a Item> {
    let item = items.get(item_id)?;
    let parent_id = item.parent_id.as_ref()?;
    items.get(parent_id.as_str())
}

/// Ancestors of an item, root-most first, ending at its immediate parent.
///
/// The item itself is not included. An unknown id gives an empty path, and
/// the walk stops quietly at a parent reference that cannot be resolved.
pub fn path_of<'a>(items: &'a ItemSet, item_id: &str) -> Result<Vec<&'a Item>, TreeError> {
    let mut path = Vec::new();
    let Some(mut current) = items.get(item_id) else {
        return Ok(path);
    };
    let mut seen: HashSet<&str> = HashSet::new();
    seen.insert(current.id.as_str());

    while let Some(parent_id) = current.parent_id.as_ref() {
        let Some(parent) = items.get(parent_id.as_str()) else {
            break;
        };
        if !seen.insert(parent.id.as_str()) {
            return Err(TreeError::CycleDetected(parent.id.clone()));
        }
        path.push(parent);
        current = parent;
    }

    path.reverse();
    Ok(path)
}

/// Every item whose parent chain passes through `item_id`.
///
/// Depth-first, parents before their children. The start item is never part
/// of the result; meeting it (or any item twice) means the parent graph has
/// a cycle.
pub fn descendants_of(items: &ItemSet, item_id: &str) -> Result<IndexSet<ItemId>, TreeError> {
    let children = child_map(items);
    let mut found = IndexSet::new();
    let mut visited: HashSet<&str> = HashSet::new();
    visited.insert(item_id);
    collect_descendants(&children, item_id, &mut visited, &mut found)?;
    Ok(found)
}

fn collect_descendants<'a>(
    children: &HashMap<&'a str, Vec<&'a Item>>,
    parent: &str,
    visited: &mut HashSet<&'a str>,
    found: &mut IndexSet<ItemId>,
) -> Result<(), TreeError> {
    let Some(kids) = children.get(parent) else {
        return Ok(());
    };
    for child in kids {
        if !visited.insert(child.id.as_str()) {
            return Err(TreeError::CycleDetected(child.id.clone()));
        }
        found.insert(child.id.clone());
        collect_descendants(children, child.id.as_str(), visited, found)?;
    }
    Ok(())
}

/// Group items by parent id, preserving collection order within each group.
fn child_map(items: &ItemSet) -> HashMap<&str, Vec<&Item>> {
    let mut map: HashMap<&str, Vec<&Item>> = HashMap::new();
    for item in items.iter() {
        if let Some(parent) = &item.parent_id {
            map.entry(parent.as_str()).or_default().push(item);
        }
    }
    map
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::project::ProjectId;
    use chrono::{TimeZone, Utc};
    use pretty_assertions::assert_eq;

    fn item(id: &str, parent: Option<&str>) -> Item {
        Item {
            id: ItemId::new(id),
            name: format!("Item {}", id),
            image_url: None,
            note: None,
            parent_id: parent.map(ItemId::from),
            project_id: ProjectId::new("p1"),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    /// 1 ← 2 ← 3
    fn chain() -> ItemSet {
        ItemSet::from_items([item("1", None), item("2", Some("1")), item("3", Some("2"))])
    }

    /// Living Room ← TV Stand ← Top Drawer ← {Batteries, Cable}; Living Room ← Shelf; Bedroom
    fn house() -> ItemSet {
        ItemSet::from_items([
            item("living", None),
            item("bedroom", None),
            item("tv", Some("living")),
            item("shelf", Some("living")),
            item("drawer", Some("tv")),
            item("batteries", Some("drawer")),
            item("cable", Some("drawer")),
        ])
    }

    fn ids<'a>(items: impl IntoIterator<Item = &'a Item>) -> Vec<&'a str> {
        items.into_iter().map(|i| i.id.as_str()).collect()
    }

    fn set_ids(set: &IndexSet<ItemId>) -> Vec<&str> {
        set.iter().map(|i| i.as_str()).collect()
    }

    #[test]
    fn children_of_root_and_folder_keep_insertion_order() {
        let items = house();
        assert_eq!(ids(children_of(&items, None)), vec!["living", "bedroom"]);
        assert_eq!(ids(children_of(&items, Some("living"))), vec!["tv", "shelf"]);
        assert!(children_of(&items, Some("cable")).is_empty());
    }

    #[test]
    fn parent_of_follows_one_link() {
        let items = house();
        assert_eq!(parent_of(&items, "drawer").unwrap().id.as_str(), "tv");
        assert!(parent_of(&items, "living").is_none());
        assert!(parent_of(&items, "nope").is_none());
    }

    #[test]
    fn path_of_excludes_item_and_starts_at_root() {
        let items = chain();
        assert_eq!(ids(path_of(&items, "3").unwrap()), vec!["1", "2"]);
        assert!(path_of(&items, "1").unwrap().is_empty());
        assert!(path_of(&items, "missing").unwrap().is_empty());
    }

    #[test]
    fn path_plus_item_rebuilds_full_chain() {
        let items = house();
        for target in ["batteries", "cable", "shelf", "bedroom"] {
            let mut chain = ids(path_of(&items, target).unwrap());
            chain.push(target);
            // every link in the chain is the parent of the next one
            for pair in chain.windows(2) {
                assert_eq!(parent_of(&items, pair[1]).unwrap().id.as_str(), pair[0]);
            }
            assert!(items.get(chain[0]).unwrap().parent_id.is_none());
        }
    }

    #[test]
    fn path_stops_at_dangling_parent() {
        let items = ItemSet::from_items([item("a", Some("ghost")), item("b", Some("a"))]);
        assert_eq!(ids(path_of(&items, "b").unwrap()), vec!["a"]);
        assert!(path_of(&items, "a").unwrap().is_empty());
        assert!(parent_of(&items, "a").is_none());
    }

    #[test]
    fn descendants_are_transitive_and_exclude_self() {
        let items = chain();
        assert_eq!(set_ids(&descendants_of(&items, "1").unwrap()), vec!["2", "3"]);
        assert_eq!(set_ids(&descendants_of(&items, "2").unwrap()), vec!["3"]);
        assert!(descendants_of(&items, "3").unwrap().is_empty());

        let items = house();
        for item in items.iter() {
            let desc = descendants_of(&items, item.id.as_str()).unwrap();
            assert!(!desc.contains(&item.id));
        }
        assert_eq!(
            set_ids(&descendants_of(&items, "living").unwrap()),
            vec!["tv", "drawer", "batteries", "cable", "shelf"]
        );
    }

    #[test]
    fn descendants_of_unknown_id_is_empty() {
        assert!(descendants_of(&house(), "nope").unwrap().is_empty());
    }

    #[test]
    fn cycles_are_reported_instead_of_looping() {
        let items = ItemSet::from_items([item("a", Some("b")), item("b", Some("a")), item("c", Some("a"))]);
        assert!(matches!(
            descendants_of(&items, "a"),
            Err(TreeError::CycleDetected(_))
        ));
        assert!(matches!(path_of(&items, "c"), Err(TreeError::CycleDetected(_))));
    }

    #[test]
    fn self_parent_is_a_cycle() {
        let items = ItemSet::from_items([item("a", Some("a"))]);
        assert_eq!(
            descendants_of(&items, "a"),
            Err(TreeError::CycleDetected(ItemId::new("a")))
        );
        assert_eq!(
            path_of(&items, "a").unwrap_err(),
            TreeError::CycleDetected(ItemId::new("a"))
        );
    }

    #[test]
    fn folder_helpers() {
        let items = house();
        assert!(is_folder(&items, "drawer"));
        assert!(!is_folder(&items, "cable"));
        assert_eq!(child_count(&items, "drawer"), 2);
        assert_eq!(child_count(&items, "bedroom"), 0);
    }
}
