use chrono::{DateTime, Local, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::project::ProjectId;

string_id!(
    /// Identifier of an item. Unique across the whole item collection.
    ItemId
);

const TEMP_PREFIX: &str = "tmp-";

impl ItemId {
    /// A fresh random id, as handed out by the stores
    pub fn generate() -> Self {
        ItemId(Uuid::new_v4().to_string())
    }

    /// A client-side placeholder id for an item the store has not confirmed yet
    pub fn temporary() -> Self {
        ItemId(format!("{}{}", TEMP_PREFIX, Uuid::new_v4()))
    }

    pub fn is_temporary(&self) -> bool {
        self.0.starts_with(TEMP_PREFIX)
    }
}

/// A physical thing, or a place things are kept in.
///
/// There is no separate folder type: any item may hold other items, and it
/// counts as a folder exactly when some other item names it as parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    /// Reference to an uploaded photo
    #[serde(default)]
    pub image_url: Option<String>,
    #[serde(default)]
    pub note: Option<String>,
    /// `None` means the item sits at the project root
    #[serde(default)]
    pub parent_id: Option<ItemId>,
    pub project_id: ProjectId,
    pub created_at: DateTime<Utc>,
}

/// Create payload: everything the user supplies, without id or timestamps
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemDraft {
    pub name: String,
    pub image_url: Option<String>,
    pub note: Option<String>,
    pub parent_id: Option<ItemId>,
}

impl ItemDraft {
    pub fn new(name: impl Into<String>) -> Self {
        ItemDraft {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn with_image_url(mut self, url: impl Into<String>) -> Self {
        self.image_url = Some(url.into());
        self
    }

    pub fn in_folder(mut self, parent: Option<ItemId>) -> Self {
        self.parent_id = parent;
        self
    }
}

/// A partial update. `None` leaves a field alone; for the optional fields
/// `Some(None)` clears the value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemChanges {
    pub name: Option<String>,
    pub note: Option<Option<String>>,
    pub image_url: Option<Option<String>>,
    pub parent_id: Option<Option<ItemId>>,
}

impl ItemChanges {
    pub fn move_to(parent: Option<ItemId>) -> Self {
        ItemChanges {
            parent_id: Some(parent),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.note.is_none()
            && self.image_url.is_none()
            && self.parent_id.is_none()
    }

    pub fn apply_to(&self, item: &mut Item) {
        if let Some(name) = &self.name {
            item.name = name.clone();
        }
        if let Some(note) = &self.note {
            item.note = note.clone();
        }
        if let Some(url) = &self.image_url {
            item.image_url = url.clone();
        }
        if let Some(parent) = &self.parent_id {
            item.parent_id = parent.clone();
        }
    }
}

/// Name given to items created without one
pub fn default_item_name(at: DateTime<Local>) -> String {
    format!("Item {}", at.format("%Y-%m-%d %H:%M:%S"))
}

/// The flat item collection, in insertion order, keyed by id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemSet {
    items: IndexMap<ItemId, Item>,
}

impl ItemSet {
    pub fn new() -> Self {
        ItemSet::default()
    }

    /// Build a set from a list. Later duplicates of an id are dropped.
    pub fn from_items(items: impl IntoIterator<Item = Item>) -> Self {
        let mut set = ItemSet::new();
        for item in items {
            set.push(item);
        }
        set
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Item> {
        self.items.get_mut(id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.items.contains_key(id)
    }

    pub fn position(&self, id: &str) -> Option<usize> {
        self.items.get_index_of(id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn ids(&self) -> impl Iterator<Item = &ItemId> {
        self.items.keys()
    }

    /// Append an item. Returns false (and changes nothing) if the id is taken.
    pub fn push(&mut self, item: Item) -> bool {
        if self.items.contains_key(&item.id) {
            return false;
        }
        self.items.insert(item.id.clone(), item);
        true
    }

    /// Swap the item stored under `old_id` for `item`, keeping its position.
    ///
    /// The replacement may carry a different id. Returns false if `old_id`
    /// is absent or the new id already belongs to another item.
    pub fn replace(&mut self, old_id: &str, item: Item) -> bool {
        let Some(index) = self.items.get_index_of(old_id) else {
            return false;
        };
        if item.id.as_str() != old_id && self.items.contains_key(&item.id) {
            return false;
        }
        self.items.shift_remove_index(index);
        self.items.shift_insert(index, item.id.clone(), item);
        true
    }

    /// Point every child of `old` at `new` instead.
    pub fn reparent_children(&mut self, old: &str, new: &ItemId) -> usize {
        let mut moved = 0;
        for item in self.items.values_mut() {
            if item.parent_id.as_ref().is_some_and(|p| p.as_str() == old) {
                item.parent_id = Some(new.clone());
                moved += 1;
            }
        }
        moved
    }

    pub fn remove(&mut self, id: &str) -> Option<Item> {
        self.items.shift_remove(id)
    }

    /// Remove every item whose id is in `ids`. Returns how many were removed.
    pub fn remove_all<'a>(&mut self, ids: impl IntoIterator<Item = &'a ItemId>) -> usize {
        let doomed: std::collections::HashSet<&ItemId> = ids.into_iter().collect();
        let before = self.items.len();
        self.items.retain(|id, _| !doomed.contains(id));
        before - self.items.len()
    }

    pub fn to_vec(&self) -> Vec<Item> {
        self.items.values().cloned().collect()
    }
}

impl FromIterator<Item> for ItemSet {
    fn from_iter<T: IntoIterator<Item = Item>>(iter: T) -> Self {
        ItemSet::from_items(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(id: &str, parent: Option<&str>) -> Item {
        Item {
            id: ItemId::new(id),
            name: id.to_uppercase(),
            image_url: None,
            note: None,
            parent_id: parent.map(ItemId::from),
            project_id: ProjectId::new("p1"),
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    fn order(set: &ItemSet) -> Vec<&str> {
        set.ids().map(|id| id.as_str()).collect()
    }

    #[test]
    fn push_rejects_duplicate_ids() {
        let mut set = ItemSet::new();
        assert!(set.push(item("a", None)));
        assert!(!set.push(item("a", Some("x"))));
        assert_eq!(set.len(), 1);
        assert_eq!(set.get("a").unwrap().parent_id, None);
    }

    #[test]
    fn replace_keeps_position_when_id_changes() {
        let mut set = ItemSet::from_items([item("a", None), item("tmp-1", None), item("c", None)]);
        assert!(set.replace("tmp-1", item("b", None)));
        assert_eq!(order(&set), vec!["a", "b", "c"]);
        assert!(!set.contains("tmp-1"));
    }

    #[test]
    fn replace_refuses_to_clobber_another_item() {
        let mut set = ItemSet::from_items([item("a", None), item("b", None)]);
        assert!(!set.replace("a", item("b", None)));
        assert!(!set.replace("missing", item("z", None)));
        assert_eq!(order(&set), vec!["a", "b"]);
    }

    #[test]
    fn remove_all_preserves_order_of_survivors() {
        let mut set = ItemSet::from_items([
            item("a", None),
            item("b", Some("a")),
            item("c", None),
            item("d", Some("b")),
        ]);
        let doomed = [ItemId::new("b"), ItemId::new("d")];
        assert_eq!(set.remove_all(&doomed), 2);
        assert_eq!(order(&set), vec!["a", "c"]);
    }

    #[test]
    fn reparent_children_rewrites_only_matching_parents() {
        let mut set = ItemSet::from_items([
            item("tmp-1", None),
            item("b", Some("tmp-1")),
            item("c", Some("other")),
        ]);
        assert_eq!(set.reparent_children("tmp-1", &ItemId::new("real")), 1);
        assert_eq!(set.get("b").unwrap().parent_id, Some(ItemId::new("real")));
        assert_eq!(set.get("c").unwrap().parent_id, Some(ItemId::new("other")));
    }

    #[test]
    fn temporary_ids_are_recognizable() {
        assert!(ItemId::temporary().is_temporary());
        assert!(!ItemId::generate().is_temporary());
    }

    #[test]
    fn changes_apply_only_set_fields() {
        let mut it = item("a", Some("p"));
        it.note = Some("old".into());
        let changes = ItemChanges {
            name: Some("Renamed".into()),
            note: Some(None),
            ..Default::default()
        };
        changes.apply_to(&mut it);
        assert_eq!(it.name, "Renamed");
        assert_eq!(it.note, None);
        assert_eq!(it.parent_id, Some(ItemId::new("p")));
        assert!(!changes.is_empty());
        assert!(ItemChanges::default().is_empty());
    }

    #[test]
    fn default_name_uses_timestamp() {
        let at = Local.with_ymd_and_hms(2025, 3, 4, 5, 6, 7).unwrap();
        assert_eq!(default_item_name(at), "Item 2025-03-04 05:06:07");
    }

    #[test]
    fn item_serializes_camel_case() {
        let json = serde_json::to_value(item("b", Some("a"))).unwrap();
        assert_eq!(json["parentId"], "a");
        assert_eq!(json["projectId"], "p1");
        assert!(json.get("createdAt").is_some());
    }
}
