use serde::{Deserialize, Serialize};

use crate::model::item::ItemId;

/// Oldest back-stack entries are dropped past this depth
const HISTORY_LIMIT: usize = 500;

/// Which view of the project is showing
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    /// Browse folder by folder
    #[default]
    Hierarchy,
    /// Every item at once, newest first
    Flat,
}

/// Where the user is in the hierarchy, plus how they got there.
///
/// The back stack is independent of the view mode: switching to the flat
/// view and back leaves the folder position untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Navigator {
    /// Folder being viewed (`None` = project root)
    #[serde(default)]
    current: Option<ItemId>,
    /// Previously visited folders, most recent last
    #[serde(default)]
    history: Vec<Option<ItemId>>,
    #[serde(default)]
    view: ViewMode,
}

impl Navigator {
    pub fn new() -> Self {
        Navigator::default()
    }

    pub fn current(&self) -> Option<&ItemId> {
        self.current.as_ref()
    }

    pub fn history(&self) -> &[Option<ItemId>] {
        &self.history
    }

    pub fn view(&self) -> ViewMode {
        self.view
    }

    /// Enter a folder, remembering where we were.
    pub fn navigate_to(&mut self, folder: Option<ItemId>) {
        let previous = std::mem::replace(&mut self.current, folder);
        self.history.push(previous);
        if self.history.len() > HISTORY_LIMIT {
            let excess = self.history.len() - HISTORY_LIMIT;
            self.history.drain(..excess);
        }
    }

    /// Step back one entry. Returns false when there is nowhere to go.
    pub fn back(&mut self) -> bool {
        match self.history.pop() {
            Some(previous) => {
                self.current = previous;
                true
            }
            None => false,
        }
    }

    pub fn set_view(&mut self, view: ViewMode) {
        self.view = view;
    }

    /// Jump from a flat or search result to a folder in the hierarchy view.
    pub fn reveal(&mut self, folder: Option<ItemId>) {
        self.navigate_to(folder);
        self.view = ViewMode::Hierarchy;
    }

    /// Forget position and history (used when switching projects).
    pub fn reset(&mut self) {
        self.current = None;
        self.history.clear();
    }

    /// Move the current position without recording history.
    pub fn relocate(&mut self, folder: Option<ItemId>) {
        self.current = folder;
    }

    /// Drop back-stack entries pointing at folders that no longer exist.
    pub fn forget<'a>(&mut self, removed: impl IntoIterator<Item = &'a ItemId>) {
        let removed: std::collections::HashSet<&ItemId> = removed.into_iter().collect();
        self.history
            .retain(|entry| entry.as_ref().is_none_or(|id| !removed.contains(id)));
    }

    /// Rewrite references to a folder whose id changed.
    pub fn remap(&mut self, old: &str, new: &ItemId) {
        let swap = |slot: &mut Option<ItemId>| {
            if slot.as_ref().is_some_and(|id| id.as_str() == old) {
                *slot = Some(new.clone());
            }
        };
        swap(&mut self.current);
        self.history.iter_mut().for_each(swap);
    }
}
