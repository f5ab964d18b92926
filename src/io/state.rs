use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::io::file_store::atomic_write;
use crate::model::project::ProjectId;
use crate::ops::navigation::Navigator;

const STATE_FILE: &str = ".state.json";

/// Per-workspace client state (written to .state.json)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Selected project, if any
    #[serde(default)]
    pub current_project: Option<ProjectId>,
    /// Folder position, back stack and view mode
    #[serde(default)]
    pub navigation: Navigator,
}

/// Read .state.json from the cubby directory
pub fn read_state(cubby_dir: &Path) -> Option<SessionState> {
    let path = cubby_dir.join(STATE_FILE);
    let content = fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&content) {
        Ok(state) => Some(state),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unreadable state file");
            None
        }
    }
}

/// Write .state.json to the cubby directory
pub fn write_state(cubby_dir: &Path, state: &SessionState) -> Result<(), std::io::Error> {
    let path = cubby_dir.join(STATE_FILE);
    let content = serde_json::to_string_pretty(state)?;
    atomic_write(&path, content.as_bytes())
}

/// Remove .state.json, if present
pub fn clear_state(cubby_dir: &Path) -> Result<(), std::io::Error> {
    match fs::remove_file(cubby_dir.join(STATE_FILE)) {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::item::ItemId;
    use crate::ops::navigation::ViewMode;
    use tempfile::TempDir;

    #[test]
    fn write_and_read_round_trip() {
        let dir = TempDir::new().unwrap();
        let mut navigation = Navigator::new();
        navigation.navigate_to(Some(ItemId::new("room")));
        navigation.navigate_to(Some(ItemId::new("drawer")));
        navigation.set_view(ViewMode::Flat);
        let state = SessionState {
            current_project: Some(ProjectId::new("p1")),
            navigation,
        };

        write_state(dir.path(), &state).unwrap();
        let loaded = read_state(dir.path()).unwrap();
        assert_eq!(loaded, state);
        assert_eq!(loaded.navigation.current().map(|i| i.as_str()), Some("drawer"));
    }

    #[test]
    fn read_missing_file_returns_none() {
        let dir = TempDir::new().unwrap();
        assert!(read_state(dir.path()).is_none());
    }

    #[test]
    fn read_malformed_json_returns_none() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join(STATE_FILE), "not json {{{").unwrap();
        assert!(read_state(dir.path()).is_none());
    }

    #[test]
    fn serde_defaults_on_minimal_object() {
        let state: SessionState = serde_json::from_str("{}").unwrap();
        assert!(state.current_project.is_none());
        assert_eq!(state.navigation, Navigator::default());
    }

    #[test]
    fn clear_is_idempotent() {
        let dir = TempDir::new().unwrap();
        write_state(dir.path(), &SessionState::default()).unwrap();
        clear_state(dir.path()).unwrap();
        clear_state(dir.path()).unwrap();
        assert!(read_state(dir.path()).is_none());
    }
}
