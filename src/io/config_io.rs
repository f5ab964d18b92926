use std::fs;
use std::path::Path;

use crate::io::workspace::{WorkspaceError, CONFIG_FILE};
use crate::model::config::CubbyConfig;

/// Read the workspace config, returning both the parsed config and the raw
/// toml_edit Document for round-trip-safe editing.
pub fn read_config(cubby_dir: &Path) -> Result<(CubbyConfig, toml_edit::DocumentMut), WorkspaceError> {
    let config_path = cubby_dir.join(CONFIG_FILE);
    let config_text = fs::read_to_string(&config_path).map_err(|e| WorkspaceError::ReadError {
        path: config_path.clone(),
        source: e,
    })?;
    let config: CubbyConfig = toml::from_str(&config_text)?;
    let doc: toml_edit::DocumentMut = config_text.parse()?;
    Ok((config, doc))
}

/// Write the config document back to disk, preserving formatting.
pub fn write_config(cubby_dir: &Path, doc: &toml_edit::DocumentMut) -> Result<(), WorkspaceError> {
    let config_path = cubby_dir.join(CONFIG_FILE);
    fs::write(&config_path, doc.to_string()).map_err(|e| WorkspaceError::WriteError {
        path: config_path,
        source: e,
    })
}

/// Set `[user]` in the config document. A missing email removes any old one.
pub fn set_user(doc: &mut toml_edit::DocumentMut, id: &str, email: Option<&str>) {
    if !doc.contains_key("user") {
        doc["user"] = toml_edit::Item::Table(toml_edit::Table::new());
    }
    doc["user"]["id"] = toml_edit::value(id);
    match email {
        Some(email) => doc["user"]["email"] = toml_edit::value(email),
        None => {
            if let Some(table) = doc["user"].as_table_mut() {
                table.remove("email");
            }
        }
    }
}

/// Drop the `[user]` table. Returns false if there was none.
pub fn clear_user(doc: &mut toml_edit::DocumentMut) -> bool {
    doc.remove("user").is_some()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample_config() -> &'static str {
        r#"# photos live next to the config
[store]
blob_dir = "blobs"   # relative to .cubby/

[navigation]
on_delete = "root"
"#
    }

    #[test]
    fn test_round_trip_config() {
        let tmp = TempDir::new().unwrap();
        let config_path = tmp.path().join(CONFIG_FILE);
        fs::write(&config_path, sample_config()).unwrap();

        let (_config, doc) = read_config(tmp.path()).unwrap();
        write_config(tmp.path(), &doc).unwrap();

        let written = fs::read_to_string(&config_path).unwrap();
        assert_eq!(written, sample_config());
    }

    #[test]
    fn test_set_user_keeps_comments() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_user(&mut doc, "alice", Some("alice@example.com"));
        let result = doc.to_string();
        assert!(result.contains("# relative to .cubby/"));
        let config: CubbyConfig = toml::from_str(&result).unwrap();
        let user = config.user.unwrap();
        assert_eq!(user.id, "alice");
        assert_eq!(user.email.as_deref(), Some("alice@example.com"));
    }

    #[test]
    fn test_set_user_without_email_drops_old_email() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        set_user(&mut doc, "alice", Some("alice@example.com"));
        set_user(&mut doc, "bob", None);
        let config: CubbyConfig = toml::from_str(&doc.to_string()).unwrap();
        let user = config.user.unwrap();
        assert_eq!(user.id, "bob");
        assert!(user.email.is_none());
    }

    #[test]
    fn test_clear_user() {
        let mut doc: toml_edit::DocumentMut = sample_config().parse().unwrap();
        assert!(!clear_user(&mut doc));
        set_user(&mut doc, "alice", None);
        assert!(clear_user(&mut doc));
        let config: CubbyConfig = toml::from_str(&doc.to_string()).unwrap();
        assert!(config.user.is_none());
        assert_eq!(config.store.blob_dir, "blobs");
    }

    #[test]
    fn test_parse_error_is_reported() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join(CONFIG_FILE), "[navigation]\non_delete = \"sideways\"\n").unwrap();
        assert!(matches!(
            read_config(tmp.path()),
            Err(WorkspaceError::ConfigParseError(_))
        ));
    }
}
