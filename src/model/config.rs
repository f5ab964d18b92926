use serde::{Deserialize, Serialize};

/// Configuration from `.cubby/cubby.toml`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CubbyConfig {
    #[serde(default)]
    pub user: Option<UserConfig>,
    #[serde(default)]
    pub store: StoreConfig,
    #[serde(default)]
    pub navigation: NavigationConfig,
    #[serde(default)]
    pub log: LogConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserConfig {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Directory for uploaded photos, relative to `.cubby/`
    #[serde(default = "default_blob_dir")]
    pub blob_dir: String,
    /// When set, photo URLs are `public_url_base` + blob path instead of
    /// `file://` URLs.
    #[serde(default)]
    pub public_url_base: Option<String>,
}

impl Default for StoreConfig {
    fn default() -> Self {
        StoreConfig {
            blob_dir: default_blob_dir(),
            public_url_base: None,
        }
    }
}

fn default_blob_dir() -> String {
    "blobs".to_string()
}

/// Where to go when the folder being viewed is deleted
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeletePolicy {
    /// Jump back to the project root
    #[default]
    Root,
    /// Stay as close as possible: the deleted item's parent
    Parent,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NavigationConfig {
    #[serde(default)]
    pub on_delete: DeletePolicy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogConfig {
    /// Default filter when `CUBBY_LOG` is unset (e.g. "warn", "cubby=debug")
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        LogConfig {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "warn".to_string()
}
