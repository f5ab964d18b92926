use std::fs;
use std::path::{Path, PathBuf};

use crate::io::config_io;
use crate::model::config::CubbyConfig;

/// Name of the per-workspace directory
pub const CUBBY_DIR: &str = ".cubby";
pub const CONFIG_FILE: &str = "cubby.toml";
/// Store rows live here, relative to `.cubby/`
pub const DATA_DIR: &str = "data";

/// Error type for workspace I/O operations
#[derive(Debug, thiserror::Error)]
pub enum WorkspaceError {
    #[error("not a cubby workspace: no .cubby/cubby.toml found (run `cubby init`)")]
    NotAWorkspace,
    #[error("workspace already exists at {0} (use --force to overwrite the config)")]
    AlreadyInitialized(PathBuf),
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not write {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not parse cubby.toml: {0}")]
    ConfigParseError(#[from] toml::de::Error),
    #[error("could not edit cubby.toml: {0}")]
    ConfigEditError(#[from] toml_edit::TomlError),
}

/// An opened workspace: its location and parsed configuration.
#[derive(Debug, Clone)]
pub struct Workspace {
    pub root: PathBuf,
    pub cubby_dir: PathBuf,
    pub config: CubbyConfig,
}

impl Workspace {
    /// Load the workspace rooted at `root`.
    pub fn load(root: &Path) -> Result<Self, WorkspaceError> {
        let cubby_dir = root.join(CUBBY_DIR);
        if !cubby_dir.join(CONFIG_FILE).is_file() {
            return Err(WorkspaceError::NotAWorkspace);
        }
        let (config, _doc) = config_io::read_config(&cubby_dir)?;
        Ok(Workspace {
            root: root.to_path_buf(),
            cubby_dir,
            config,
        })
    }

    /// Discover the workspace above `start` and load it.
    pub fn discover(start: &Path) -> Result<Self, WorkspaceError> {
        let root = discover_workspace(start)?;
        Self::load(&root)
    }

    pub fn data_dir(&self) -> PathBuf {
        self.cubby_dir.join(DATA_DIR)
    }

    /// `[store].blob_dir`, resolved against `.cubby/` when relative
    pub fn blob_dir(&self) -> PathBuf {
        let dir = Path::new(&self.config.store.blob_dir);
        if dir.is_absolute() {
            dir.to_path_buf()
        } else {
            self.cubby_dir.join(dir)
        }
    }
}

/// Find the workspace by walking up from `start`, looking for
/// `.cubby/cubby.toml`.
pub fn discover_workspace(start: &Path) -> Result<PathBuf, WorkspaceError> {
    let mut current = start.to_path_buf();
    loop {
        if current.join(CUBBY_DIR).join(CONFIG_FILE).is_file() {
            return Ok(current);
        }
        if !current.pop() {
            return Err(WorkspaceError::NotAWorkspace);
        }
    }
}

/// Create `.cubby/` under `root` with the given config text.
///
/// Refuses to touch an existing config unless `force` is set. Store data in
/// an existing workspace is never removed.
pub fn init_workspace(root: &Path, config_text: &str, force: bool) -> Result<PathBuf, WorkspaceError> {
    let cubby_dir = root.join(CUBBY_DIR);
    let config_path = cubby_dir.join(CONFIG_FILE);
    if config_path.exists() && !force {
        return Err(WorkspaceError::AlreadyInitialized(cubby_dir));
    }
    for dir in [cubby_dir.clone(), cubby_dir.join(DATA_DIR)] {
        fs::create_dir_all(&dir).map_err(|e| WorkspaceError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
    }
    fs::write(&config_path, config_text).map_err(|e| WorkspaceError::WriteError {
        path: config_path,
        source: e,
    })?;
    Ok(cubby_dir)
}
