use std::fs;
use std::path::{Component, Path, PathBuf};

use uuid::Uuid;

use crate::io::file_store::atomic_write;
use crate::model::project::ProjectId;

/// Error type for blob uploads
#[derive(Debug, thiserror::Error)]
pub enum BlobError {
    #[error("invalid blob path: {0}")]
    InvalidPath(String),
    #[error("could not write blob {path}: {source}")]
    WriteError {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("could not read {path}: {source}")]
    ReadError {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Where item photos go. `upload` returns a URL the item can store as
/// `image_url`.
pub trait BlobStore {
    fn upload(&mut self, path: &str, bytes: &[u8]) -> Result<String, BlobError>;
}

/// Blob store rooted at a local directory.
#[derive(Debug, Clone)]
pub struct FsBlobStore {
    root: PathBuf,
    public_url_base: Option<String>,
}

impl FsBlobStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        FsBlobStore {
            root: root.into(),
            public_url_base: None,
        }
    }

    /// Serve URLs as `base` + blob path instead of `file://` URLs
    pub fn with_public_url_base(mut self, base: Option<String>) -> Self {
        self.public_url_base = base;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn url_for(&self, path: &str, full: &Path) -> String {
        match &self.public_url_base {
            Some(base) if base.ends_with('/') => format!("{}{}", base, path),
            Some(base) => format!("{}/{}", base, path),
            None => format!("file://{}", full.display()),
        }
    }

    /// Copy a local file into the store under a fresh name for `project`.
    pub fn upload_file(&mut self, project: &ProjectId, file: &Path) -> Result<String, BlobError> {
        let bytes = fs::read(file).map_err(|e| BlobError::ReadError {
            path: file.to_path_buf(),
            source: e,
        })?;
        let ext = file.extension().and_then(|e| e.to_str());
        let path = blob_path(project, ext);
        self.upload(&path, &bytes)
    }
}

impl BlobStore for FsBlobStore {
    fn upload(&mut self, path: &str, bytes: &[u8]) -> Result<String, BlobError> {
        validate_path(path)?;
        let full = self.root.join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).map_err(|e| BlobError::WriteError {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        atomic_write(&full, bytes).map_err(|e| BlobError::WriteError {
            path: full.clone(),
            source: e,
        })?;
        tracing::debug!(path, bytes = bytes.len(), "uploaded blob");
        Ok(self.url_for(path, &full))
    }
}

/// `{project}/{uuid}.{ext}`, or without extension when there is none
pub fn blob_path(project: &ProjectId, ext: Option<&str>) -> String {
    match ext.filter(|e| !e.is_empty()) {
        Some(ext) => format!("{}/{}.{}", project, Uuid::new_v4(), ext.to_lowercase()),
        None => format!("{}/{}", project, Uuid::new_v4()),
    }
}

/// Blob paths are relative and may not climb out of the store root.
fn validate_path(path: &str) -> Result<(), BlobError> {
    if path.is_empty() {
        return Err(BlobError::InvalidPath(path.to_string()));
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) => {}
            _ => return Err(BlobError::InvalidPath(path.to_string())),
        }
    }
    Ok(())
}
