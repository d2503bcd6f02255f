//! Public file storage for logos, candidate documents, and generated CVs.

use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};

/// File received from a multipart form, prior to being stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }

    /// Lower-cased extension of the client supplied name, if any.
    pub fn extension(&self) -> Option<String> {
        Path::new(&self.file_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
    }

    pub fn has_extension(&self, allowed: &[&str]) -> bool {
        self.extension()
            .map(|ext| allowed.contains(&ext.as_str()))
            .unwrap_or(false)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("storage path '{0}' escapes the storage root")]
    InvalidPath(String),
    #[error("stored file '{0}' not found")]
    NotFound(String),
    #[error("storage io failure: {0}")]
    Io(#[from] io::Error),
}

/// Disk abstraction used by the workflow services.
pub trait FileStorage: Send + Sync {
    /// Store `bytes` under `directory` with a generated name, returning the relative path.
    fn put(&self, directory: &str, original_name: &str, bytes: &[u8])
        -> Result<String, StorageError>;
    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError>;
    /// Returns whether a file was removed.
    fn delete(&self, path: &str) -> Result<bool, StorageError>;
    fn exists(&self, path: &str) -> bool;
    fn url(&self, path: &str) -> String;
}

/// Stores files beneath a root directory served at `public_url`.
#[derive(Debug, Clone)]
pub struct LocalDiskStorage {
    root: PathBuf,
    public_url: String,
}

impl LocalDiskStorage {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        let public_url: String = public_url.into();
        Self {
            root: root.into(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, relative: &str) -> Result<PathBuf, StorageError> {
        let candidate = Path::new(relative);
        let safe = !relative.is_empty()
            && candidate
                .components()
                .all(|component| matches!(component, Component::Normal(_)));
        if !safe {
            return Err(StorageError::InvalidPath(relative.to_string()));
        }
        Ok(self.root.join(candidate))
    }
}

impl FileStorage for LocalDiskStorage {
    fn put(
        &self,
        directory: &str,
        original_name: &str,
        bytes: &[u8],
    ) -> Result<String, StorageError> {
        let extension = Path::new(original_name)
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| format!(".{}", ext.to_ascii_lowercase()))
            .unwrap_or_default();
        let relative = format!(
            "{}/{}{}",
            directory.trim_matches('/'),
            uuid::Uuid::new_v4().simple(),
            extension
        );

        let target = self.resolve(&relative)?;
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&target, bytes)?;
        tracing::debug!(path = %relative, size = bytes.len(), "stored upload");
        Ok(relative)
    }

    fn read(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let target = self.resolve(path)?;
        match fs::read(&target) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(path.to_string()))
            }
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn delete(&self, path: &str) -> Result<bool, StorageError> {
        let target = self.resolve(path)?;
        match fs::remove_file(&target) {
            Ok(()) => Ok(true),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(err) => Err(StorageError::Io(err)),
        }
    }

    fn exists(&self, path: &str) -> bool {
        self.resolve(path)
            .map(|target| target.is_file())
            .unwrap_or(false)
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.public_url, path.trim_start_matches('/'))
    }
}

/// Content type for a stored file, guessed from its extension.
pub fn content_type(path: &str) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}
