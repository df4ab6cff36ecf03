use async_trait::async_trait;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum FileStorageError {
    #[error("File not found: {0}")]
    FileNotFound(String),
    #[error("Invalid path: {0}")]
    InvalidPath(String),
    #[error("IO error: {0}")]
    IoError(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct StoredFile {
    /// Locator written to `file.path`.
    pub path: String,
    pub size: u64,
}

/// Blob storage for uploaded source files. Stored names are prefixed with a
/// random UUID so repeated uploads of the same name never collide.
#[async_trait]
pub trait FileStorage: Send + Sync {
    async fn store_file(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<StoredFile, FileStorageError>;

    async fn retrieve_file(&self, path: &str) -> Result<Vec<u8>, FileStorageError>;

    /// Returns `false` when nothing was stored at `path`.
    async fn delete_file(&self, path: &str) -> Result<bool, FileStorageError>;

    async fn file_exists(&self, path: &str) -> Result<bool, FileStorageError>;
}
