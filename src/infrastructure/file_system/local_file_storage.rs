use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

use crate::application::ports::file_storage::{FileStorage, FileStorageError, StoredFile};

pub struct LocalFileStorage {
    base_path: PathBuf,
}

impl LocalFileStorage {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub async fn ensure_directory_exists(&self) -> Result<(), FileStorageError> {
        fs::create_dir_all(&self.base_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    /// Only plain file names are accepted; anything with a directory part is rejected.
    fn stored_name(file_name: &str) -> Result<String, FileStorageError> {
        let trimmed = file_name.trim();
        let is_plain = Path::new(trimmed)
            .file_name()
            .is_some_and(|name| name == std::ffi::OsStr::new(trimmed));
        if trimmed.is_empty() || !is_plain {
            return Err(FileStorageError::InvalidPath(file_name.to_string()));
        }
        Ok(format!("{}_{}", Uuid::new_v4(), trimmed))
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, FileStorageError> {
        let candidate = PathBuf::from(path);
        if candidate.parent() != Some(self.base_path.as_path()) {
            return Err(FileStorageError::InvalidPath(path.to_string()));
        }
        Ok(candidate)
    }
}

#[async_trait]
impl FileStorage for LocalFileStorage {
    async fn store_file(
        &self,
        data: &[u8],
        file_name: &str,
    ) -> Result<StoredFile, FileStorageError> {
        let stored_name = Self::stored_name(file_name)?;
        self.ensure_directory_exists().await?;

        let file_path = self.base_path.join(stored_name);
        fs::write(&file_path, data)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        tracing::debug!("Stored {} bytes at {}", data.len(), file_path.display());

        Ok(StoredFile {
            path: file_path.to_string_lossy().to_string(),
            size: data.len() as u64,
        })
    }

    async fn retrieve_file(&self, path: &str) -> Result<Vec<u8>, FileStorageError> {
        let file_path = self.resolve(path)?;

        if !file_path.exists() {
            return Err(FileStorageError::FileNotFound(path.to_string()));
        }

        fs::read(&file_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))
    }

    async fn delete_file(&self, path: &str) -> Result<bool, FileStorageError> {
        let file_path = self.resolve(path)?;

        if !file_path.exists() {
            return Ok(false);
        }

        fs::remove_file(&file_path)
            .await
            .map_err(|e| FileStorageError::IoError(e.to_string()))?;

        Ok(true)
    }

    async fn file_exists(&self, path: &str) -> Result<bool, FileStorageError> {
        Ok(self.resolve(path)?.exists())
    }
}
