use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::FileStorage;
use crate::domain::entities::{NewDocument, NewFile, title_from_filename};
use crate::domain::repositories::{DocumentRepository, IngestionBatch, PageUpload, RepositoryError};

#[derive(Debug, Error)]
pub enum IngestDocumentError {
    #[error("Storage error: {0}")]
    StorageError(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<RepositoryError> for IngestDocumentError {
    fn from(error: RepositoryError) -> Self {
        IngestDocumentError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct IngestDocumentRequest {
    pub file_name: String,
    pub file_data: Vec<u8>,
    /// Rendered page images, first page first.
    pub pages: Vec<PageUpload>,
    pub author: Option<String>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone)]
pub struct IngestDocumentResponse {
    pub document_id: i64,
    pub file_id: i64,
    pub file_path: String,
    pub title: String,
    pub page_count: usize,
    /// One full-page image chunk per page, in page order.
    pub image_chunk_ids: Vec<i64>,
}

pub struct IngestDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    file_storage: Arc<dyn FileStorage>,
}

impl IngestDocumentUseCase {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        file_storage: Arc<dyn FileStorage>,
    ) -> Self {
        Self {
            document_repository,
            file_storage,
        }
    }

    pub async fn execute(
        &self,
        request: IngestDocumentRequest,
    ) -> Result<IngestDocumentResponse, IngestDocumentError> {
        // Validate input
        if request.file_name.trim().is_empty() {
            return Err(IngestDocumentError::ValidationError(
                "File name cannot be empty".to_string(),
            ));
        }

        if request.file_data.is_empty() {
            return Err(IngestDocumentError::ValidationError(
                "File data cannot be empty".to_string(),
            ));
        }

        if request.pages.is_empty() {
            return Err(IngestDocumentError::ValidationError(
                "Document must have at least one page".to_string(),
            ));
        }

        if let Some(index) = request
            .pages
            .iter()
            .position(|p| p.image_contents.is_empty() || p.mimetype.trim().is_empty())
        {
            return Err(IngestDocumentError::ValidationError(format!(
                "Page {} has no image data or mimetype",
                index + 1
            )));
        }

        // Store the raw upload
        let stored_file = self
            .file_storage
            .store_file(&request.file_data, &request.file_name)
            .await
            .map_err(|e| IngestDocumentError::StorageError(e.to_string()))?;

        let file_name = request.file_name.trim().to_string();
        let title = title_from_filename(&file_name);
        let batch = IngestionBatch {
            file: NewFile::raw(stored_file.path.clone()),
            document: NewDocument {
                path: None,
                filename: Some(file_name),
                author: request.author,
                title: Some(title.clone()),
                metadata: request.metadata,
            },
            pages: request.pages,
        };

        let ingested = match self.document_repository.save_ingestion(batch).await {
            Ok(ingested) => ingested,
            Err(error) => {
                // Nothing references the blob once the transaction rolled back.
                if let Err(cleanup) = self.file_storage.delete_file(&stored_file.path).await {
                    tracing::warn!(
                        "Failed to remove orphaned upload {}: {}",
                        stored_file.path,
                        cleanup
                    );
                }
                return Err(error.into());
            }
        };

        tracing::info!(
            "Ingested document {} ({} pages) from {}",
            ingested.document.id,
            ingested.pages.len(),
            stored_file.path
        );

        Ok(IngestDocumentResponse {
            document_id: ingested.document.id,
            file_id: ingested.file.id,
            file_path: ingested.file.path,
            title,
            page_count: ingested.pages.len(),
            image_chunk_ids: ingested.pages.iter().map(|(_, chunk)| chunk.id).collect(),
        })
    }
}
