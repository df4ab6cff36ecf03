use std::sync::Arc;

use thiserror::Error;

use crate::application::ports::FileStorage;
use crate::domain::repositories::{DocumentDeletion, DocumentRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum DeleteDocumentError {
    #[error("Document not found: {0}")]
    DocumentNotFound(i64),
    /// Annotations or results still point into the document.
    #[error("Document is still referenced: {0}")]
    StillReferenced(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for DeleteDocumentError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Constraint(violation) => {
                DeleteDocumentError::StillReferenced(violation.to_string())
            }
            other => DeleteDocumentError::RepositoryError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct DeleteDocumentResponse {
    pub deletion: DocumentDeletion,
    /// Whether the stored upload was removed from disk as well.
    pub blob_removed: bool,
}

pub struct DeleteDocumentUseCase {
    document_repository: Arc<dyn DocumentRepository>,
    file_storage: Arc<dyn FileStorage>,
}

impl DeleteDocumentUseCase {
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
        document_id: i64,
    ) -> Result<DeleteDocumentResponse, DeleteDocumentError> {
        let deletion = self
            .document_repository
            .delete_document_tree(document_id)
            .await?
            .ok_or(DeleteDocumentError::DocumentNotFound(document_id))?;

        let mut blob_removed = false;
        if let Some(file) = &deletion.file {
            match self.file_storage.delete_file(&file.path).await {
                Ok(removed) => blob_removed = removed,
                Err(e) => tracing::warn!("Could not remove stored file {}: {}", file.path, e),
            }
        }

        tracing::info!(
            "Deleted document {}: {} pages, {} captions, {} chunks, {} image chunks",
            document_id,
            deletion.pages_removed,
            deletion.captions_removed,
            deletion.chunks_removed,
            deletion.image_chunks_removed
        );

        Ok(DeleteDocumentResponse {
            deletion,
            blob_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::ingest_document::{
        IngestDocumentRequest, IngestDocumentUseCase,
    };
    use crate::domain::repositories::{PageUpload, SeedRepository};
    use crate::domain::seed::SeedData;
    use crate::infrastructure::file_system::LocalFileStorage;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn test_delete_ingested_document_removes_rows_and_blob() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        let storage = Arc::new(LocalFileStorage::new(dir.path().to_path_buf()));
        let ingested = IngestDocumentUseCase::new(store.clone(), storage.clone())
            .execute(IngestDocumentRequest {
                file_name: "scan.pdf".to_string(),
                file_data: vec![1, 2, 3],
                pages: vec![PageUpload {
                    image_contents: vec![9],
                    mimetype: "image/jpeg".to_string(),
                }],
                author: None,
                metadata: None,
            })
            .await
            .unwrap();

        let use_case = DeleteDocumentUseCase::new(store.clone(), storage.clone());
        let response = use_case.execute(ingested.document_id).await.unwrap();

        assert_eq!(response.deletion.pages_removed, 1);
        assert_eq!(response.deletion.image_chunks_removed, 1);
        assert!(response.blob_removed);
        assert!(!storage.file_exists(&ingested.file_path).await.unwrap());
        assert_eq!(store.count_files().await.unwrap(), 0);

        assert!(matches!(
            use_case.execute(ingested.document_id).await,
            Err(DeleteDocumentError::DocumentNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_annotated_document_is_still_referenced() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        let storage = Arc::new(LocalFileStorage::new(dir.path().to_path_buf()));
        let use_case = DeleteDocumentUseCase::new(store.clone(), storage);

        // Seed queries point at chunks under document 1.
        assert!(matches!(
            use_case.execute(1).await,
            Err(DeleteDocumentError::StillReferenced(_))
        ));
        assert_eq!(store.count_documents().await.unwrap(), 5);
    }
}
