use std::sync::Arc;

use thiserror::Error;

use crate::domain::repositories::{ChunkRepository, QueryRepository, RepositoryError};
use crate::domain::value_objects::EmbeddingUpdate;

#[derive(Debug, Error)]
pub enum AttachEmbeddingsError {
    #[error("{0} not found")]
    NotFound(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Vector storage unavailable: {0}")]
    Unavailable(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for AttachEmbeddingsError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::NotFound { entity, id } => {
                AttachEmbeddingsError::NotFound(format!("{} {}", entity, id))
            }
            RepositoryError::Validation(msg) => AttachEmbeddingsError::ValidationError(msg),
            RepositoryError::ExtensionUnavailable(msg) => AttachEmbeddingsError::Unavailable(msg),
            other => AttachEmbeddingsError::RepositoryError(other.to_string()),
        }
    }
}

/// Row whose embedding columns are written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmbeddingTarget {
    Chunk(i64),
    ImageChunk(i64),
    Query(i64),
}

pub struct AttachEmbeddingsUseCase {
    chunk_repository: Arc<dyn ChunkRepository>,
    query_repository: Arc<dyn QueryRepository>,
}

impl AttachEmbeddingsUseCase {
    pub fn new(
        chunk_repository: Arc<dyn ChunkRepository>,
        query_repository: Arc<dyn QueryRepository>,
    ) -> Self {
        Self {
            chunk_repository,
            query_repository,
        }
    }

    pub async fn execute(
        &self,
        target: EmbeddingTarget,
        update: EmbeddingUpdate,
    ) -> Result<(), AttachEmbeddingsError> {
        match target {
            EmbeddingTarget::Chunk(id) => {
                self.chunk_repository.update_chunk_embeddings(id, update).await?
            }
            EmbeddingTarget::ImageChunk(id) => {
                self.chunk_repository.update_image_chunk_embeddings(id, update).await?
            }
            EmbeddingTarget::Query(id) => {
                self.query_repository.update_query_embeddings(id, update).await?
            }
        }

        tracing::debug!("Updated embeddings of {:?}", target);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewQuery;
    use crate::domain::value_objects::{Embedding, MultiVector};
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn test_attach_multi_vector_to_query() {
        let store = Arc::new(InMemoryStore::with_dimension(2));
        let query = store.create_query(NewQuery::new("q?")).await.unwrap();
        let use_case = AttachEmbeddingsUseCase::new(store.clone(), store.clone());
        let multi = MultiVector::new(vec![
            Embedding::new(vec![1.0, 0.0]).unwrap(),
            Embedding::new(vec![0.0, 1.0]).unwrap(),
        ])
        .unwrap();

        use_case
            .execute(
                EmbeddingTarget::Query(query.id),
                EmbeddingUpdate {
                    embedding: None,
                    embeddings: Some(multi.clone()),
                },
            )
            .await
            .unwrap();

        let stored = store.find_query(query.id).await.unwrap().unwrap();
        assert_eq!(stored.embeddings, Some(multi));
        assert_eq!(stored.embedding, None);
    }

    #[tokio::test]
    async fn test_errors_map_to_use_case_variants() {
        let store = Arc::new(InMemoryStore::with_dimension(2));
        let use_case = AttachEmbeddingsUseCase::new(store.clone(), store);
        let update = EmbeddingUpdate {
            embedding: Some(Embedding::new(vec![1.0, 0.0]).unwrap()),
            embeddings: None,
        };

        assert!(matches!(
            use_case.execute(EmbeddingTarget::ImageChunk(7), update).await,
            Err(AttachEmbeddingsError::NotFound(_))
        ));
        assert!(matches!(
            use_case
                .execute(EmbeddingTarget::Chunk(1), EmbeddingUpdate::default())
                .await,
            Err(AttachEmbeddingsError::ValidationError(_))
        ));
    }
}
