use std::sync::Arc;

use serde::Serialize;
use thiserror::Error;

use crate::domain::repositories::{
    ChunkRepository, DocumentRepository, QueryRepository, RepositoryError,
};

#[derive(Debug, Error)]
pub enum StatisticsServiceError {
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for StatisticsServiceError {
    fn from(error: RepositoryError) -> Self {
        StatisticsServiceError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DatasetStatistics {
    pub files: i64,
    pub documents: i64,
    pub pages: i64,
    pub image_chunks: i64,
    pub image_chunks_with_embedding: i64,
    pub chunks: i64,
    pub queries: i64,
}

impl DatasetStatistics {
    /// Share of image chunks that already carry a dense embedding.
    pub fn embedding_coverage(&self) -> f64 {
        if self.image_chunks == 0 {
            return 0.0;
        }
        self.image_chunks_with_embedding as f64 / self.image_chunks as f64
    }
}

pub struct StatisticsService {
    document_repository: Arc<dyn DocumentRepository>,
    chunk_repository: Arc<dyn ChunkRepository>,
    query_repository: Arc<dyn QueryRepository>,
}

impl StatisticsService {
    pub fn new(
        document_repository: Arc<dyn DocumentRepository>,
        chunk_repository: Arc<dyn ChunkRepository>,
        query_repository: Arc<dyn QueryRepository>,
    ) -> Self {
        Self {
            document_repository,
            chunk_repository,
            query_repository,
        }
    }

    pub async fn collect(&self) -> Result<DatasetStatistics, StatisticsServiceError> {
        Ok(DatasetStatistics {
            files: self.document_repository.count_files().await?,
            documents: self.document_repository.count_documents().await?,
            pages: self.document_repository.count_pages().await?,
            image_chunks: self.chunk_repository.count_image_chunks().await?,
            image_chunks_with_embedding: self
                .chunk_repository
                .count_image_chunks_with_embedding()
                .await?,
            chunks: self.chunk_repository.count_chunks().await?,
            queries: self.query_repository.count_queries().await?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn test_collect_counts_seeded_dataset() {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        let service = StatisticsService::new(store.clone(), store.clone(), store);

        let stats = service.collect().await.unwrap();

        assert_eq!(
            stats,
            DatasetStatistics {
                files: 10,
                documents: 5,
                pages: 8,
                image_chunks: 8,
                image_chunks_with_embedding: 0,
                chunks: 9,
                queries: 4,
            }
        );
        assert_eq!(stats.embedding_coverage(), 0.0);
    }
}
