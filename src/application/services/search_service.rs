use std::sync::Arc;

use thiserror::Error;

use crate::domain::repositories::{
    ChunkRepository, RepositoryError, SimilarityHit, SimilarityQuery, rank_hits,
};
use crate::domain::value_objects::ChunkRef;

#[derive(Debug, Error)]
pub enum SearchServiceError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Vector search unavailable: {0}")]
    Unavailable(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for SearchServiceError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Validation(msg) => SearchServiceError::ValidationError(msg),
            RepositoryError::ExtensionUnavailable(msg) => SearchServiceError::Unavailable(msg),
            other => SearchServiceError::RepositoryError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SearchScope {
    Text,
    Image,
    #[default]
    All,
}

/// A ranked hit with enough of the row attached to show it.
#[derive(Debug, Clone, PartialEq)]
pub enum SearchMatch {
    Text {
        chunk_id: i64,
        contents: String,
        score: f32,
    },
    Image {
        image_chunk_id: i64,
        parent_page: Option<i64>,
        mimetype: String,
        score: f32,
    },
}

impl SearchMatch {
    pub fn target(&self) -> ChunkRef {
        match self {
            SearchMatch::Text { chunk_id, .. } => ChunkRef::Text(*chunk_id),
            SearchMatch::Image { image_chunk_id, .. } => ChunkRef::Image(*image_chunk_id),
        }
    }

    pub fn score(&self) -> f32 {
        match self {
            SearchMatch::Text { score, .. } | SearchMatch::Image { score, .. } => *score,
        }
    }
}

pub struct SearchService {
    chunk_repository: Arc<dyn ChunkRepository>,
}

impl SearchService {
    pub const MAX_LIMIT: usize = 100;

    pub fn new(chunk_repository: Arc<dyn ChunkRepository>) -> Self {
        Self { chunk_repository }
    }

    /// Nearest chunks across the requested kinds, best first.
    pub async fn search(
        &self,
        query: &SimilarityQuery,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, SearchServiceError> {
        if limit == 0 || limit > Self::MAX_LIMIT {
            return Err(SearchServiceError::ValidationError(format!(
                "Limit must be between 1 and {}",
                Self::MAX_LIMIT
            )));
        }

        let mut hits = Vec::new();
        if scope != SearchScope::Image {
            hits.extend(self.chunk_repository.search_chunks(query, limit).await?);
        }
        if scope != SearchScope::Text {
            hits.extend(self.chunk_repository.search_image_chunks(query, limit).await?);
        }

        tracing::debug!("Similarity search over {:?} returned {} candidates", scope, hits.len());
        Ok(rank_hits(hits, limit))
    }

    /// Like [`search`](Self::search), with each hit's row loaded. Hits whose row
    /// vanished between the search and the lookup are dropped.
    pub async fn search_with_contents(
        &self,
        query: &SimilarityQuery,
        scope: SearchScope,
        limit: usize,
    ) -> Result<Vec<SearchMatch>, SearchServiceError> {
        let hits = self.search(query, scope, limit).await?;

        let mut matches = Vec::with_capacity(hits.len());
        for hit in hits {
            match hit.target {
                ChunkRef::Text(id) => {
                    if let Some(chunk) = self.chunk_repository.find_chunk(id).await? {
                        matches.push(SearchMatch::Text {
                            chunk_id: chunk.id,
                            contents: chunk.contents,
                            score: hit.score,
                        });
                    }
                }
                ChunkRef::Image(id) => {
                    if let Some(image_chunk) = self.chunk_repository.find_image_chunk(id).await? {
                        matches.push(SearchMatch::Image {
                            image_chunk_id: image_chunk.id,
                            parent_page: image_chunk.parent_page,
                            mimetype: image_chunk.mimetype,
                            score: hit.score,
                        });
                    }
                }
            }
        }
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{NewChunk, NewImageChunk};
    use crate::domain::value_objects::{Embedding, EmbeddingUpdate};
    use crate::infrastructure::memory::InMemoryStore;

    async fn store_with_vectors() -> (Arc<InMemoryStore>, i64, i64) {
        let store = Arc::new(InMemoryStore::with_dimension(2));
        let chunk = store
            .create_chunk(NewChunk {
                parent_caption: None,
                contents: "total revenue".to_string(),
            })
            .await
            .unwrap();
        let image_chunk = store
            .create_image_chunk(NewImageChunk {
                parent_page: None,
                contents: vec![1, 2, 3],
                mimetype: "image/png".to_string(),
            })
            .await
            .unwrap();

        let dense = |values: Vec<f32>| EmbeddingUpdate {
            embedding: Some(Embedding::new(values).unwrap()),
            embeddings: None,
        };
        store
            .update_chunk_embeddings(chunk.id, dense(vec![0.6, 0.8]))
            .await
            .unwrap();
        store
            .update_image_chunk_embeddings(image_chunk.id, dense(vec![1.0, 0.0]))
            .await
            .unwrap();

        (store, chunk.id, image_chunk.id)
    }

    #[tokio::test]
    async fn test_search_all_merges_kinds_by_score() {
        let (store, chunk_id, image_chunk_id) = store_with_vectors().await;
        let service = SearchService::new(store);
        let query = SimilarityQuery::Dense(Embedding::new(vec![1.0, 0.0]).unwrap());

        let hits = service.search(&query, SearchScope::All, 10).await.unwrap();
        let targets: Vec<ChunkRef> = hits.iter().map(|h| h.target).collect();
        assert_eq!(targets, vec![ChunkRef::Image(image_chunk_id), ChunkRef::Text(chunk_id)]);

        let text_only = service.search(&query, SearchScope::Text, 10).await.unwrap();
        assert_eq!(text_only.len(), 1);
        assert_eq!(text_only[0].target, ChunkRef::Text(chunk_id));
    }

    #[tokio::test]
    async fn test_search_with_contents_loads_rows() {
        let (store, _, image_chunk_id) = store_with_vectors().await;
        let service = SearchService::new(store);
        let query = SimilarityQuery::Dense(Embedding::new(vec![0.0, 1.0]).unwrap());

        let matches = service
            .search_with_contents(&query, SearchScope::All, 2)
            .await
            .unwrap();

        assert_eq!(matches.len(), 2);
        assert!(matches!(
            &matches[0],
            SearchMatch::Text { contents, .. } if contents == "total revenue"
        ));
        assert_eq!(matches[1].target(), ChunkRef::Image(image_chunk_id));
        assert!(matches[0].score() > matches[1].score());
    }

    #[tokio::test]
    async fn test_search_validates_limit_and_dimension() {
        let (store, _, _) = store_with_vectors().await;
        let service = SearchService::new(store);
        let query = SimilarityQuery::Dense(Embedding::new(vec![1.0, 0.0]).unwrap());

        assert!(matches!(
            service.search(&query, SearchScope::All, 0).await,
            Err(SearchServiceError::ValidationError(_))
        ));

        let wrong = SimilarityQuery::Dense(Embedding::new(vec![1.0, 0.0, 0.0]).unwrap());
        assert!(matches!(
            service.search(&wrong, SearchScope::All, 5).await,
            Err(SearchServiceError::ValidationError(_))
        ));
    }
}
