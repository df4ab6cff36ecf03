use std::sync::Arc;

use thiserror::Error;

use crate::domain::repositories::{QueryRepository, RepositoryError};

#[derive(Debug, Error)]
pub enum DeleteQueryError {
    #[error("Query not found: {0}")]
    QueryNotFound(i64),
    /// Pipeline results still reference the query.
    #[error("Query is still referenced: {0}")]
    StillReferenced(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for DeleteQueryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Constraint(violation) => {
                DeleteQueryError::StillReferenced(violation.to_string())
            }
            other => DeleteQueryError::RepositoryError(other.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeleteQueryResponse {
    pub query_id: i64,
    pub relations_removed: usize,
}

pub struct DeleteQueryUseCase {
    query_repository: Arc<dyn QueryRepository>,
}

impl DeleteQueryUseCase {
    pub fn new(query_repository: Arc<dyn QueryRepository>) -> Self {
        Self { query_repository }
    }

    pub async fn execute(&self, query_id: i64) -> Result<DeleteQueryResponse, DeleteQueryError> {
        let relations_removed = self
            .query_repository
            .delete_query_with_relations(query_id)
            .await?
            .ok_or(DeleteQueryError::QueryNotFound(query_id))?;

        tracing::info!("Deleted query {} and {} relations", query_id, relations_removed);

        Ok(DeleteQueryResponse {
            query_id,
            relations_removed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewQuery;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::domain::value_objects::{ChunkRef, RetrievalGroundTruth};
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn test_delete_query_removes_relations() {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        store.advance_sequences().await.unwrap();
        let ground_truth =
            RetrievalGroundTruth::or_all(vec![ChunkRef::Text(1), ChunkRef::Image(2)]).unwrap();
        let (query, _) = store
            .create_query_with_ground_truth(NewQuery::new("fresh?"), &ground_truth)
            .await
            .unwrap();
        let use_case = DeleteQueryUseCase::new(store.clone());

        let response = use_case.execute(query.id).await.unwrap();

        assert_eq!(response.relations_removed, 2);
        assert!(store.find_query(query.id).await.unwrap().is_none());
        assert!(matches!(
            use_case.execute(query.id).await,
            Err(DeleteQueryError::QueryNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_query_with_results_is_still_referenced() {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        let use_case = DeleteQueryUseCase::new(store.clone());

        assert!(matches!(
            use_case.execute(1).await,
            Err(DeleteQueryError::StillReferenced(_))
        ));
        assert_eq!(store.find_relations_by_query(1).await.unwrap().len(), 1);
    }
}
