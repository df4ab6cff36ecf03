use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::Query;
use crate::domain::repositories::{QueryRepository, RepositoryError};
use crate::domain::value_objects::GroundTruthShape;

#[derive(Debug, Error)]
pub enum ListQueriesError {
    #[error("Repository error: {0}")]
    RepositoryError(String),
    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<RepositoryError> for ListQueriesError {
    fn from(error: RepositoryError) -> Self {
        ListQueriesError::RepositoryError(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct ListQueriesRequest {
    pub skip: i64,
    pub limit: i64,
}

#[derive(Debug, Clone)]
pub struct QueryListing {
    pub query: Query,
    pub shape: GroundTruthShape,
}

#[derive(Debug, Clone)]
pub struct ListQueriesResponse {
    pub queries: Vec<QueryListing>,
    pub total_count: i64,
    pub skip: i64,
    pub limit: i64,
}

pub struct ListQueriesUseCase {
    query_repository: Arc<dyn QueryRepository>,
}

impl ListQueriesUseCase {
    pub fn new(query_repository: Arc<dyn QueryRepository>) -> Self {
        Self { query_repository }
    }

    pub async fn execute(
        &self,
        request: ListQueriesRequest,
    ) -> Result<ListQueriesResponse, ListQueriesError> {
        // Validate input
        if request.skip < 0 {
            return Err(ListQueriesError::ValidationError("Skip cannot be negative".to_string()));
        }

        if request.limit <= 0 || request.limit > 1000 {
            return Err(ListQueriesError::ValidationError(
                "Limit must be between 1 and 1000".to_string(),
            ));
        }

        let queries = self.query_repository.list_queries(request.skip, request.limit).await?;
        let total_count = self.query_repository.count_queries().await?;

        let mut listings = Vec::with_capacity(queries.len());
        for query in queries {
            let shape = self.query_repository.ground_truth(query.id).await?.shape();
            listings.push(QueryListing { query, shape });
        }

        Ok(ListQueriesResponse {
            queries: listings,
            total_count,
            skip: request.skip,
            limit: request.limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::infrastructure::memory::InMemoryStore;

    async fn use_case() -> ListQueriesUseCase {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        ListQueriesUseCase::new(store)
    }

    #[tokio::test]
    async fn test_lists_newest_first_with_shapes() {
        let use_case = use_case().await;

        let response = use_case
            .execute(ListQueriesRequest { skip: 0, limit: 2 })
            .await
            .unwrap();

        assert_eq!(response.total_count, 4);
        let ids: Vec<i64> = response.queries.iter().map(|l| l.query.id).collect();
        assert_eq!(ids, vec![4, 3]);
        assert_eq!(response.queries[0].shape, GroundTruthShape::Mixed);
        assert_eq!(response.queries[1].shape, GroundTruthShape::Alternatives);

        let rest = use_case
            .execute(ListQueriesRequest { skip: 2, limit: 10 })
            .await
            .unwrap();
        let ids: Vec<i64> = rest.queries.iter().map(|l| l.query.id).collect();
        assert_eq!(ids, vec![2, 1]);
        assert_eq!(rest.queries[0].shape, GroundTruthShape::MultiHop);
        assert_eq!(rest.queries[1].shape, GroundTruthShape::Single);
    }

    #[tokio::test]
    async fn test_rejects_bad_paging() {
        let use_case = use_case().await;

        for (skip, limit) in [(-1, 10), (0, 0), (0, 1001)] {
            assert!(matches!(
                use_case.execute(ListQueriesRequest { skip, limit }).await,
                Err(ListQueriesError::ValidationError(_))
            ));
        }
    }
}
