use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::RetrievedResult;
use crate::domain::repositories::{
    EvaluationRepository, QueryRepository, RepositoryError, SimilarityHit,
};
use crate::domain::value_objects::ChunkRef;

#[derive(Debug, Error)]
pub enum EvaluationServiceError {
    #[error("Query not found: {0}")]
    QueryNotFound(i64),
    #[error("Pipeline not found: {0}")]
    PipelineNotFound(i64),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for EvaluationServiceError {
    fn from(error: RepositoryError) -> Self {
        EvaluationServiceError::RepositoryError(error.to_string())
    }
}

/// Whether what a pipeline retrieved for a query covers its ground truth.
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalCheck {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub retrieved: Vec<RetrievedResult>,
    pub matched_groups: Vec<i32>,
}

impl RetrievalCheck {
    pub fn is_satisfied(&self) -> bool {
        !self.matched_groups.is_empty()
    }
}

pub struct EvaluationService {
    query_repository: Arc<dyn QueryRepository>,
    evaluation_repository: Arc<dyn EvaluationRepository>,
}

impl EvaluationService {
    pub fn new(
        query_repository: Arc<dyn QueryRepository>,
        evaluation_repository: Arc<dyn EvaluationRepository>,
    ) -> Self {
        Self {
            query_repository,
            evaluation_repository,
        }
    }

    /// Stores a pipeline's ranked hits for a query as retrieved results.
    pub async fn record_retrieval(
        &self,
        query_id: i64,
        pipeline_id: i64,
        hits: &[SimilarityHit],
    ) -> Result<usize, EvaluationServiceError> {
        self.ensure_exists(query_id, pipeline_id).await?;

        let results: Vec<RetrievedResult> = hits
            .iter()
            .map(|hit| RetrievedResult {
                query_id,
                pipeline_id,
                target: hit.target,
                rel_score: Some(f64::from(hit.score)),
            })
            .collect();
        self.evaluation_repository.save_retrieved_results(&results).await?;

        tracing::info!(
            "Recorded {} retrieved items for query {} / pipeline {}",
            results.len(),
            query_id,
            pipeline_id
        );
        Ok(results.len())
    }

    pub async fn check_retrieval(
        &self,
        query_id: i64,
        pipeline_id: i64,
    ) -> Result<RetrievalCheck, EvaluationServiceError> {
        self.ensure_exists(query_id, pipeline_id).await?;

        let ground_truth = self.query_repository.ground_truth(query_id).await?;
        let retrieved = self
            .evaluation_repository
            .find_retrieved_results(query_id, pipeline_id)
            .await?;
        let evidence: Vec<ChunkRef> = retrieved.iter().map(|r| r.target).collect();
        let matched_groups = ground_truth.matched_groups(&evidence);

        Ok(RetrievalCheck {
            query_id,
            pipeline_id,
            retrieved,
            matched_groups,
        })
    }

    async fn ensure_exists(
        &self,
        query_id: i64,
        pipeline_id: i64,
    ) -> Result<(), EvaluationServiceError> {
        if self.query_repository.find_query(query_id).await?.is_none() {
            return Err(EvaluationServiceError::QueryNotFound(query_id));
        }
        if self
            .evaluation_repository
            .find_pipeline(pipeline_id)
            .await?
            .is_none()
        {
            return Err(EvaluationServiceError::PipelineNotFound(pipeline_id));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::infrastructure::memory::InMemoryStore;

    async fn seeded() -> EvaluationService {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        EvaluationService::new(store.clone(), store)
    }

    #[tokio::test]
    async fn test_check_retrieval_against_seeded_results() {
        let service = seeded().await;

        let q1 = service.check_retrieval(1, 1).await.unwrap();
        assert!(q1.is_satisfied());
        assert_eq!(q1.retrieved[0].target, ChunkRef::Text(1));

        let q2 = service.check_retrieval(2, 2).await.unwrap();
        assert_eq!(q2.matched_groups, vec![0]);

        // Only one member of each multi-hop group was retrieved.
        let q4 = service.check_retrieval(4, 1).await.unwrap();
        assert!(!q4.is_satisfied());
    }

    #[tokio::test]
    async fn test_record_retrieval_then_check() {
        let service = seeded().await;
        let hits = vec![
            SimilarityHit {
                target: ChunkRef::Image(8),
                score: 0.9,
            },
            SimilarityHit {
                target: ChunkRef::Text(7),
                score: 0.5,
            },
        ];

        assert_eq!(service.record_retrieval(4, 2, &hits).await.unwrap(), 2);

        let check = service.check_retrieval(4, 2).await.unwrap();
        assert_eq!(check.matched_groups, vec![1]);
    }

    #[tokio::test]
    async fn test_unknown_query_or_pipeline() {
        let service = seeded().await;

        assert!(matches!(
            service.check_retrieval(99, 1).await,
            Err(EvaluationServiceError::QueryNotFound(99))
        ));
        assert!(matches!(
            service.record_retrieval(1, 99, &[]).await,
            Err(EvaluationServiceError::PipelineNotFound(99))
        ));
    }
}
