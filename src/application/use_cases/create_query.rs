use std::sync::Arc;

use thiserror::Error;

use crate::domain::entities::{NewQuery, Query};
use crate::domain::repositories::{ConstraintViolation, QueryRepository, RepositoryError};
use crate::domain::value_objects::{
    ChunkRef, GroundTruthError, GroundTruthShape, RelationKind, RetrievalGroundTruth,
};

pub const MAX_QUERY_LENGTH: usize = 2000;

#[derive(Debug, Error)]
pub enum CreateQueryError {
    #[error("Validation error: {0}")]
    ValidationError(String),
    #[error("Unknown retrieval target: {0}")]
    UnknownTarget(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for CreateQueryError {
    fn from(error: RepositoryError) -> Self {
        match error {
            RepositoryError::Constraint(ConstraintViolation::ForeignKey(msg)) => {
                CreateQueryError::UnknownTarget(msg)
            }
            RepositoryError::Validation(msg) => CreateQueryError::ValidationError(msg),
            other => CreateQueryError::RepositoryError(other.to_string()),
        }
    }
}

impl From<GroundTruthError> for CreateQueryError {
    fn from(error: GroundTruthError) -> Self {
        CreateQueryError::ValidationError(error.to_string())
    }
}

/// An annotator's query before confirmation.
#[derive(Debug, Clone)]
pub struct CreateQueryRequest {
    pub contents: String,
    pub query_to_llm: Option<String>,
    pub generation_gt: Vec<String>,
    /// Selected evidence, in selection order.
    pub targets: Vec<ChunkRef>,
    pub relation_kind: RelationKind,
}

impl CreateQueryRequest {
    /// Every problem with the draft, in display order. Empty when it can be saved.
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();

        let contents = self.contents.trim();
        if contents.is_empty() {
            problems.push("Query text is required".to_string());
        } else if contents.chars().count() > MAX_QUERY_LENGTH {
            problems.push(format!("Query text must be at most {} characters", MAX_QUERY_LENGTH));
        }

        if self.generation_gt.is_empty() {
            problems.push("At least one ground-truth answer is required".to_string());
        } else if self.generation_gt.iter().any(|answer| answer.trim().is_empty()) {
            problems.push("Ground-truth answers cannot be blank".to_string());
        }

        if self.targets.is_empty() {
            problems.push("Select at least one retrieval target".to_string());
        }

        problems
    }
}

#[derive(Debug, Clone)]
pub struct CreateQueryResponse {
    pub query: Query,
    pub ground_truth: RetrievalGroundTruth,
    pub shape: GroundTruthShape,
}

pub struct CreateQueryUseCase {
    query_repository: Arc<dyn QueryRepository>,
}

impl CreateQueryUseCase {
    pub fn new(query_repository: Arc<dyn QueryRepository>) -> Self {
        Self { query_repository }
    }

    pub async fn execute(
        &self,
        request: CreateQueryRequest,
    ) -> Result<CreateQueryResponse, CreateQueryError> {
        let problems = request.problems();
        if !problems.is_empty() {
            return Err(CreateQueryError::ValidationError(problems.join("; ")));
        }

        let ground_truth =
            RetrievalGroundTruth::from_selection(request.targets, request.relation_kind)?;

        let new_query = NewQuery {
            contents: request.contents.trim().to_string(),
            query_to_llm: request
                .query_to_llm
                .map(|text| text.trim().to_string())
                .filter(|text| !text.is_empty()),
            generation_gt: Some(
                request
                    .generation_gt
                    .iter()
                    .map(|answer| answer.trim().to_string())
                    .collect(),
            ),
        };

        let (query, relations) = self
            .query_repository
            .create_query_with_ground_truth(new_query, &ground_truth)
            .await?;

        tracing::info!(
            "Created query {} with {} retrieval relations ({:?})",
            query.id,
            relations.len(),
            ground_truth.shape()
        );

        Ok(CreateQueryResponse {
            shape: ground_truth.shape(),
            query,
            ground_truth,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::repositories::SeedRepository;
    use crate::domain::seed::SeedData;
    use crate::infrastructure::memory::InMemoryStore;

    fn draft(targets: Vec<ChunkRef>, relation_kind: RelationKind) -> CreateQueryRequest {
        CreateQueryRequest {
            contents: "  Which page shows the revenue chart? ".to_string(),
            query_to_llm: Some("   ".to_string()),
            generation_gt: vec!["page 2".to_string()],
            targets,
            relation_kind,
        }
    }

    async fn seeded_use_case() -> (Arc<InMemoryStore>, CreateQueryUseCase) {
        let store = Arc::new(InMemoryStore::new());
        store.load_seed(&SeedData::bundled().unwrap()).await.unwrap();
        store.advance_sequences().await.unwrap();
        let use_case = CreateQueryUseCase::new(store.clone());
        (store, use_case)
    }

    #[test]
    fn test_draft_problems() {
        let mut request = draft(vec![], RelationKind::Or);
        request.contents = " ".to_string();
        request.generation_gt = vec!["ok".to_string(), "".to_string()];

        assert_eq!(
            request.problems(),
            vec![
                "Query text is required".to_string(),
                "Ground-truth answers cannot be blank".to_string(),
                "Select at least one retrieval target".to_string(),
            ]
        );

        request.contents = "x".repeat(MAX_QUERY_LENGTH + 1);
        assert!(request.problems()[0].contains("at most"));
    }

    #[tokio::test]
    async fn test_and_selection_creates_multi_hop_query() {
        let (store, use_case) = seeded_use_case().await;

        let response = use_case
            .execute(draft(
                vec![ChunkRef::Image(2), ChunkRef::Text(2)],
                RelationKind::And,
            ))
            .await
            .unwrap();

        assert_eq!(response.shape, GroundTruthShape::MultiHop);
        assert_eq!(response.query.contents, "Which page shows the revenue chart?");
        assert_eq!(response.query.query_to_llm, None);
        assert!(response.query.id >= 5);

        let stored = store.ground_truth(response.query.id).await.unwrap();
        assert_eq!(stored, response.ground_truth);
    }

    #[tokio::test]
    async fn test_or_selection_creates_alternatives() {
        let (_, use_case) = seeded_use_case().await;

        let response = use_case
            .execute(draft(vec![ChunkRef::Text(1), ChunkRef::Image(1)], RelationKind::Or))
            .await
            .unwrap();

        assert_eq!(response.shape, GroundTruthShape::Alternatives);
        assert_eq!(response.ground_truth.groups().len(), 2);
    }

    #[tokio::test]
    async fn test_missing_target_saves_nothing() {
        let (store, use_case) = seeded_use_case().await;
        let before = store.count_queries().await.unwrap();

        let result = use_case
            .execute(draft(vec![ChunkRef::Text(1), ChunkRef::Image(404)], RelationKind::And))
            .await;

        assert!(matches!(result, Err(CreateQueryError::UnknownTarget(_))));
        assert_eq!(store.count_queries().await.unwrap(), before);
    }
}
