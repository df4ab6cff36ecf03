use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::{
    EvaluationResult, ExecutorResult, Metric, NewMetric, NewPipeline, Pipeline, RetrievedResult,
    Summary,
};

#[async_trait]
pub trait EvaluationRepository: Send + Sync {
    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline, RepositoryError>;
    async fn find_pipeline(&self, id: i64) -> Result<Option<Pipeline>, RepositoryError>;
    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, RepositoryError>;

    async fn create_metric(&self, metric: NewMetric) -> Result<Metric, RepositoryError>;
    async fn find_metric(&self, id: i64) -> Result<Option<Metric>, RepositoryError>;
    async fn list_metrics(&self) -> Result<Vec<Metric>, RepositoryError>;

    /// One row per (query, pipeline); a second save is a unique violation.
    async fn save_executor_result(&self, result: ExecutorResult) -> Result<(), RepositoryError>;
    async fn find_executor_results(
        &self,
        pipeline_id: i64,
    ) -> Result<Vec<ExecutorResult>, RepositoryError>;

    async fn save_evaluation_result(&self, result: EvaluationResult) -> Result<(), RepositoryError>;
    async fn find_evaluation_results(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Vec<EvaluationResult>, RepositoryError>;

    /// Saves a batch atomically, routing each row to the table of its target kind.
    async fn save_retrieved_results(
        &self,
        results: &[RetrievedResult],
    ) -> Result<(), RepositoryError>;
    /// Highest `rel_score` first; unscored rows last.
    async fn find_retrieved_results(
        &self,
        query_id: i64,
        pipeline_id: i64,
    ) -> Result<Vec<RetrievedResult>, RepositoryError>;

    async fn save_summary(&self, summary: Summary) -> Result<(), RepositoryError>;
    async fn find_summary(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Option<Summary>, RepositoryError>;
}
