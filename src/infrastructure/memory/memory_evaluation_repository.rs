use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::entities::{
    EvaluationResult, ExecutorResult, Metric, NewMetric, NewPipeline, Pipeline, RetrievedResult,
    Summary,
};
use crate::domain::repositories::{EvaluationRepository, RepositoryError};
use crate::domain::value_objects::ChunkRef;

#[async_trait]
impl EvaluationRepository for InMemoryStore {
    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("pipeline");
        tables.insert_pipeline(Pipeline::from_new(id, pipeline))
    }

    async fn find_pipeline(&self, id: i64) -> Result<Option<Pipeline>, RepositoryError> {
        Ok(self.lock().await.pipelines.get(&id).cloned())
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, RepositoryError> {
        Ok(self.lock().await.pipelines.values().cloned().collect())
    }

    async fn create_metric(&self, metric: NewMetric) -> Result<Metric, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("metric");
        tables.insert_metric(Metric::from_new(id, metric))
    }

    async fn find_metric(&self, id: i64) -> Result<Option<Metric>, RepositoryError> {
        Ok(self.lock().await.metrics.get(&id).cloned())
    }

    async fn list_metrics(&self) -> Result<Vec<Metric>, RepositoryError> {
        Ok(self.lock().await.metrics.values().cloned().collect())
    }

    async fn save_executor_result(&self, result: ExecutorResult) -> Result<(), RepositoryError> {
        self.lock().await.insert_executor_result(result)
    }

    async fn find_executor_results(
        &self,
        pipeline_id: i64,
    ) -> Result<Vec<ExecutorResult>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .executor_results
            .values()
            .filter(|r| r.pipeline_id == pipeline_id)
            .cloned()
            .collect())
    }

    async fn save_evaluation_result(
        &self,
        result: EvaluationResult,
    ) -> Result<(), RepositoryError> {
        self.lock().await.insert_evaluation_result(result)
    }

    async fn find_evaluation_results(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Vec<EvaluationResult>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .evaluation_results
            .values()
            .filter(|r| r.pipeline_id == pipeline_id && r.metric_id == metric_id)
            .cloned()
            .collect())
    }

    async fn save_retrieved_results(
        &self,
        results: &[RetrievedResult],
    ) -> Result<(), RepositoryError> {
        let mut tables = self.lock().await;
        tables.transaction(|t| {
            for result in results {
                t.insert_retrieved_result(result)?;
            }
            Ok(())
        })
    }

    async fn find_retrieved_results(
        &self,
        query_id: i64,
        pipeline_id: i64,
    ) -> Result<Vec<RetrievedResult>, RepositoryError> {
        let tables = self.lock().await;
        let matches = |&(q, p, _): &(i64, i64, i64)| q == query_id && p == pipeline_id;

        let text = tables
            .chunk_retrieved_results
            .iter()
            .filter(|(key, _)| matches(key))
            .map(|(&(q, p, item), &rel_score)| RetrievedResult {
                query_id: q,
                pipeline_id: p,
                target: ChunkRef::Text(item),
                rel_score,
            });
        let image = tables
            .image_chunk_retrieved_results
            .iter()
            .filter(|(key, _)| matches(key))
            .map(|(&(q, p, item), &rel_score)| RetrievedResult {
                query_id: q,
                pipeline_id: p,
                target: ChunkRef::Image(item),
                rel_score,
            });

        let mut results: Vec<RetrievedResult> = text.chain(image).collect();
        RetrievedResult::sort_by_relevance(&mut results);
        Ok(results)
    }

    async fn save_summary(&self, summary: Summary) -> Result<(), RepositoryError> {
        self.lock().await.insert_summary(summary)
    }

    async fn find_summary(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Option<Summary>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .summaries
            .get(&(pipeline_id, metric_id))
            .cloned())
    }
}
