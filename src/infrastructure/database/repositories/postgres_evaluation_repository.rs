use async_trait::async_trait;
use diesel::prelude::*;

use crate::domain::entities::{
    EvaluationResult, ExecutorResult, Metric, NewMetric, NewPipeline, Pipeline, RetrievedResult,
    Summary,
};
use crate::domain::repositories::{EvaluationRepository, RepositoryError};
use crate::infrastructure::database::models::{
    ChunkRetrievedResultModel, EvaluationResultModel, ExecutorResultModel,
    ImageChunkRetrievedResultModel, MetricModel, NewMetricModel, NewPipelineModel, PipelineModel,
    SummaryModel, split_retrieved,
};
use crate::infrastructure::database::schema::{
    chunk_retrieved_results, evaluation_results, executor_results, image_chunk_retrieved_results,
    metrics, pipelines, summaries,
};
use crate::infrastructure::database::{DbPool, get_connection_from_pool};

pub struct PostgresEvaluationRepository {
    pool: DbPool,
}

impl PostgresEvaluationRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EvaluationRepository for PostgresEvaluationRepository {
    async fn create_pipeline(&self, pipeline: NewPipeline) -> Result<Pipeline, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(pipelines::table)
            .values(&NewPipelineModel::from(&pipeline))
            .returning(PipelineModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Pipeline::from(model))
    }

    async fn find_pipeline(&self, id: i64) -> Result<Option<Pipeline>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let result = pipelines::table
            .find(id)
            .select(PipelineModel::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(result.map(Pipeline::from))
    }

    async fn list_pipelines(&self) -> Result<Vec<Pipeline>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = pipelines::table
            .order(pipelines::id.asc())
            .select(PipelineModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(Pipeline::from).collect())
    }

    async fn create_metric(&self, metric: NewMetric) -> Result<Metric, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(metrics::table)
            .values(&NewMetricModel::from(&metric))
            .returning(MetricModel::as_returning())
            .get_result(&mut conn)?;

        Metric::try_from(model)
    }

    async fn find_metric(&self, id: i64) -> Result<Option<Metric>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        metrics::table
            .find(id)
            .select(MetricModel::as_select())
            .first(&mut conn)
            .optional()?
            .map(Metric::try_from)
            .transpose()
    }

    async fn list_metrics(&self) -> Result<Vec<Metric>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = metrics::table
            .order(metrics::id.asc())
            .select(MetricModel::as_select())
            .load(&mut conn)?;

        models.into_iter().map(Metric::try_from).collect()
    }

    async fn save_executor_result(&self, result: ExecutorResult) -> Result<(), RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        diesel::insert_into(executor_results::table)
            .values(&ExecutorResultModel::from(&result))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_executor_results(
        &self,
        pipeline_id: i64,
    ) -> Result<Vec<ExecutorResult>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = executor_results::table
            .filter(executor_results::pipeline_id.eq(pipeline_id))
            .order(executor_results::query_id.asc())
            .select(ExecutorResultModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(ExecutorResult::from).collect())
    }

    async fn save_evaluation_result(
        &self,
        result: EvaluationResult,
    ) -> Result<(), RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        diesel::insert_into(evaluation_results::table)
            .values(&EvaluationResultModel::from(&result))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_evaluation_results(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Vec<EvaluationResult>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = evaluation_results::table
            .filter(evaluation_results::pipeline_id.eq(pipeline_id))
            .filter(evaluation_results::metric_id.eq(metric_id))
            .order(evaluation_results::query_id.asc())
            .select(EvaluationResultModel::as_select())
            .load(&mut conn)?;

        Ok(models.into_iter().map(EvaluationResult::from).collect())
    }

    async fn save_retrieved_results(
        &self,
        results: &[RetrievedResult],
    ) -> Result<(), RepositoryError> {
        let (text, image) = split_retrieved(results);
        let mut conn = get_connection_from_pool(&self.pool)?;

        conn.transaction::<_, RepositoryError, _>(|conn| {
            if !text.is_empty() {
                diesel::insert_into(chunk_retrieved_results::table)
                    .values(&text)
                    .execute(conn)?;
            }
            if !image.is_empty() {
                diesel::insert_into(image_chunk_retrieved_results::table)
                    .values(&image)
                    .execute(conn)?;
            }
            Ok(())
        })
    }

    async fn find_retrieved_results(
        &self,
        query_id: i64,
        pipeline_id: i64,
    ) -> Result<Vec<RetrievedResult>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let text = chunk_retrieved_results::table
            .filter(chunk_retrieved_results::query_id.eq(query_id))
            .filter(chunk_retrieved_results::pipeline_id.eq(pipeline_id))
            .select(ChunkRetrievedResultModel::as_select())
            .load(&mut conn)?;
        let image = image_chunk_retrieved_results::table
            .filter(image_chunk_retrieved_results::query_id.eq(query_id))
            .filter(image_chunk_retrieved_results::pipeline_id.eq(pipeline_id))
            .select(ImageChunkRetrievedResultModel::as_select())
            .load(&mut conn)?;

        let mut results: Vec<RetrievedResult> = text
            .into_iter()
            .map(RetrievedResult::from)
            .chain(image.into_iter().map(RetrievedResult::from))
            .collect();
        RetrievedResult::sort_by_relevance(&mut results);
        Ok(results)
    }

    async fn save_summary(&self, summary: Summary) -> Result<(), RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        diesel::insert_into(summaries::table)
            .values(&SummaryModel::from(&summary))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_summary(
        &self,
        pipeline_id: i64,
        metric_id: i64,
    ) -> Result<Option<Summary>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let result = summaries::table
            .find((pipeline_id, metric_id))
            .select(SummaryModel::as_select())
            .first(&mut conn)
            .optional()?;

        Ok(result.map(Summary::from))
    }
}
