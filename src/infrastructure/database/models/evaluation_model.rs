use diesel::prelude::*;

use crate::domain::entities::{
    EvaluationResult, ExecutorResult, Metric, NewMetric, NewPipeline, Pipeline, RetrievedResult,
    Summary,
};
use crate::domain::repositories::RepositoryError;
use crate::domain::value_objects::{ChunkRef, MetricType};
use crate::infrastructure::database::schema::{
    chunk_retrieved_results, evaluation_results, executor_results, image_chunk_retrieved_results,
    metrics, pipelines, summaries,
};

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct PipelineModel {
    pub id: i64,
    pub name: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = pipelines)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewPipelineModel {
    pub id: Option<i64>,
    pub name: String,
    pub config: serde_json::Value,
}

impl From<&NewPipeline> for NewPipelineModel {
    fn from(pipeline: &NewPipeline) -> Self {
        Self {
            id: None,
            name: pipeline.name.clone(),
            config: pipeline.config.clone(),
        }
    }
}

impl From<&Pipeline> for NewPipelineModel {
    fn from(pipeline: &Pipeline) -> Self {
        Self {
            id: Some(pipeline.id),
            name: pipeline.name.clone(),
            config: pipeline.config.clone(),
        }
    }
}

impl From<PipelineModel> for Pipeline {
    fn from(model: PipelineModel) -> Self {
        Pipeline {
            id: model.id,
            name: model.name,
            config: model.config,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct MetricModel {
    pub id: i64,
    pub name: String,
    pub metric_type: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewMetricModel {
    pub id: Option<i64>,
    pub name: String,
    pub metric_type: String,
}

impl From<&NewMetric> for NewMetricModel {
    fn from(metric: &NewMetric) -> Self {
        Self {
            id: None,
            name: metric.name.clone(),
            metric_type: metric.metric_type.as_str().to_string(),
        }
    }
}

impl From<&Metric> for NewMetricModel {
    fn from(metric: &Metric) -> Self {
        Self {
            id: Some(metric.id),
            name: metric.name.clone(),
            metric_type: metric.metric_type.as_str().to_string(),
        }
    }
}

impl TryFrom<MetricModel> for Metric {
    type Error = RepositoryError;

    fn try_from(model: MetricModel) -> Result<Self, Self::Error> {
        let metric_type = model
            .metric_type
            .parse::<MetricType>()
            .map_err(RepositoryError::Database)?;
        Ok(Metric {
            id: model.id,
            name: model.name,
            metric_type,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = executor_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ExecutorResultModel {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub generation_result: Option<String>,
    pub token_usage: Option<i64>,
    pub execution_time: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

impl From<&ExecutorResult> for ExecutorResultModel {
    fn from(result: &ExecutorResult) -> Self {
        Self {
            query_id: result.query_id,
            pipeline_id: result.pipeline_id,
            generation_result: result.generation_result.clone(),
            token_usage: result.token_usage,
            execution_time: result.execution_time,
            metadata: result.metadata.clone(),
        }
    }
}

impl From<ExecutorResultModel> for ExecutorResult {
    fn from(model: ExecutorResultModel) -> Self {
        ExecutorResult {
            query_id: model.query_id,
            pipeline_id: model.pipeline_id,
            generation_result: model.generation_result,
            token_usage: model.token_usage,
            execution_time: model.execution_time,
            metadata: model.metadata,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = evaluation_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct EvaluationResultModel {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub metric_id: i64,
    pub metric_result: f64,
}

impl From<&EvaluationResult> for EvaluationResultModel {
    fn from(result: &EvaluationResult) -> Self {
        Self {
            query_id: result.query_id,
            pipeline_id: result.pipeline_id,
            metric_id: result.metric_id,
            metric_result: result.metric_result,
        }
    }
}

impl From<EvaluationResultModel> for EvaluationResult {
    fn from(model: EvaluationResultModel) -> Self {
        EvaluationResult {
            query_id: model.query_id,
            pipeline_id: model.pipeline_id,
            metric_id: model.metric_id,
            metric_result: model.metric_result,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = chunk_retrieved_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkRetrievedResultModel {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub chunk_id: i64,
    pub rel_score: Option<f64>,
}

impl From<ChunkRetrievedResultModel> for RetrievedResult {
    fn from(model: ChunkRetrievedResultModel) -> Self {
        RetrievedResult {
            query_id: model.query_id,
            pipeline_id: model.pipeline_id,
            target: ChunkRef::Text(model.chunk_id),
            rel_score: model.rel_score,
        }
    }
}

#[derive(Debug, Clone, Copy, Queryable, Selectable, Insertable)]
#[diesel(table_name = image_chunk_retrieved_results)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageChunkRetrievedResultModel {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub image_chunk_id: i64,
    pub rel_score: Option<f64>,
}

impl From<ImageChunkRetrievedResultModel> for RetrievedResult {
    fn from(model: ImageChunkRetrievedResultModel) -> Self {
        RetrievedResult {
            query_id: model.query_id,
            pipeline_id: model.pipeline_id,
            target: ChunkRef::Image(model.image_chunk_id),
            rel_score: model.rel_score,
        }
    }
}

/// Splits a batch into the rows of the two retrieved-result tables.
pub fn split_retrieved(
    results: &[RetrievedResult],
) -> (Vec<ChunkRetrievedResultModel>, Vec<ImageChunkRetrievedResultModel>) {
    let mut text = Vec::new();
    let mut image = Vec::new();
    for result in results {
        match result.target {
            ChunkRef::Text(chunk_id) => text.push(ChunkRetrievedResultModel {
                query_id: result.query_id,
                pipeline_id: result.pipeline_id,
                chunk_id,
                rel_score: result.rel_score,
            }),
            ChunkRef::Image(image_chunk_id) => image.push(ImageChunkRetrievedResultModel {
                query_id: result.query_id,
                pipeline_id: result.pipeline_id,
                image_chunk_id,
                rel_score: result.rel_score,
            }),
        }
    }
    (text, image)
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = summaries)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SummaryModel {
    pub pipeline_id: i64,
    pub metric_id: i64,
    pub metric_result: f64,
    pub token_usage: Option<i64>,
    pub execution_time: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

impl From<&Summary> for SummaryModel {
    fn from(summary: &Summary) -> Self {
        Self {
            pipeline_id: summary.pipeline_id,
            metric_id: summary.metric_id,
            metric_result: summary.metric_result,
            token_usage: summary.token_usage,
            execution_time: summary.execution_time,
            metadata: summary.metadata.clone(),
        }
    }
}

impl From<SummaryModel> for Summary {
    fn from(model: SummaryModel) -> Self {
        Summary {
            pipeline_id: model.pipeline_id,
            metric_id: model.metric_id,
            metric_result: model.metric_result,
            token_usage: model.token_usage,
            execution_time: model.execution_time,
            metadata: model.metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_retrieved_routes_by_kind() {
        let results = vec![
            RetrievedResult {
                query_id: 1,
                pipeline_id: 2,
                target: ChunkRef::Text(3),
                rel_score: Some(0.9),
            },
            RetrievedResult {
                query_id: 1,
                pipeline_id: 2,
                target: ChunkRef::Image(3),
                rel_score: None,
            },
        ];

        let (text, image) = split_retrieved(&results);
        assert_eq!(text.len(), 1);
        assert_eq!(text[0].chunk_id, 3);
        assert_eq!(image.len(), 1);
        assert_eq!(image[0].rel_score, None);
    }
}
