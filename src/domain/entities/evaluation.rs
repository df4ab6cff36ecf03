use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{ChunkRef, MetricType};

/// A named retrieval + generation configuration under evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pipeline {
    pub id: i64,
    pub name: String,
    pub config: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPipeline {
    pub name: String,
    pub config: serde_json::Value,
}

impl Pipeline {
    pub fn from_new(id: i64, new_pipeline: NewPipeline) -> Self {
        Self {
            id,
            name: new_pipeline.name,
            config: new_pipeline.config,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metric {
    pub id: i64,
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMetric {
    pub name: String,
    #[serde(rename = "type")]
    pub metric_type: MetricType,
}

impl Metric {
    pub fn from_new(id: i64, new_metric: NewMetric) -> Self {
        Self {
            id,
            name: new_metric.name,
            metric_type: new_metric.metric_type,
        }
    }
}

/// Output of one pipeline run for one query.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutorResult {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub generation_result: Option<String>,
    pub token_usage: Option<i64>,
    /// Milliseconds.
    pub execution_time: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvaluationResult {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub metric_id: i64,
    pub metric_result: f64,
}

/// An item a pipeline returned for a query. Stored in `chunk_retrieved_result`
/// or `image_chunk_retrieved_result` depending on the target kind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedResult {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub target: ChunkRef,
    pub rel_score: Option<f64>,
}

impl RetrievedResult {
    /// Highest `rel_score` first, unscored rows last, ties by target.
    pub fn sort_by_relevance(results: &mut [RetrievedResult]) {
        results.sort_by(|a, b| match (a.rel_score, b.rel_score) {
            (Some(x), Some(y)) => y.total_cmp(&x).then_with(|| a.target.cmp(&b.target)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.target.cmp(&b.target),
        });
    }
}

/// Aggregate of one metric over every evaluated query of a pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub pipeline_id: i64,
    pub metric_id: i64,
    pub metric_result: f64,
    pub token_usage: Option<i64>,
    pub execution_time: Option<i64>,
    pub metadata: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn retrieved(target: ChunkRef, rel_score: Option<f64>) -> RetrievedResult {
        RetrievedResult {
            query_id: 1,
            pipeline_id: 1,
            target,
            rel_score,
        }
    }

    #[test]
    fn test_sort_by_relevance_puts_unscored_last() {
        let mut results = vec![
            retrieved(ChunkRef::Text(1), None),
            retrieved(ChunkRef::Image(2), Some(0.4)),
            retrieved(ChunkRef::Text(3), Some(0.9)),
        ];
        RetrievedResult::sort_by_relevance(&mut results);

        let targets: Vec<ChunkRef> = results.iter().map(|r| r.target).collect();
        assert_eq!(
            targets,
            vec![ChunkRef::Text(3), ChunkRef::Image(2), ChunkRef::Text(1)]
        );
    }
}
