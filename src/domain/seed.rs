//! Deterministic seed dataset loaded with explicit ids.

use serde::{Deserialize, Serialize};

use crate::domain::entities::{
    Caption, CaptionChunkRelation, Chunk, Document, EvaluationResult, ExecutorResult, File,
    ImageChunk, Metric, Page, Pipeline, Query, RetrievalRelation, RetrievedResult, Summary,
};
use crate::domain::repositories::ConstraintViolation;
use crate::domain::value_objects::{ChunkRef, Embedding, EmbeddingError, MultiVector};

const BUNDLED_SEED: &str = include_str!("../../seeds/seed.json");

/// Tables whose `id` comes from an identity sequence, in insertion order.
pub const SEQUENCED_TABLES: [&str; 9] = [
    "file",
    "document",
    "page",
    "caption",
    "chunk",
    "image_chunk",
    "query",
    "pipeline",
    "metric",
];

/// `retrieval_relation` row as stored: two nullable target columns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationRow {
    pub query_id: i64,
    pub group_index: i32,
    pub group_order: i32,
    pub chunk_id: Option<i64>,
    pub image_chunk_id: Option<i64>,
}

impl RelationRow {
    pub fn to_relation(&self) -> Result<RetrievalRelation, ConstraintViolation> {
        RetrievalRelation::from_columns(
            self.query_id,
            self.group_index,
            self.group_order,
            self.chunk_id,
            self.image_chunk_id,
        )
    }
}

/// Row of either retrieved-result table; `item_id` is the chunk or image chunk id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RetrievedRow {
    pub query_id: i64,
    pub pipeline_id: i64,
    pub item_id: i64,
    pub rel_score: Option<f64>,
}

fn check_vectors(
    embedding: Option<&Embedding>,
    embeddings: Option<&MultiVector>,
    dimension: usize,
) -> Result<(), EmbeddingError> {
    if let Some(embedding) = embedding {
        embedding.ensure_dimension(dimension)?;
    }
    if let Some(embeddings) = embeddings {
        embeddings.ensure_dimension(dimension)?;
    }
    Ok(())
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SeedData {
    pub files: Vec<File>,
    pub documents: Vec<Document>,
    pub pages: Vec<Page>,
    pub captions: Vec<Caption>,
    pub chunks: Vec<Chunk>,
    pub image_chunks: Vec<ImageChunk>,
    pub caption_chunk_relations: Vec<CaptionChunkRelation>,
    pub queries: Vec<Query>,
    pub retrieval_relations: Vec<RelationRow>,
    pub pipelines: Vec<Pipeline>,
    pub metrics: Vec<Metric>,
    pub executor_results: Vec<ExecutorResult>,
    pub evaluation_results: Vec<EvaluationResult>,
    pub chunk_retrieved_results: Vec<RetrievedRow>,
    pub image_chunk_retrieved_results: Vec<RetrievedRow>,
    pub summaries: Vec<Summary>,
}

impl SeedData {
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// The dataset shipped in `seeds/seed.json`.
    pub fn bundled() -> Result<Self, serde_json::Error> {
        Self::from_json(BUNDLED_SEED)
    }

    pub fn relations(&self) -> Result<Vec<RetrievalRelation>, ConstraintViolation> {
        self.retrieval_relations
            .iter()
            .map(RelationRow::to_relation)
            .collect()
    }

    /// Every seeded vector must match the store's embedding dimension.
    pub fn check_dimension(&self, dimension: usize) -> Result<(), EmbeddingError> {
        let chunks = self
            .chunks
            .iter()
            .map(|c| (c.embedding.as_ref(), c.embeddings.as_ref()));
        let image_chunks = self
            .image_chunks
            .iter()
            .map(|c| (c.embedding.as_ref(), c.embeddings.as_ref()));
        let queries = self
            .queries
            .iter()
            .map(|q| (q.embedding.as_ref(), q.embeddings.as_ref()));

        chunks
            .chain(image_chunks)
            .chain(queries)
            .try_for_each(|(embedding, embeddings)| check_vectors(embedding, embeddings, dimension))
    }

    pub fn retrieved_results(&self) -> Vec<RetrievedResult> {
        let text = self.chunk_retrieved_results.iter().map(|row| RetrievedResult {
            query_id: row.query_id,
            pipeline_id: row.pipeline_id,
            target: ChunkRef::Text(row.item_id),
            rel_score: row.rel_score,
        });
        let image = self
            .image_chunk_retrieved_results
            .iter()
            .map(|row| RetrievedResult {
                query_id: row.query_id,
                pipeline_id: row.pipeline_id,
                target: ChunkRef::Image(row.item_id),
                rel_score: row.rel_score,
            });
        text.chain(image).collect()
    }

    pub fn row_count(&self) -> usize {
        self.files.len()
            + self.documents.len()
            + self.pages.len()
            + self.captions.len()
            + self.chunks.len()
            + self.image_chunks.len()
            + self.caption_chunk_relations.len()
            + self.queries.len()
            + self.retrieval_relations.len()
            + self.pipelines.len()
            + self.metrics.len()
            + self.executor_results.len()
            + self.evaluation_results.len()
            + self.chunk_retrieved_results.len()
            + self.image_chunk_retrieved_results.len()
            + self.summaries.len()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TableSeedResult {
    pub table: &'static str,
    pub inserted: usize,
    pub skipped: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub tables: Vec<TableSeedResult>,
}

impl SeedReport {
    pub fn record(&mut self, table: &'static str, attempted: usize, inserted: usize) {
        self.tables.push(TableSeedResult {
            table,
            inserted,
            skipped: attempted.saturating_sub(inserted),
        });
    }

    pub fn inserted(&self, table: &str) -> usize {
        self.tables
            .iter()
            .filter(|t| t.table == table)
            .map(|t| t.inserted)
            .sum()
    }

    pub fn total_inserted(&self) -> usize {
        self.tables.iter().map(|t| t.inserted).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.tables.iter().map(|t| t.skipped).sum()
    }
}

/// Position of an identity counter after advancement: the next generated id
/// will be `last_value + 1`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequenceState {
    pub table: &'static str,
    pub last_value: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_seed_parses() {
        let seed = SeedData::bundled().unwrap();

        assert_eq!(seed.files.len(), 10);
        assert!(seed.relations().is_ok());
        assert_eq!(
            seed.retrieved_results().len(),
            seed.chunk_retrieved_results.len() + seed.image_chunk_retrieved_results.len()
        );
    }

    #[test]
    fn test_relation_row_needs_one_target() {
        let seed = SeedData::from_json(
            r#"{"retrieval_relations": [
                {"query_id": 1, "group_index": 0, "group_order": 0, "chunk_id": 1, "image_chunk_id": 2}
            ]}"#,
        )
        .unwrap();

        assert_eq!(seed.relations(), Err(ConstraintViolation::ExactlyOneTarget));
    }

    #[test]
    fn test_check_dimension_covers_every_vector_column() {
        let seed = SeedData::from_json(
            r#"{"queries": [
                {"id": 1, "contents": "q?", "embeddings": [[1.0, 0.0], [0.0, 1.0]]}
            ]}"#,
        )
        .unwrap();

        assert!(seed.check_dimension(2).is_ok());
        assert!(matches!(
            seed.check_dimension(3),
            Err(EmbeddingError::DimensionMismatch { .. })
        ));
        assert!(SeedData::bundled().unwrap().check_dimension(768).is_ok());
    }

    #[test]
    fn test_report_totals() {
        let mut report = SeedReport::default();
        report.record("file", 10, 10);
        report.record("document", 4, 0);

        assert_eq!(report.total_inserted(), 10);
        assert_eq!(report.total_skipped(), 4);
        assert_eq!(report.inserted("file"), 10);
    }
}
