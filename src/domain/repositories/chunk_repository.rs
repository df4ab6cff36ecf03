use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::entities::{CaptionChunkRelation, Chunk, ImageChunk, NewChunk, NewImageChunk};
use crate::domain::value_objects::{ChunkRef, Embedding, EmbeddingUpdate, MultiVector};

#[derive(Debug, Clone, PartialEq)]
pub enum SimilarityQuery {
    /// Ranked by cosine similarity against the `embedding` column.
    Dense(Embedding),
    /// Ranked by late-interaction MaxSim against the `embeddings` column.
    MultiVector(MultiVector),
}

impl SimilarityQuery {
    pub fn dimension(&self) -> usize {
        match self {
            SimilarityQuery::Dense(embedding) => embedding.dimension(),
            SimilarityQuery::MultiVector(multi) => multi.dimension(),
        }
    }

    /// Score of one candidate, or `None` when it lacks the column this query ranks on.
    pub fn score(
        &self,
        embedding: Option<&Embedding>,
        embeddings: Option<&MultiVector>,
    ) -> Option<f32> {
        match self {
            SimilarityQuery::Dense(query) => embedding.map(|e| e.cosine_similarity(query)),
            SimilarityQuery::MultiVector(query) => embeddings.map(|m| m.max_sim(query)),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityHit {
    pub target: ChunkRef,
    /// Higher is more similar.
    pub score: f32,
}

/// Sorts by descending score (ties by target) and keeps the best `limit`.
pub fn rank_hits(mut hits: Vec<SimilarityHit>, limit: usize) -> Vec<SimilarityHit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.target.cmp(&b.target)));
    hits.truncate(limit);
    hits
}

#[async_trait]
pub trait ChunkRepository: Send + Sync {
    async fn create_chunk(&self, chunk: NewChunk) -> Result<Chunk, RepositoryError>;
    async fn find_chunk(&self, id: i64) -> Result<Option<Chunk>, RepositoryError>;
    async fn find_chunks_by_caption(&self, caption_id: i64) -> Result<Vec<Chunk>, RepositoryError>;

    async fn create_image_chunk(
        &self,
        image_chunk: NewImageChunk,
    ) -> Result<ImageChunk, RepositoryError>;
    async fn find_image_chunk(&self, id: i64) -> Result<Option<ImageChunk>, RepositoryError>;
    async fn find_image_chunks_by_page(
        &self,
        page_id: i64,
    ) -> Result<Vec<ImageChunk>, RepositoryError>;

    async fn link_caption_chunk(
        &self,
        relation: CaptionChunkRelation,
    ) -> Result<(), RepositoryError>;
    async fn find_chunk_ids_by_caption_link(
        &self,
        caption_id: i64,
    ) -> Result<Vec<i64>, RepositoryError>;

    /// Sets the provided embedding columns; fails with `NotFound` for unknown ids.
    async fn update_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError>;
    async fn update_image_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError>;

    /// Rows without the relevant embedding column are never returned.
    async fn search_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError>;
    async fn search_image_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError>;

    async fn count_chunks(&self) -> Result<i64, RepositoryError>;
    async fn count_image_chunks(&self) -> Result<i64, RepositoryError>;
    async fn count_image_chunks_with_embedding(&self) -> Result<i64, RepositoryError>;
}
