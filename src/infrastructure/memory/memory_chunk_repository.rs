use async_trait::async_trait;

use super::InMemoryStore;
use crate::domain::entities::{CaptionChunkRelation, Chunk, ImageChunk, NewChunk, NewImageChunk};
use crate::domain::repositories::{
    ChunkRepository, RepositoryError, SimilarityHit, SimilarityQuery, rank_hits,
};
use crate::domain::value_objects::{ChunkRef, EmbeddingUpdate};

impl InMemoryStore {
    fn check_update(&self, update: &EmbeddingUpdate) -> Result<(), RepositoryError> {
        if update.is_empty() {
            return Err(RepositoryError::Validation(
                "embedding update sets no columns".to_string(),
            ));
        }
        update.ensure_dimension(self.dimension())?;
        Ok(())
    }

    fn check_query(&self, query: &SimilarityQuery) -> Result<(), RepositoryError> {
        if query.dimension() != self.dimension() {
            return Err(RepositoryError::Validation(format!(
                "query dimension {} does not match column dimension {}",
                query.dimension(),
                self.dimension()
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkRepository for InMemoryStore {
    async fn create_chunk(&self, chunk: NewChunk) -> Result<Chunk, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("chunk");
        tables.insert_chunk(Chunk::from_new(id, chunk))
    }

    async fn find_chunk(&self, id: i64) -> Result<Option<Chunk>, RepositoryError> {
        Ok(self.lock().await.chunks.get(&id).cloned())
    }

    async fn find_chunks_by_caption(&self, caption_id: i64) -> Result<Vec<Chunk>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .chunks
            .values()
            .filter(|c| c.parent_caption == Some(caption_id))
            .cloned()
            .collect())
    }

    async fn create_image_chunk(
        &self,
        image_chunk: NewImageChunk,
    ) -> Result<ImageChunk, RepositoryError> {
        let mut tables = self.lock().await;
        let id = tables.next_id("image_chunk");
        tables.insert_image_chunk(ImageChunk::from_new(id, image_chunk))
    }

    async fn find_image_chunk(&self, id: i64) -> Result<Option<ImageChunk>, RepositoryError> {
        Ok(self.lock().await.image_chunks.get(&id).cloned())
    }

    async fn find_image_chunks_by_page(
        &self,
        page_id: i64,
    ) -> Result<Vec<ImageChunk>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .image_chunks
            .values()
            .filter(|ic| ic.parent_page == Some(page_id))
            .cloned()
            .collect())
    }

    async fn link_caption_chunk(
        &self,
        relation: CaptionChunkRelation,
    ) -> Result<(), RepositoryError> {
        self.lock().await.insert_caption_chunk_relation(relation)
    }

    async fn find_chunk_ids_by_caption_link(
        &self,
        caption_id: i64,
    ) -> Result<Vec<i64>, RepositoryError> {
        Ok(self
            .lock()
            .await
            .caption_chunk_relations
            .iter()
            .filter(|(c, _)| *c == caption_id)
            .map(|(_, chunk_id)| *chunk_id)
            .collect())
    }

    async fn update_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        self.check_update(&update)?;
        let mut tables = self.lock().await;
        let chunk = tables
            .chunks
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("chunk", id))?;
        if let Some(embedding) = update.embedding {
            chunk.embedding = Some(embedding);
        }
        if let Some(embeddings) = update.embeddings {
            chunk.embeddings = Some(embeddings);
        }
        Ok(())
    }

    async fn update_image_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        self.check_update(&update)?;
        let mut tables = self.lock().await;
        let image_chunk = tables
            .image_chunks
            .get_mut(&id)
            .ok_or_else(|| RepositoryError::not_found("image_chunk", id))?;
        if let Some(embedding) = update.embedding {
            image_chunk.embedding = Some(embedding);
        }
        if let Some(embeddings) = update.embeddings {
            image_chunk.embeddings = Some(embeddings);
        }
        Ok(())
    }

    async fn search_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError> {
        self.check_query(query)?;
        let tables = self.lock().await;
        let hits = tables
            .chunks
            .values()
            .filter_map(|c| {
                query
                    .score(c.embedding.as_ref(), c.embeddings.as_ref())
                    .map(|score| SimilarityHit {
                        target: ChunkRef::Text(c.id),
                        score,
                    })
            })
            .collect();
        Ok(rank_hits(hits, limit))
    }

    async fn search_image_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError> {
        self.check_query(query)?;
        let tables = self.lock().await;
        let hits = tables
            .image_chunks
            .values()
            .filter_map(|ic| {
                query
                    .score(ic.embedding.as_ref(), ic.embeddings.as_ref())
                    .map(|score| SimilarityHit {
                        target: ChunkRef::Image(ic.id),
                        score,
                    })
            })
            .collect();
        Ok(rank_hits(hits, limit))
    }

    async fn count_chunks(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.chunks.len() as i64)
    }

    async fn count_image_chunks(&self) -> Result<i64, RepositoryError> {
        Ok(self.lock().await.image_chunks.len() as i64)
    }

    async fn count_image_chunks_with_embedding(&self) -> Result<i64, RepositoryError> {
        Ok(self
            .lock()
            .await
            .image_chunks
            .values()
            .filter(|ic| ic.has_embedding())
            .count() as i64)
    }
}
