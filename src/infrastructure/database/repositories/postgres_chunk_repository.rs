use async_trait::async_trait;
use diesel::prelude::*;
use pgvector::{Vector, VectorExpressionMethods};

use super::vector_columns::{
    check_update, dense_scores, load_chunk_vectors, load_image_chunk_vectors, max_sim_in_process,
    max_sim_search,
};
use crate::domain::entities::{CaptionChunkRelation, Chunk, ImageChunk, NewChunk, NewImageChunk};
use crate::domain::repositories::{
    ChunkRepository, RepositoryError, SimilarityHit, SimilarityQuery, rank_hits,
};
use crate::domain::value_objects::{ChunkRef, EmbeddingUpdate};
use crate::infrastructure::database::models::{
    CaptionChunkRelationModel, ChunkModel, ChunkVectorsChangeset, ImageChunkModel,
    ImageChunkVectorsChangeset, NewChunkModel, NewImageChunkModel, to_vector,
};
use crate::infrastructure::database::schema::{caption_chunk_relations, chunks, image_chunks};
use crate::infrastructure::database::{DbPool, VectorSupport, get_connection_from_pool};

pub struct PostgresChunkRepository {
    pool: DbPool,
    vectors: VectorSupport,
    dimension: usize,
}

impl PostgresChunkRepository {
    pub fn new(pool: DbPool, vectors: VectorSupport, dimension: usize) -> Self {
        Self {
            pool,
            vectors,
            dimension,
        }
    }

    fn check_search(&self, query: &SimilarityQuery) -> Result<(), RepositoryError> {
        if !self.vectors.is_available() {
            return Err(RepositoryError::ExtensionUnavailable(
                "no vector extension installed".to_string(),
            ));
        }
        if query.dimension() != self.dimension {
            return Err(RepositoryError::Validation(format!(
                "query dimension {} does not match column dimension {}",
                query.dimension(),
                self.dimension
            )));
        }
        Ok(())
    }

    fn attach_chunk_vectors(
        &self,
        conn: &mut PgConnection,
        items: &mut [Chunk],
    ) -> Result<(), RepositoryError> {
        if !self.vectors.is_available() || items.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = items.iter().map(|c| c.id).collect();
        let mut columns = load_chunk_vectors(conn, &ids)?;
        for chunk in items {
            if let Some(found) = columns.remove(&chunk.id) {
                chunk.embedding = found.embedding;
                chunk.embeddings = found.embeddings;
            }
        }
        Ok(())
    }

    fn attach_image_chunk_vectors(
        &self,
        conn: &mut PgConnection,
        items: &mut [ImageChunk],
    ) -> Result<(), RepositoryError> {
        if !self.vectors.is_available() || items.is_empty() {
            return Ok(());
        }
        let ids: Vec<i64> = items.iter().map(|c| c.id).collect();
        let mut columns = load_image_chunk_vectors(conn, &ids)?;
        for image_chunk in items {
            if let Some(found) = columns.remove(&image_chunk.id) {
                image_chunk.embedding = found.embedding;
                image_chunk.embeddings = found.embeddings;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl ChunkRepository for PostgresChunkRepository {
    async fn create_chunk(&self, chunk: NewChunk) -> Result<Chunk, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(chunks::table)
            .values(&NewChunkModel::from(&chunk))
            .returning(ChunkModel::as_returning())
            .get_result(&mut conn)?;

        Ok(Chunk::from(model))
    }

    async fn find_chunk(&self, id: i64) -> Result<Option<Chunk>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let Some(model) = chunks::table
            .find(id)
            .select(ChunkModel::as_select())
            .first(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let mut found = [Chunk::from(model)];
        self.attach_chunk_vectors(&mut conn, &mut found)?;
        let [chunk] = found;
        Ok(Some(chunk))
    }

    async fn find_chunks_by_caption(&self, caption_id: i64) -> Result<Vec<Chunk>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = chunks::table
            .filter(chunks::parent_caption.eq(caption_id))
            .order(chunks::id.asc())
            .select(ChunkModel::as_select())
            .load(&mut conn)?;

        let mut result: Vec<Chunk> = models.into_iter().map(Chunk::from).collect();
        self.attach_chunk_vectors(&mut conn, &mut result)?;
        Ok(result)
    }

    async fn create_image_chunk(
        &self,
        image_chunk: NewImageChunk,
    ) -> Result<ImageChunk, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let model = diesel::insert_into(image_chunks::table)
            .values(&NewImageChunkModel::from(image_chunk))
            .returning(ImageChunkModel::as_returning())
            .get_result(&mut conn)?;

        Ok(ImageChunk::from(model))
    }

    async fn find_image_chunk(&self, id: i64) -> Result<Option<ImageChunk>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let Some(model) = image_chunks::table
            .find(id)
            .select(ImageChunkModel::as_select())
            .first(&mut conn)
            .optional()?
        else {
            return Ok(None);
        };

        let mut found = [ImageChunk::from(model)];
        self.attach_image_chunk_vectors(&mut conn, &mut found)?;
        let [image_chunk] = found;
        Ok(Some(image_chunk))
    }

    async fn find_image_chunks_by_page(
        &self,
        page_id: i64,
    ) -> Result<Vec<ImageChunk>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        let models = image_chunks::table
            .filter(image_chunks::parent_page.eq(page_id))
            .order(image_chunks::id.asc())
            .select(ImageChunkModel::as_select())
            .load(&mut conn)?;

        let mut result: Vec<ImageChunk> = models.into_iter().map(ImageChunk::from).collect();
        self.attach_image_chunk_vectors(&mut conn, &mut result)?;
        Ok(result)
    }

    async fn link_caption_chunk(
        &self,
        relation: CaptionChunkRelation,
    ) -> Result<(), RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        diesel::insert_into(caption_chunk_relations::table)
            .values(&CaptionChunkRelationModel::from(&relation))
            .execute(&mut conn)?;

        Ok(())
    }

    async fn find_chunk_ids_by_caption_link(
        &self,
        caption_id: i64,
    ) -> Result<Vec<i64>, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        Ok(caption_chunk_relations::table
            .filter(caption_chunk_relations::caption_id.eq(caption_id))
            .order(caption_chunk_relations::chunk_id.asc())
            .select(caption_chunk_relations::chunk_id)
            .load(&mut conn)?)
    }

    async fn update_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        check_update(self.vectors, self.dimension, &update)?;
        let mut conn = get_connection_from_pool(&self.pool)?;

        let updated = diesel::update(chunks::table.find(id))
            .set(&ChunkVectorsChangeset::from(&update))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(RepositoryError::not_found("chunk", id));
        }
        Ok(())
    }

    async fn update_image_chunk_embeddings(
        &self,
        id: i64,
        update: EmbeddingUpdate,
    ) -> Result<(), RepositoryError> {
        check_update(self.vectors, self.dimension, &update)?;
        let mut conn = get_connection_from_pool(&self.pool)?;

        let updated = diesel::update(image_chunks::table.find(id))
            .set(&ImageChunkVectorsChangeset::from(&update))
            .execute(&mut conn)?;

        if updated == 0 {
            return Err(RepositoryError::not_found("image_chunk", id));
        }
        Ok(())
    }

    async fn search_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError> {
        self.check_search(query)?;
        let mut conn = get_connection_from_pool(&self.pool)?;

        let scored = match query {
            SimilarityQuery::Dense(embedding) => {
                let rows = chunks::table
                    .filter(chunks::embedding.is_not_null())
                    .order(chunks::embedding.cosine_distance(to_vector(embedding)))
                    .limit(limit as i64)
                    .select((chunks::id, chunks::embedding))
                    .load::<(i64, Option<Vector>)>(&mut conn)?;
                dense_scores(rows, embedding)?
            }
            SimilarityQuery::MultiVector(multi) if self.vectors.has_max_sim() => {
                max_sim_search(&mut conn, "chunk", multi, limit)?
            }
            SimilarityQuery::MultiVector(multi) => {
                let candidates = chunks::table
                    .filter(chunks::embeddings.is_not_null())
                    .select((chunks::id, chunks::embeddings))
                    .load::<(i64, Option<Vec<Vector>>)>(&mut conn)?;
                max_sim_in_process(candidates, multi)?
            }
        };

        let hits = scored
            .into_iter()
            .map(|(id, score)| SimilarityHit {
                target: ChunkRef::Text(id),
                score,
            })
            .collect();
        Ok(rank_hits(hits, limit))
    }

    async fn search_image_chunks(
        &self,
        query: &SimilarityQuery,
        limit: usize,
    ) -> Result<Vec<SimilarityHit>, RepositoryError> {
        self.check_search(query)?;
        let mut conn = get_connection_from_pool(&self.pool)?;

        let scored = match query {
            SimilarityQuery::Dense(embedding) => {
                let rows = image_chunks::table
                    .filter(image_chunks::embedding.is_not_null())
                    .order(image_chunks::embedding.cosine_distance(to_vector(embedding)))
                    .limit(limit as i64)
                    .select((image_chunks::id, image_chunks::embedding))
                    .load::<(i64, Option<Vector>)>(&mut conn)?;
                dense_scores(rows, embedding)?
            }
            SimilarityQuery::MultiVector(multi) if self.vectors.has_max_sim() => {
                max_sim_search(&mut conn, "image_chunk", multi, limit)?
            }
            SimilarityQuery::MultiVector(multi) => {
                let candidates = image_chunks::table
                    .filter(image_chunks::embeddings.is_not_null())
                    .select((image_chunks::id, image_chunks::embeddings))
                    .load::<(i64, Option<Vec<Vector>>)>(&mut conn)?;
                max_sim_in_process(candidates, multi)?
            }
        };

        let hits = scored
            .into_iter()
            .map(|(id, score)| SimilarityHit {
                target: ChunkRef::Image(id),
                score,
            })
            .collect();
        Ok(rank_hits(hits, limit))
    }

    async fn count_chunks(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(chunks::table.count().get_result(&mut conn)?)
    }

    async fn count_image_chunks(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;
        Ok(image_chunks::table.count().get_result(&mut conn)?)
    }

    async fn count_image_chunks_with_embedding(&self) -> Result<i64, RepositoryError> {
        let mut conn = get_connection_from_pool(&self.pool)?;

        Ok(image_chunks::table
            .filter(image_chunks::embedding.is_not_null())
            .count()
            .get_result(&mut conn)?)
    }
}
