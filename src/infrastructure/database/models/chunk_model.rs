use diesel::prelude::*;
use pgvector::Vector;

use crate::domain::entities::{Chunk, ImageChunk, NewChunk, NewImageChunk};
use crate::domain::repositories::RepositoryError;
use crate::domain::value_objects::{Embedding, EmbeddingUpdate, MultiVector};
use crate::infrastructure::database::schema::{chunks, image_chunks, queries};

pub fn to_vector(embedding: &Embedding) -> Vector {
    Vector::from(embedding.as_slice().to_vec())
}

pub fn to_vectors(multi: &MultiVector) -> Vec<Vector> {
    multi.vectors().iter().map(to_vector).collect()
}

pub fn from_vector(vector: Vector) -> Result<Embedding, RepositoryError> {
    Ok(Embedding::new(vector.to_vec())?)
}

pub fn from_vectors(vectors: Vec<Vector>) -> Result<MultiVector, RepositoryError> {
    let embeddings = vectors
        .into_iter()
        .map(from_vector)
        .collect::<Result<Vec<_>, _>>()?;
    Ok(MultiVector::new(embeddings)?)
}

/// Embedding columns of one row, loaded separately from the scalar columns.
pub struct VectorColumns {
    pub id: i64,
    pub embedding: Option<Embedding>,
    pub embeddings: Option<MultiVector>,
}

impl VectorColumns {
    pub fn from_row(
        (id, embedding, embeddings): (i64, Option<Vector>, Option<Vec<Vector>>),
    ) -> Result<Self, RepositoryError> {
        Ok(Self {
            id,
            embedding: embedding.map(from_vector).transpose()?,
            embeddings: embeddings.map(from_vectors).transpose()?,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ChunkModel {
    pub id: i64,
    pub parent_caption: Option<i64>,
    pub contents: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewChunkModel {
    pub id: Option<i64>,
    pub parent_caption: Option<i64>,
    pub contents: String,
}

impl From<&NewChunk> for NewChunkModel {
    fn from(chunk: &NewChunk) -> Self {
        Self {
            id: None,
            parent_caption: chunk.parent_caption,
            contents: chunk.contents.clone(),
        }
    }
}

impl From<&Chunk> for NewChunkModel {
    fn from(chunk: &Chunk) -> Self {
        Self {
            id: Some(chunk.id),
            parent_caption: chunk.parent_caption,
            contents: chunk.contents.clone(),
        }
    }
}

impl From<ChunkModel> for Chunk {
    fn from(model: ChunkModel) -> Self {
        Chunk {
            id: model.id,
            parent_caption: model.parent_caption,
            contents: model.contents,
            embedding: None,
            embeddings: None,
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Identifiable)]
#[diesel(table_name = image_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct ImageChunkModel {
    pub id: i64,
    pub parent_page: Option<i64>,
    pub contents: Vec<u8>,
    pub mimetype: String,
}

#[derive(Debug, Insertable)]
#[diesel(table_name = image_chunks)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct NewImageChunkModel {
    pub id: Option<i64>,
    pub parent_page: Option<i64>,
    pub contents: Vec<u8>,
    pub mimetype: String,
}

impl From<NewImageChunk> for NewImageChunkModel {
    fn from(image_chunk: NewImageChunk) -> Self {
        Self {
            id: None,
            parent_page: image_chunk.parent_page,
            contents: image_chunk.contents,
            mimetype: image_chunk.mimetype,
        }
    }
}

impl From<&ImageChunk> for NewImageChunkModel {
    fn from(image_chunk: &ImageChunk) -> Self {
        Self {
            id: Some(image_chunk.id),
            parent_page: image_chunk.parent_page,
            contents: image_chunk.contents.clone(),
            mimetype: image_chunk.mimetype.clone(),
        }
    }
}

impl From<ImageChunkModel> for ImageChunk {
    fn from(model: ImageChunkModel) -> Self {
        ImageChunk {
            id: model.id,
            parent_page: model.parent_page,
            contents: model.contents,
            mimetype: model.mimetype,
            embedding: None,
            embeddings: None,
        }
    }
}

// Partial updates: a `None` field leaves its column untouched.

#[derive(Debug, AsChangeset)]
#[diesel(table_name = chunks)]
pub struct ChunkVectorsChangeset {
    pub embedding: Option<Vector>,
    pub embeddings: Option<Vec<Vector>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = image_chunks)]
pub struct ImageChunkVectorsChangeset {
    pub embedding: Option<Vector>,
    pub embeddings: Option<Vec<Vector>>,
}

#[derive(Debug, AsChangeset)]
#[diesel(table_name = queries)]
pub struct QueryVectorsChangeset {
    pub embedding: Option<Vector>,
    pub embeddings: Option<Vec<Vector>>,
}

fn update_columns(update: &EmbeddingUpdate) -> (Option<Vector>, Option<Vec<Vector>>) {
    (
        update.embedding.as_ref().map(to_vector),
        update.embeddings.as_ref().map(to_vectors),
    )
}

impl From<&EmbeddingUpdate> for ChunkVectorsChangeset {
    fn from(update: &EmbeddingUpdate) -> Self {
        let (embedding, embeddings) = update_columns(update);
        Self { embedding, embeddings }
    }
}

impl From<&EmbeddingUpdate> for ImageChunkVectorsChangeset {
    fn from(update: &EmbeddingUpdate) -> Self {
        let (embedding, embeddings) = update_columns(update);
        Self { embedding, embeddings }
    }
}

impl From<&EmbeddingUpdate> for QueryVectorsChangeset {
    fn from(update: &EmbeddingUpdate) -> Self {
        let (embedding, embeddings) = update_columns(update);
        Self { embedding, embeddings }
    }
}
