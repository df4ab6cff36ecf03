use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Embedding, MultiVector};

/// Retrievable image region cropped from a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageChunk {
    pub id: i64,
    pub parent_page: Option<i64>,
    pub contents: Vec<u8>,
    pub mimetype: String,
    pub embedding: Option<Embedding>,
    pub embeddings: Option<MultiVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewImageChunk {
    pub parent_page: Option<i64>,
    pub contents: Vec<u8>,
    pub mimetype: String,
}

impl ImageChunk {
    pub fn from_new(id: i64, new_image_chunk: NewImageChunk) -> Self {
        Self {
            id,
            parent_page: new_image_chunk.parent_page,
            contents: new_image_chunk.contents,
            mimetype: new_image_chunk.mimetype,
            embedding: None,
            embeddings: None,
        }
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn size_bytes(&self) -> usize {
        self.contents.len()
    }
}
