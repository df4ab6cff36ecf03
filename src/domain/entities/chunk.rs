use serde::{Deserialize, Serialize};

use crate::domain::value_objects::{Embedding, MultiVector};

/// Retrievable unit of text cut from a caption.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: i64,
    pub parent_caption: Option<i64>,
    pub contents: String,
    pub embedding: Option<Embedding>,
    pub embeddings: Option<MultiVector>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewChunk {
    pub parent_caption: Option<i64>,
    pub contents: String,
}

impl Chunk {
    pub fn from_new(id: i64, new_chunk: NewChunk) -> Self {
        Self {
            id,
            parent_caption: new_chunk.parent_caption,
            contents: new_chunk.contents,
            embedding: None,
            embeddings: None,
        }
    }

    pub fn has_embedding(&self) -> bool {
        self.embedding.is_some()
    }

    pub fn has_multi_vector(&self) -> bool {
        self.embeddings.is_some()
    }

    pub fn word_count(&self) -> usize {
        self.contents.split_whitespace().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_chunk_has_no_embeddings() {
        let chunk = Chunk::from_new(
            1,
            NewChunk {
                parent_caption: Some(2),
                contents: "hello chunk".to_string(),
            },
        );

        assert!(!chunk.has_embedding());
        assert!(!chunk.has_multi_vector());
        assert_eq!(chunk.word_count(), 2);
    }
}
