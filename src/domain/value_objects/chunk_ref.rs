use serde::{Deserialize, Serialize};

/// Reference to a retrievable item: either a text chunk or an image chunk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum ChunkRef {
    Text(i64),
    Image(i64),
}

impl ChunkRef {
    /// Builds a reference from the storage pair `(chunk_id, image_chunk_id)`.
    /// Returns `None` unless exactly one side is set.
    pub fn from_columns(chunk_id: Option<i64>, image_chunk_id: Option<i64>) -> Option<Self> {
        match (chunk_id, image_chunk_id) {
            (Some(id), None) => Some(ChunkRef::Text(id)),
            (None, Some(id)) => Some(ChunkRef::Image(id)),
            _ => None,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            ChunkRef::Text(id) | ChunkRef::Image(id) => *id,
        }
    }

    pub fn chunk_id(&self) -> Option<i64> {
        match self {
            ChunkRef::Text(id) => Some(*id),
            ChunkRef::Image(_) => None,
        }
    }

    pub fn image_chunk_id(&self) -> Option<i64> {
        match self {
            ChunkRef::Image(id) => Some(*id),
            ChunkRef::Text(_) => None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self, ChunkRef::Text(_))
    }

    pub fn is_image(&self) -> bool {
        matches!(self, ChunkRef::Image(_))
    }
}

impl std::fmt::Display for ChunkRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChunkRef::Text(id) => write!(f, "chunk:{}", id),
            ChunkRef::Image(id) => write!(f, "image_chunk:{}", id),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_columns_requires_exactly_one() {
        assert_eq!(ChunkRef::from_columns(Some(1), None), Some(ChunkRef::Text(1)));
        assert_eq!(ChunkRef::from_columns(None, Some(2)), Some(ChunkRef::Image(2)));
        assert_eq!(ChunkRef::from_columns(Some(1), Some(2)), None);
        assert_eq!(ChunkRef::from_columns(None, None), None);
    }

    #[test]
    fn test_column_projection() {
        let text = ChunkRef::Text(7);
        assert_eq!((text.chunk_id(), text.image_chunk_id()), (Some(7), None));

        let image = ChunkRef::Image(9);
        assert_eq!((image.chunk_id(), image.image_chunk_id()), (None, Some(9)));
        assert_eq!(image.to_string(), "image_chunk:9");
    }
}
