use serde::{Deserialize, Serialize};

use crate::domain::repositories::ConstraintViolation;
use crate::domain::value_objects::ChunkRef;

/// One ground-truth slot of a query: `group_index` selects the alternative,
/// `group_order` the position inside it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetrievalRelation {
    pub query_id: i64,
    pub group_index: i32,
    pub group_order: i32,
    pub target: ChunkRef,
}

impl RetrievalRelation {
    /// Builds a relation from its storage columns, rejecting rows that point at
    /// both kinds of chunk or at neither.
    pub fn from_columns(
        query_id: i64,
        group_index: i32,
        group_order: i32,
        chunk_id: Option<i64>,
        image_chunk_id: Option<i64>,
    ) -> Result<Self, ConstraintViolation> {
        let target = ChunkRef::from_columns(chunk_id, image_chunk_id)
            .ok_or(ConstraintViolation::ExactlyOneTarget)?;
        Ok(Self {
            query_id,
            group_index,
            group_order,
            target,
        })
    }

    pub fn slot(&self) -> (i64, i32, i32) {
        (self.query_id, self.group_index, self.group_order)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exactly_one_target() {
        assert!(RetrievalRelation::from_columns(1, 0, 0, Some(1), None).is_ok());
        assert!(RetrievalRelation::from_columns(1, 0, 0, None, Some(1)).is_ok());
        assert_eq!(
            RetrievalRelation::from_columns(1, 0, 0, Some(1), Some(1)),
            Err(ConstraintViolation::ExactlyOneTarget)
        );
        assert_eq!(
            RetrievalRelation::from_columns(1, 0, 0, None, None),
            Err(ConstraintViolation::ExactlyOneTarget)
        );
    }
}
