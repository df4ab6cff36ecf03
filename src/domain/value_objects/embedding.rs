use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Dimension of the dense vectors stored on chunks, image chunks and queries.
pub const DEFAULT_EMBEDDING_DIMENSION: usize = 768;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum EmbeddingError {
    #[error("embedding must contain at least one value")]
    Empty,
    #[error("embedding contains a non-finite value at position {0}")]
    NonFinite(usize),
    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },
}

/// A single dense vector.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<f32>", into = "Vec<f32>")]
pub struct Embedding(Vec<f32>);

impl Embedding {
    pub fn new(values: Vec<f32>) -> Result<Self, EmbeddingError> {
        if values.is_empty() {
            return Err(EmbeddingError::Empty);
        }
        if let Some(position) = values.iter().position(|v| !v.is_finite()) {
            return Err(EmbeddingError::NonFinite(position));
        }
        Ok(Self(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn into_vec(self) -> Vec<f32> {
        self.0
    }

    pub fn ensure_dimension(&self, expected: usize) -> Result<(), EmbeddingError> {
        if self.dimension() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: self.dimension(),
            });
        }
        Ok(())
    }

    pub fn dot(&self, other: &Embedding) -> f32 {
        self.0.iter().zip(other.0.iter()).map(|(a, b)| a * b).sum()
    }

    pub fn norm(&self) -> f32 {
        self.0.iter().map(|v| v * v).sum::<f32>().sqrt()
    }

    /// Cosine similarity in [-1, 1]; zero vectors score 0.
    pub fn cosine_similarity(&self, other: &Embedding) -> f32 {
        let denominator = self.norm() * other.norm();
        if denominator == 0.0 {
            return 0.0;
        }
        self.dot(other) / denominator
    }
}

impl TryFrom<Vec<f32>> for Embedding {
    type Error = EmbeddingError;

    fn try_from(values: Vec<f32>) -> Result<Self, Self::Error> {
        Embedding::new(values)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(embedding: Embedding) -> Self {
        embedding.0
    }
}

/// Ordered sequence of same-dimension vectors used by late-interaction models.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Embedding>", into = "Vec<Embedding>")]
pub struct MultiVector(Vec<Embedding>);

impl MultiVector {
    pub fn new(vectors: Vec<Embedding>) -> Result<Self, EmbeddingError> {
        let first = vectors.first().ok_or(EmbeddingError::Empty)?;
        let expected = first.dimension();
        for vector in &vectors {
            vector.ensure_dimension(expected)?;
        }
        Ok(Self(vectors))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.0.first().map(Embedding::dimension).unwrap_or(0)
    }

    pub fn vectors(&self) -> &[Embedding] {
        &self.0
    }

    pub fn ensure_dimension(&self, expected: usize) -> Result<(), EmbeddingError> {
        self.0.iter().try_for_each(|v| v.ensure_dimension(expected))
    }

    /// Late-interaction score: for every query vector take the best dot product
    /// against this document's vectors, then sum.
    pub fn max_sim(&self, query: &MultiVector) -> f32 {
        query
            .0
            .iter()
            .map(|q| {
                self.0
                    .iter()
                    .map(|d| q.dot(d))
                    .fold(f32::NEG_INFINITY, f32::max)
            })
            .sum()
    }
}

impl TryFrom<Vec<Embedding>> for MultiVector {
    type Error = EmbeddingError;

    fn try_from(vectors: Vec<Embedding>) -> Result<Self, Self::Error> {
        MultiVector::new(vectors)
    }
}

impl From<MultiVector> for Vec<Embedding> {
    fn from(multi: MultiVector) -> Self {
        multi.0
    }
}

/// Partial update of the two embedding columns. `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EmbeddingUpdate {
    pub embedding: Option<Embedding>,
    pub embeddings: Option<MultiVector>,
}

impl EmbeddingUpdate {
    pub fn is_empty(&self) -> bool {
        self.embedding.is_none() && self.embeddings.is_none()
    }

    pub fn ensure_dimension(&self, expected: usize) -> Result<(), EmbeddingError> {
        if let Some(embedding) = &self.embedding {
            embedding.ensure_dimension(expected)?;
        }
        if let Some(embeddings) = &self.embeddings {
            embeddings.ensure_dimension(expected)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emb(values: &[f32]) -> Embedding {
        Embedding::new(values.to_vec()).unwrap()
    }

    #[test]
    fn test_rejects_empty_and_non_finite() {
        assert_eq!(Embedding::new(vec![]), Err(EmbeddingError::Empty));
        assert_eq!(
            Embedding::new(vec![1.0, f32::NAN]),
            Err(EmbeddingError::NonFinite(1))
        );
    }

    #[test]
    fn test_cosine_similarity() {
        let a = emb(&[1.0, 0.0]);
        let b = emb(&[0.0, 1.0]);
        let c = emb(&[2.0, 0.0]);

        assert!((a.cosine_similarity(&c) - 1.0).abs() < 1e-6);
        assert!(a.cosine_similarity(&b).abs() < 1e-6);
        assert_eq!(emb(&[0.0, 0.0]).cosine_similarity(&a), 0.0);
    }

    #[test]
    fn test_multi_vector_rejects_ragged_rows() {
        let result = MultiVector::new(vec![emb(&[1.0, 0.0]), emb(&[1.0])]);
        assert_eq!(
            result,
            Err(EmbeddingError::DimensionMismatch {
                expected: 2,
                actual: 1
            })
        );
    }

    #[test]
    fn test_max_sim_sums_best_matches() {
        let doc = MultiVector::new(vec![emb(&[1.0, 0.0]), emb(&[0.0, 2.0])]).unwrap();
        let query = MultiVector::new(vec![emb(&[1.0, 0.0]), emb(&[0.0, 1.0])]).unwrap();

        // best for q1 is 1.0, best for q2 is 2.0
        assert!((doc.max_sim(&query) - 3.0).abs() < 1e-6);
    }

    #[test]
    fn test_serde_round_trip_validates() {
        let parsed: Result<Embedding, _> = serde_json::from_str("[]");
        assert!(parsed.is_err());

        let parsed: Embedding = serde_json::from_str("[0.5, 0.25]").unwrap();
        assert_eq!(parsed.dimension(), 2);
    }

    #[test]
    fn test_update_dimension_check() {
        let update = EmbeddingUpdate {
            embedding: Some(emb(&[1.0, 2.0, 3.0])),
            embeddings: None,
        };
        assert!(update.ensure_dimension(3).is_ok());
        assert!(update.ensure_dimension(768).is_err());
        assert!(EmbeddingUpdate::default().is_empty());
    }
}
