pub mod chunk_ref;
pub mod embedding;
pub mod ground_truth;
pub mod kinds;

pub use chunk_ref::ChunkRef;
pub use embedding::{
    DEFAULT_EMBEDDING_DIMENSION, Embedding, EmbeddingError, EmbeddingUpdate, MultiVector,
};
pub use ground_truth::{
    EvidenceGroup, GroundTruthError, GroundTruthShape, RelationKind, RetrievalGroundTruth,
};
pub use kinds::{FileType, MetricType};
