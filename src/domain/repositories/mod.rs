pub mod chunk_repository;
pub mod document_repository;
pub mod error;
pub mod evaluation_repository;
pub mod query_repository;
pub mod seed_repository;

pub use chunk_repository::{ChunkRepository, SimilarityHit, SimilarityQuery, rank_hits};
pub use document_repository::{
    DocumentDeletion, DocumentRepository, IngestedDocument, IngestionBatch, PageUpload,
};
pub use error::{ConstraintViolation, RepositoryError};
pub use evaluation_repository::EvaluationRepository;
pub use query_repository::QueryRepository;
pub use seed_repository::SeedRepository;
