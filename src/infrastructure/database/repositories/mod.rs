pub mod postgres_chunk_repository;
pub mod postgres_document_repository;
pub mod postgres_evaluation_repository;
pub mod postgres_query_repository;
pub mod postgres_seed_repository;
mod vector_columns;

pub use postgres_chunk_repository::PostgresChunkRepository;
pub use postgres_document_repository::PostgresDocumentRepository;
pub use postgres_evaluation_repository::PostgresEvaluationRepository;
pub use postgres_query_repository::PostgresQueryRepository;
pub use postgres_seed_repository::PostgresSeedRepository;
