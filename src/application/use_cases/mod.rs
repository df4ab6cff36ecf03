pub mod attach_embeddings;
pub mod browse_documents;
pub mod create_query;
pub mod delete_document;
pub mod delete_query;
pub mod ingest_document;
pub mod list_queries;
pub mod seed_dataset;

pub use attach_embeddings::{AttachEmbeddingsUseCase, EmbeddingTarget};
pub use browse_documents::{BrowseDocumentsUseCase, DocumentOverview, PageView};
pub use create_query::{CreateQueryRequest, CreateQueryUseCase};
pub use delete_document::DeleteDocumentUseCase;
pub use delete_query::DeleteQueryUseCase;
pub use ingest_document::{IngestDocumentRequest, IngestDocumentUseCase};
pub use list_queries::{ListQueriesRequest, ListQueriesUseCase};
pub use seed_dataset::SeedDatasetUseCase;
