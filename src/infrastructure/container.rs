use std::sync::Arc;

use crate::{
    application::{
        ports::FileStorage,
        services::{EvaluationService, SearchService, StatisticsService},
        use_cases::{
            AttachEmbeddingsUseCase, BrowseDocumentsUseCase, CreateQueryUseCase,
            DeleteDocumentUseCase, DeleteQueryUseCase, IngestDocumentUseCase, ListQueriesUseCase,
            SeedDatasetUseCase,
        },
    },
    config::StoreConfig,
    domain::repositories::{
        ChunkRepository, DocumentRepository, EvaluationRepository, QueryRepository, SeedRepository,
    },
    infrastructure::{
        database::{
            VectorSupport, create_connection_pool, get_database_connection,
            repositories::{
                PostgresChunkRepository, PostgresDocumentRepository, PostgresEvaluationRepository,
                PostgresQueryRepository, PostgresSeedRepository,
            },
            setup_schema,
        },
        file_system::LocalFileStorage,
        memory::InMemoryStore,
    },
};

/// The storage backend behind every repository trait.
pub struct Repositories {
    pub documents: Arc<dyn DocumentRepository>,
    pub chunks: Arc<dyn ChunkRepository>,
    pub queries: Arc<dyn QueryRepository>,
    pub evaluations: Arc<dyn EvaluationRepository>,
    pub seeds: Arc<dyn SeedRepository>,
}

impl Repositories {
    pub fn in_memory(store: InMemoryStore) -> Self {
        let store = Arc::new(store);
        Self {
            documents: store.clone(),
            chunks: store.clone(),
            queries: store.clone(),
            evaluations: store.clone(),
            seeds: store,
        }
    }
}

pub struct AppContainer {
    pub vector_support: VectorSupport,

    // Repositories
    pub document_repository: Arc<dyn DocumentRepository>,
    pub chunk_repository: Arc<dyn ChunkRepository>,
    pub query_repository: Arc<dyn QueryRepository>,
    pub evaluation_repository: Arc<dyn EvaluationRepository>,
    pub seed_repository: Arc<dyn SeedRepository>,

    pub file_storage: Arc<dyn FileStorage>,

    // Application Services
    pub statistics_service: Arc<StatisticsService>,
    pub search_service: Arc<SearchService>,
    pub evaluation_service: Arc<EvaluationService>,

    // Use Cases
    pub ingest_document_use_case: Arc<IngestDocumentUseCase>,
    pub create_query_use_case: Arc<CreateQueryUseCase>,
    pub delete_document_use_case: Arc<DeleteDocumentUseCase>,
    pub delete_query_use_case: Arc<DeleteQueryUseCase>,
    pub list_queries_use_case: Arc<ListQueriesUseCase>,
    pub browse_documents_use_case: Arc<BrowseDocumentsUseCase>,
    pub attach_embeddings_use_case: Arc<AttachEmbeddingsUseCase>,
    pub seed_dataset_use_case: Arc<SeedDatasetUseCase>,
}

impl AppContainer {
    /// Connects to Postgres, creates the schema and wires the Postgres repositories.
    pub async fn new(config: &StoreConfig) -> Result<Self, Box<dyn std::error::Error>> {
        // Create schema before handing out pooled connections
        let mut conn = get_database_connection(config)
            .map_err(|e| format!("Failed to create database connection: {}", e))?;
        let vector_support = setup_schema(&mut conn, config.embedding_dimension)
            .map_err(|e| format!("Failed to create database schema: {}", e))?;

        let db_pool = create_connection_pool(config)?;
        let dimension = config.embedding_dimension;

        // Create repositories
        let repositories = Repositories {
            documents: Arc::new(PostgresDocumentRepository::new(db_pool.clone())),
            chunks: Arc::new(PostgresChunkRepository::new(
                db_pool.clone(),
                vector_support,
                dimension,
            )),
            queries: Arc::new(PostgresQueryRepository::new(
                db_pool.clone(),
                vector_support,
                dimension,
            )),
            evaluations: Arc::new(PostgresEvaluationRepository::new(db_pool.clone())),
            seeds: Arc::new(PostgresSeedRepository::new(db_pool, vector_support, dimension)),
        };

        Ok(Self::assemble(config, repositories, vector_support))
    }

    /// Same wiring over the process-local store; no database required.
    pub fn in_memory(config: &StoreConfig) -> Self {
        let store = InMemoryStore::with_dimension(config.embedding_dimension);
        Self::assemble(config, Repositories::in_memory(store), VectorSupport::PgVector)
    }

    fn assemble(
        config: &StoreConfig,
        repositories: Repositories,
        vector_support: VectorSupport,
    ) -> Self {
        let Repositories {
            documents: document_repository,
            chunks: chunk_repository,
            queries: query_repository,
            evaluations: evaluation_repository,
            seeds: seed_repository,
        } = repositories;

        let file_storage: Arc<dyn FileStorage> =
            Arc::new(LocalFileStorage::new(config.pdf_storage_path.clone()));

        // Create application services
        let statistics_service = Arc::new(StatisticsService::new(
            document_repository.clone(),
            chunk_repository.clone(),
            query_repository.clone(),
        ));
        let search_service = Arc::new(SearchService::new(chunk_repository.clone()));
        let evaluation_service = Arc::new(EvaluationService::new(
            query_repository.clone(),
            evaluation_repository.clone(),
        ));

        // Create use cases
        let ingest_document_use_case = Arc::new(IngestDocumentUseCase::new(
            document_repository.clone(),
            file_storage.clone(),
        ));
        let create_query_use_case = Arc::new(CreateQueryUseCase::new(query_repository.clone()));
        let delete_document_use_case = Arc::new(DeleteDocumentUseCase::new(
            document_repository.clone(),
            file_storage.clone(),
        ));
        let delete_query_use_case = Arc::new(DeleteQueryUseCase::new(query_repository.clone()));
        let list_queries_use_case = Arc::new(ListQueriesUseCase::new(query_repository.clone()));
        let browse_documents_use_case = Arc::new(BrowseDocumentsUseCase::new(
            document_repository.clone(),
            chunk_repository.clone(),
        ));
        let attach_embeddings_use_case = Arc::new(AttachEmbeddingsUseCase::new(
            chunk_repository.clone(),
            query_repository.clone(),
        ));
        let seed_dataset_use_case = Arc::new(SeedDatasetUseCase::new(seed_repository.clone()));

        Self {
            vector_support,
            document_repository,
            chunk_repository,
            query_repository,
            evaluation_repository,
            seed_repository,
            file_storage,
            statistics_service,
            search_service,
            evaluation_service,
            ingest_document_use_case,
            create_query_use_case,
            delete_document_use_case,
            delete_query_use_case,
            list_queries_use_case,
            browse_documents_use_case,
            attach_embeddings_use_case,
            seed_dataset_use_case,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::use_cases::ListQueriesRequest;

    #[tokio::test]
    async fn test_in_memory_container_shares_one_store() {
        let container = AppContainer::in_memory(&StoreConfig::default());

        container.seed_dataset_use_case.execute_bundled().await.unwrap();

        let stats = container.statistics_service.collect().await.unwrap();
        assert_eq!(stats.documents, 5);

        let listing = container
            .list_queries_use_case
            .execute(ListQueriesRequest { skip: 0, limit: 10 })
            .await
            .unwrap();
        assert_eq!(listing.total_count, 4);
    }
}
