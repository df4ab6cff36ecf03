//! Process-local store with the same integrity rules as the Postgres schema.
//! Backs the tests and runs without a database.

mod memory_chunk_repository;
mod memory_document_repository;
mod memory_evaluation_repository;
mod memory_query_repository;
mod memory_seed_repository;
pub mod tables;

use std::sync::Arc;

use tokio::sync::{Mutex, MutexGuard};

use crate::domain::value_objects::DEFAULT_EMBEDDING_DIMENSION;
pub use tables::Tables;

#[derive(Clone)]
pub struct InMemoryStore {
    tables: Arc<Mutex<Tables>>,
    dimension: usize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::with_dimension(DEFAULT_EMBEDDING_DIMENSION)
    }

    pub fn with_dimension(dimension: usize) -> Self {
        Self {
            tables: Arc::new(Mutex::new(Tables::default())),
            dimension,
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub(crate) async fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().await
    }
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests;
