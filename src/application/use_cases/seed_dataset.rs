use std::sync::Arc;

use thiserror::Error;

use crate::domain::repositories::{RepositoryError, SeedRepository};
use crate::domain::seed::{SeedData, SeedReport, SequenceState};

#[derive(Debug, Error)]
pub enum SeedDatasetError {
    #[error("Invalid seed data: {0}")]
    InvalidSeed(String),
    #[error("Repository error: {0}")]
    RepositoryError(String),
}

impl From<RepositoryError> for SeedDatasetError {
    fn from(error: RepositoryError) -> Self {
        SeedDatasetError::RepositoryError(error.to_string())
    }
}

impl From<serde_json::Error> for SeedDatasetError {
    fn from(error: serde_json::Error) -> Self {
        SeedDatasetError::InvalidSeed(error.to_string())
    }
}

#[derive(Debug, Clone)]
pub struct SeedDatasetResponse {
    pub report: SeedReport,
    pub sequences: Vec<SequenceState>,
}

/// Loads a seed dataset and then moves every id counter past it, so the next
/// generated key never collides with a seeded one.
pub struct SeedDatasetUseCase {
    seed_repository: Arc<dyn SeedRepository>,
}

impl SeedDatasetUseCase {
    pub fn new(seed_repository: Arc<dyn SeedRepository>) -> Self {
        Self { seed_repository }
    }

    pub async fn execute(&self, seed: &SeedData) -> Result<SeedDatasetResponse, SeedDatasetError> {
        let report = self.seed_repository.load_seed(seed).await?;
        let sequences = self.seed_repository.advance_sequences().await?;

        Ok(SeedDatasetResponse { report, sequences })
    }

    pub async fn execute_bundled(&self) -> Result<SeedDatasetResponse, SeedDatasetError> {
        let seed = SeedData::bundled()?;
        self.execute(&seed).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::NewFile;
    use crate::domain::repositories::DocumentRepository;
    use crate::infrastructure::memory::InMemoryStore;

    #[tokio::test]
    async fn test_bundled_seed_then_new_ids_follow() {
        let store = Arc::new(InMemoryStore::new());
        let use_case = SeedDatasetUseCase::new(store.clone());

        let first = use_case.execute_bundled().await.unwrap();
        let file_sequence = first
            .sequences
            .iter()
            .find(|s| s.table == "file")
            .unwrap();
        assert_eq!(file_sequence.last_value, 10);

        let second = use_case.execute_bundled().await.unwrap();
        assert_eq!(second.report.total_inserted(), 0);

        let file = store.create_file(NewFile::raw("/data/pdfs/new.pdf")).await.unwrap();
        assert_eq!(file.id, 11);
    }

    #[tokio::test]
    async fn test_invalid_seed_json() {
        let store = Arc::new(InMemoryStore::new());
        let use_case = SeedDatasetUseCase::new(store);

        let error = SeedData::from_json("{\"files\": 3}").map_err(SeedDatasetError::from);
        assert!(matches!(error, Err(SeedDatasetError::InvalidSeed(_))));
        assert!(use_case.execute(&SeedData::default()).await.is_ok());
    }
}
