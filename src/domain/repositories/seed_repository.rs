use async_trait::async_trait;

use super::RepositoryError;
use crate::domain::seed::{SeedData, SeedReport, SequenceState};

#[async_trait]
pub trait SeedRepository: Send + Sync {
    /// Inserts every seed row with its explicit key. Rows whose key already
    /// exists are skipped; any other constraint violation aborts the load.
    async fn load_seed(&self, seed: &SeedData) -> Result<SeedReport, RepositoryError>;

    /// Moves every identity counter past the largest id present.
    async fn advance_sequences(&self) -> Result<Vec<SequenceState>, RepositoryError>;
}
