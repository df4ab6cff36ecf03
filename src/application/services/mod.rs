pub mod evaluation_service;
pub mod search_service;
pub mod statistics_service;

pub use evaluation_service::{EvaluationService, RetrievalCheck};
pub use search_service::{SearchMatch, SearchScope, SearchService};
pub use statistics_service::{DatasetStatistics, StatisticsService};
