pub mod application;
pub mod config;
pub mod domain;
pub mod infrastructure;

pub use config::StoreConfig;
pub use infrastructure::AppContainer;
