pub mod container;
pub mod database;
pub mod file_system;
pub mod memory;

// Re-export commonly used items
pub use container::AppContainer;
pub use database::{DbPool, VectorSupport, create_connection_pool};
pub use file_system::LocalFileStorage;
pub use memory::InMemoryStore;
