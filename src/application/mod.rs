pub mod ports;
pub mod services;
pub mod use_cases;

// Re-export commonly used items
pub use services::*;
pub use use_cases::*;
