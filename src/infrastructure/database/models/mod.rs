pub mod chunk_model;
pub mod document_model;
pub mod evaluation_model;
pub mod query_model;

pub use chunk_model::*;
pub use document_model::*;
pub use evaluation_model::*;
pub use query_model::*;
