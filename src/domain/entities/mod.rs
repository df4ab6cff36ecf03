pub mod caption;
pub mod chunk;
pub mod document;
pub mod evaluation;
pub mod file;
pub mod image_chunk;
pub mod page;
pub mod query;
pub mod retrieval_relation;

pub use caption::{Caption, CaptionChunkRelation, NewCaption};
pub use chunk::{Chunk, NewChunk};
pub use document::{Document, NewDocument, title_from_filename};
pub use evaluation::{
    EvaluationResult, ExecutorResult, Metric, NewMetric, NewPipeline, Pipeline, RetrievedResult,
    Summary,
};
pub use file::{File, NewFile};
pub use image_chunk::{ImageChunk, NewImageChunk};
pub use page::{NewPage, Page};
pub use query::{NewQuery, Query};
pub use retrieval_relation::RetrievalRelation;
