//! Document ingestion: Wikipedia fetching and text chunking

pub mod chunker;
pub mod wikipedia;

pub use chunker::RecursiveChunker;
pub use wikipedia::{DocumentSource, WikipediaLoader};
