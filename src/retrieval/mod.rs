//! Vector index and diversity-aware similarity search

pub mod index;

pub use index::{IndexEntry, SearchResult, VectorIndex};
