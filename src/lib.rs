//! kop-rag: Wikipedia-backed RAG question answering
//!
//! This crate loads a fixed set of Wikipedia articles about a football club,
//! splits them into overlapping chunks, embeds each chunk through an
//! OpenAI-compatible embeddings endpoint, and answers free-text questions by
//! retrieving diverse relevant chunks (MMR) and forwarding them to a chat
//! completion call. A single-binary axum server exposes the query API and an
//! embedded web UI.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::RagPipeline;
pub use types::{
    document::{Chunk, ChunkSource, Document},
    query::QueryRequest,
    response::{QueryResponse, SourceRef, StatusResponse},
};
