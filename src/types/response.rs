//! Response types for the query and status endpoints

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A source article referenced by an answer
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SourceRef {
    /// Article title
    pub title: String,
    /// Topic the article was fetched for
    pub topic: String,
}

/// Answer to a query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryResponse {
    /// Generated answer text
    pub answer: String,
    /// Distinct source articles behind the retrieved chunks
    pub sources: Vec<SourceRef>,
    /// Number of chunks retrieved for the prompt
    pub chunks_retrieved: usize,
    /// Wall-clock processing time
    pub processing_time_ms: u64,
}

/// Service status reported to the UI
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusResponse {
    /// Whether the pipeline built successfully and queries are accepted
    pub ready: bool,
    /// Number of chunks in the vector index (0 when not ready)
    pub chunk_count: usize,
    /// Construction failure message when not ready
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Chat model in use
    pub chat_model: String,
    /// Embedding model in use
    pub embedding_model: String,
    /// When the pipeline finished (or failed) construction
    pub initialized_at: DateTime<Utc>,
}
