//! Document and chunk types with source tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A Wikipedia article fetched for one of the configured topics
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Article title
    pub title: String,
    /// Topic string this article was fetched for
    pub topic: String,
    /// Plain-text article content, truncated to the configured maximum
    pub content: String,
}

impl Document {
    /// Create a new document
    pub fn new(
        title: impl Into<String>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: title.into(),
            topic: topic.into(),
            content: content.into(),
        }
    }
}

/// Where a chunk came from
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChunkSource {
    /// Source article title
    pub title: String,
    /// Topic the article was fetched for
    pub topic: String,
}

/// A bounded-size piece of a document, the unit of retrieval
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique chunk ID
    pub id: Uuid,
    /// Parent document ID
    pub document_id: Uuid,
    /// Chunk text
    pub content: String,
    /// Source metadata carried through to citations
    pub source: ChunkSource,
    /// Ordinal position within the parent document
    pub chunk_index: u32,
}

impl Chunk {
    /// Create a chunk for a document
    pub fn new(doc: &Document, content: impl Into<String>, chunk_index: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            document_id: doc.id,
            content: content.into(),
            source: ChunkSource {
                title: doc.title.clone(),
                topic: doc.topic.clone(),
            },
            chunk_index,
        }
    }
}
