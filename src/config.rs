//! Configuration for the RAG service

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{Error, Result};

/// Main RAG service configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RagConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,
    /// Document ingestion configuration
    #[serde(default)]
    pub ingestion: IngestionConfig,
    /// Chunking configuration
    #[serde(default)]
    pub chunking: ChunkingConfig,
    /// Model endpoint configuration
    #[serde(default)]
    pub models: ModelConfig,
    /// Retrieval configuration
    #[serde(default)]
    pub retrieval: RetrievalConfig,
    /// Vector index configuration
    #[serde(default)]
    pub index: IndexConfig,
}

impl RagConfig {
    /// Build configuration from the environment.
    ///
    /// Only overrides defaults for variables that are set; a missing API key
    /// is not an error here -- it surfaces later as a pipeline construction
    /// failure so the UI can show a disabled state instead of the process
    /// crashing.
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(model) = std::env::var("CHAT_MODEL") {
            config.models.chat_model = model;
        }
        if let Ok(model) = std::env::var("EMBEDDING_MODEL") {
            config.models.embedding_model = model;
        }
        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            config.models.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("OPENAI_BASE_URL") {
            config.models.base_url = url;
        }
        if let Ok(dir) = std::env::var("KOP_RAG_PERSIST_DIR") {
            config.index.persist_dir = Some(PathBuf::from(dir));
        }
        if let Ok(host) = std::env::var("KOP_RAG_HOST") {
            config.server.host = host;
        }
        if let Ok(port) = std::env::var("KOP_RAG_PORT") {
            if let Ok(port) = port.parse() {
                config.server.port = port;
            }
        }

        config
    }

    /// Validate cross-field invariants
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(Error::config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        if self.ingestion.topics.is_empty() {
            return Err(Error::config("at least one topic must be configured"));
        }
        if self.retrieval.top_k > self.retrieval.fetch_k {
            return Err(Error::config(format!(
                "top_k ({}) must not exceed fetch_k ({})",
                self.retrieval.top_k, self.retrieval.fetch_k
            )));
        }
        Ok(())
    }
}

/// Server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Host address
    pub host: String,
    /// Port number
    pub port: u16,
    /// Enable CORS
    pub enable_cors: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            enable_cors: true,
        }
    }
}

/// Document ingestion configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestionConfig {
    /// Topics to fetch articles for
    pub topics: Vec<String>,
    /// Maximum articles per topic
    pub max_docs_per_topic: usize,
    /// Maximum characters kept per article
    pub max_chars_per_doc: usize,
    /// MediaWiki API endpoint
    pub wikipedia_api_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for IngestionConfig {
    fn default() -> Self {
        Self {
            topics: vec![
                "Liverpool F.C.".to_string(),
                "Liverpool F.C. players".to_string(),
                "Liverpool F.C. history".to_string(),
            ],
            max_docs_per_topic: 2,
            max_chars_per_doc: 3000,
            wikipedia_api_url: "https://en.wikipedia.org/w/api.php".to_string(),
            timeout_secs: 30,
        }
    }
}

/// Text chunking configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target chunk size in characters
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters
    pub chunk_overlap: usize,
    /// Split separators in priority order; the empty string means
    /// per-character splitting and must come last
    pub separators: Vec<String>,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
            separators: vec![
                "\n\n".to_string(),
                "\n".to_string(),
                ". ".to_string(),
                " ".to_string(),
                String::new(),
            ],
        }
    }
}

/// Model endpoint configuration (OpenAI-compatible)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Base URL of the OpenAI-compatible API
    pub base_url: String,
    /// API key; required to reach the hosted endpoints
    pub api_key: Option<String>,
    /// Chat completion model
    pub chat_model: String,
    /// Embedding model
    pub embedding_model: String,
    /// Generation temperature; 0 biases toward deterministic, factual output
    pub temperature: f32,
    /// Request timeout in seconds
    pub timeout_secs: u64,
    /// Embedding batch size
    pub embed_batch_size: usize,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.openai.com/v1".to_string(),
            api_key: None,
            chat_model: "gpt-4o-mini".to_string(),
            embedding_model: "text-embedding-3-small".to_string(),
            temperature: 0.0,
            timeout_secs: 120,
            embed_batch_size: 64,
        }
    }
}

/// Retrieval configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    /// Number of chunks handed to the prompt
    pub top_k: usize,
    /// Number of nearest neighbors considered before MMR reranking
    pub fetch_k: usize,
    /// MMR trade-off in [0,1]: 1.0 = pure relevance, 0.0 = pure diversity
    pub diversity: f32,
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            fetch_k: 20,
            diversity: 0.5,
        }
    }
}

/// Vector index configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Directory for the index snapshot; None keeps the index in memory only
    #[serde(default)]
    pub persist_dir: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_ingestion_parameters() {
        let config = RagConfig::default();
        assert_eq!(config.chunking.chunk_size, 1000);
        assert_eq!(config.chunking.chunk_overlap, 200);
        assert_eq!(config.retrieval.top_k, 5);
        assert_eq!(config.retrieval.fetch_k, 20);
        assert_eq!(config.models.temperature, 0.0);
        assert_eq!(config.ingestion.topics.len(), 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_overlap_not_smaller_than_size() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(config.validate(), Err(Error::Config(_))));
    }

    #[test]
    fn rejects_empty_topic_list() {
        let mut config = RagConfig::default();
        config.ingestion.topics.clear();
        assert!(config.validate().is_err());
    }
}
