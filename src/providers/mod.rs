//! Provider abstractions for embeddings and chat completion
//!
//! Trait seams keep the pipeline testable with local mocks while production
//! runs against an OpenAI-compatible endpoint.

pub mod chat;
pub mod embedding;
pub mod openai;

pub use chat::ChatProvider;
pub use embedding::EmbeddingProvider;
pub use openai::OpenAiClient;
