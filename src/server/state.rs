//! Application state for the RAG server

use chrono::{DateTime, Utc};
use std::sync::Arc;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::ingestion::WikipediaLoader;
use crate::pipeline::RagPipeline;
use crate::providers::{ChatProvider, EmbeddingProvider, OpenAiClient};
use crate::types::response::StatusResponse;

/// Outcome of the one-time pipeline construction.
///
/// The explicit construct-once guard: built before the listener starts and
/// never replaced, so every interaction sees the same pipeline (or the same
/// failure message) for the process lifetime.
pub enum PipelineState {
    /// Pipeline built successfully and queries are accepted
    Ready { pipeline: RagPipeline },
    /// Construction failed; querying is disabled
    Failed { message: String },
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: RagConfig,
    pipeline: PipelineState,
    initialized_at: DateTime<Utc>,
}

impl AppState {
    /// Build the pipeline once and capture the outcome.
    ///
    /// Construction failures (missing credentials, total ingestion failure,
    /// embedding errors) end up as a `Failed` state the UI can display; they
    /// never crash the process.
    pub async fn initialize(config: RagConfig) -> Self {
        let outcome = Self::build_pipeline(&config).await;

        let pipeline = match outcome {
            Ok(pipeline) => {
                tracing::info!("Pipeline ready with {} indexed chunks", pipeline.chunk_count());
                PipelineState::Ready { pipeline }
            }
            Err(e) => {
                tracing::error!("Pipeline construction failed: {}", e);
                PipelineState::Failed {
                    message: e.to_string(),
                }
            }
        };

        Self::from_state(config, pipeline)
    }

    /// Assemble state from an already-determined pipeline outcome.
    ///
    /// Used by tests to inject mock-built pipelines or forced failures.
    pub fn from_state(config: RagConfig, pipeline: PipelineState) -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                config,
                pipeline,
                initialized_at: Utc::now(),
            }),
        }
    }

    async fn build_pipeline(config: &RagConfig) -> Result<RagPipeline> {
        let client = Arc::new(OpenAiClient::new(&config.models)?);
        let source = WikipediaLoader::new(&config.ingestion)?;

        RagPipeline::build(
            config,
            &source,
            client.clone() as Arc<dyn EmbeddingProvider>,
            client as Arc<dyn ChatProvider>,
        )
        .await
    }

    /// Get the pipeline, or the stored construction failure
    pub fn pipeline(&self) -> Result<&RagPipeline> {
        match &self.inner.pipeline {
            PipelineState::Ready { pipeline } => Ok(pipeline),
            PipelineState::Failed { message } => {
                Err(Error::PipelineUnavailable(message.clone()))
            }
        }
    }

    /// Whether queries can be served
    pub fn is_ready(&self) -> bool {
        matches!(self.inner.pipeline, PipelineState::Ready { .. })
    }

    /// Status snapshot for the UI
    pub fn status(&self) -> StatusResponse {
        let (ready, chunk_count, error) = match &self.inner.pipeline {
            PipelineState::Ready { pipeline } => (true, pipeline.chunk_count(), None),
            PipelineState::Failed { message } => (false, 0, Some(message.clone())),
        };

        StatusResponse {
            ready,
            chunk_count,
            error,
            chat_model: self.inner.config.models.chat_model.clone(),
            embedding_model: self.inner.config.models.embedding_model.clone(),
            initialized_at: self.inner.initialized_at,
        }
    }

    /// Server configuration
    pub fn config(&self) -> &RagConfig {
        &self.inner.config
    }
}
