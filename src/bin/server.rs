//! RAG server binary
//!
//! Run with: cargo run --bin kop-rag-server

use kop_rag::{config::RagConfig, server::RagServer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env is optional; real environment variables win
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "kop_rag=info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = RagConfig::from_env();

    tracing::info!("Configuration loaded");
    tracing::info!("  - Chat model: {}", config.models.chat_model);
    tracing::info!("  - Embedding model: {}", config.models.embedding_model);
    tracing::info!("  - Topics: {:?}", config.ingestion.topics);
    tracing::info!("  - Chunk size: {}", config.chunking.chunk_size);
    if let Some(dir) = &config.index.persist_dir {
        tracing::info!("  - Index snapshot dir: {}", dir.display());
    }

    tracing::info!("Building RAG pipeline (fetch + chunk + embed)...");
    let server = RagServer::new(config).await;

    println!("\nServer starting...");
    println!("  UI:     http://{}/", server.address());
    println!("  Health: http://{}/health", server.address());
    println!("\nEndpoints:");
    println!("  POST /api/query  - Ask questions");
    println!("  GET  /api/status - Pipeline status");
    println!("\nPress Ctrl+C to stop\n");

    server.start().await?;

    Ok(())
}
