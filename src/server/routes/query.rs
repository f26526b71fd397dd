//! Query endpoint

use axum::{extract::State, Json};

use crate::error::Result;
use crate::server::state::AppState;
use crate::types::{query::QueryRequest, response::QueryResponse};

/// POST /api/query - answer a question through the RAG pipeline
pub async fn query_rag(
    State(state): State<AppState>,
    Json(request): Json<QueryRequest>,
) -> Result<Json<QueryResponse>> {
    let pipeline = state.pipeline()?;

    tracing::info!("Query: \"{}\"", request.question.trim());
    let response = pipeline.answer(&request.question).await?;
    tracing::info!(
        "Answered in {}ms using {} chunks",
        response.processing_time_ms,
        response.chunks_retrieved
    );

    Ok(Json(response))
}
