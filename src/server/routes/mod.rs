//! API routes for the RAG server

pub mod query;
pub mod status;

use axum::{
    routing::{get, post},
    Router,
};

use crate::server::state::AppState;

/// Build all API routes
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/query", post(query::query_rag))
        .route("/status", get(status::status))
}
