//! Status endpoint backing the UI's system panel

use axum::{extract::State, Json};

use crate::server::state::AppState;
use crate::types::response::StatusResponse;

/// GET /api/status - readiness, indexed chunk count, and model names
pub async fn status(State(state): State<AppState>) -> Json<StatusResponse> {
    Json(state.status())
}
