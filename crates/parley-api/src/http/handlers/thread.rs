//! Read-only thread endpoints.
//!
//! - GET /api/v1/threads      - summaries, most recently updated first
//! - GET /api/v1/threads/{id} - full session state

use std::time::Instant;

use axum::extract::{Path, State};

use parley_types::session::{SessionState, ThreadSummary};

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// GET /api/v1/threads
pub async fn list_threads(
    State(state): State<AppState>,
) -> Result<ApiResponse<Vec<ThreadSummary>>, AppError> {
    let start = Instant::now();
    let threads = state.chat.threads().await?;
    Ok(ApiResponse::success(threads, start))
}

/// GET /api/v1/threads/{id}
pub async fn get_thread(
    State(state): State<AppState>,
    Path(thread_id): Path<String>,
) -> Result<ApiResponse<SessionState>, AppError> {
    let start = Instant::now();
    let session = state
        .chat
        .history(&thread_id)
        .await?
        .ok_or(AppError::ThreadNotFound(thread_id))?;
    Ok(ApiResponse::success(session, start))
}
