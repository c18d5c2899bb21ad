//! Axum route handlers for the Analysis API.

use axum::{extract::State, Json};

use crate::analysis::models::{AnalyzeRequest, AnalyzeResponse};
use crate::analysis::service::{list_analyses, run_analysis};
use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::state::AppState;

/// POST /api/analyses
///
/// Scores the caller's CV against a job description and stores the report.
/// Model commentary is best effort; the scores are always the engine's.
pub async fn handle_analyze(
    State(state): State<AppState>,
    user: AuthUser,
    Json(request): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let response = run_analysis(&state.db, &state.llm, user.user_id, request).await?;
    Ok(Json(response))
}

/// GET /api/analyses
pub async fn handle_history(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<AnalyzeResponse>>, AppError> {
    Ok(Json(list_analyses(&state.db, user.user_id).await?))
}
