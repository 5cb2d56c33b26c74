use axum::extract::{Path, State};
use axum::routing::post;
use axum::{Json, Router};
use serde::Deserialize;
use uuid::Uuid;

use lifequest_core::error::ApiError;
use lifequest_core::nudge::{CoachAnswer, NextBestAction};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{session_id}/nudge", post(next_best_action))
        .route("/v1/sessions/{session_id}/coach", post(ask_coach))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CoachQuestion {
    pub question: String,
}

/// Personalised next-best-action nudge
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/nudge",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Suggested next step", body = NextBestAction),
        (status = 404, description = "Unknown session", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "coach"
)]
pub async fn next_best_action(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<NextBestAction>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let session = session.lock().await;
    Ok(Json(session.next_best_action().await))
}

/// Ask the financial coach a free-form question
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/coach",
    params(("session_id" = Uuid, Path, description = "Session id")),
    request_body = CoachQuestion,
    responses(
        (status = 200, description = "Coach answer", body = CoachAnswer),
        (status = 400, description = "Empty question", body = ApiError),
        (status = 404, description = "Unknown session", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "coach"
)]
pub async fn ask_coach(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<CoachQuestion>,
) -> Result<Json<CoachAnswer>, AppError> {
    if req.question.trim().is_empty() {
        return Err(AppError::Validation {
            message: "question must not be empty".to_string(),
            field: Some("question".to_string()),
            received: Some(serde_json::Value::String(req.question)),
            docs_hint: None,
        });
    }
    let session = state.sessions.get(session_id).await?;
    let session = session.lock().await;
    Ok(Json(session.ask_coach(&req.question).await))
}
