use axum::extract::{Path, State};
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use lifequest_core::error::ApiError;

use crate::error::AppError;
use crate::leaderboard::{LeaderboardEntry, rank};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/sessions/{session_id}/leaderboard", get(get_leaderboard))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct LeaderboardResponse {
    pub entries: Vec<LeaderboardEntry>,
}

/// Leaderboard with the session's persona ranked among rivals
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}/leaderboard",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Ranked entries", body = LeaderboardResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_leaderboard(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<LeaderboardResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let (name, points) = {
        let session = session.lock().await;
        (session.persona().name.clone(), session.ledger().total_points())
    };
    Ok(Json(LeaderboardResponse {
        entries: rank(&name, points, state.rivals.rivals()),
    }))
}
