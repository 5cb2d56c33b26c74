use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lifequest_core::Quest;
use lifequest_core::error::ApiError;
use lifequest_core::ledger::QuizAnswer;
use lifequest_core::session::CompletionResult;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{session_id}/quests", get(list_quests))
        .route(
            "/v1/sessions/{session_id}/quests/{quest_id}/complete",
            post(complete_quest),
        )
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestListResponse {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_id: Option<String>,
    pub quests: Vec<QuestView>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct QuestView {
    #[serde(flatten)]
    pub quest: Quest,
    pub completed: bool,
}

#[derive(Deserialize, Default, utoipa::ToSchema)]
pub struct CompleteQuestRequest {
    /// One answer per quiz question: option text or option index
    #[serde(default)]
    pub answers: Option<Vec<QuizAnswer>>,
}

/// Active quest batch for the current goal
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}/quests",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Active quests", body = QuestListResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "quests"
)]
pub async fn list_quests(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<QuestListResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let session = session.lock().await;
    let quests = session
        .active_quests()
        .iter()
        .map(|quest| QuestView {
            completed: session.ledger().is_completed(&quest.id),
            quest: quest.clone(),
        })
        .collect();
    Ok(Json(QuestListResponse {
        goal_id: session.ledger().current_goal_id().map(str::to_string),
        quests,
    }))
}

/// Complete a quest from the active batch
///
/// Quiz quests need `answers`; wrong answers return per-question feedback
/// with `status = quiz_failed` and record nothing.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/quests/{quest_id}/complete",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
        ("quest_id" = String, Path, description = "Quest id from the active batch")
    ),
    request_body = CompleteQuestRequest,
    responses(
        (status = 200, description = "Completion or quiz feedback", body = CompletionResult),
        (status = 404, description = "Unknown session or quest", body = ApiError),
        (status = 409, description = "Already completed or outside the active goal", body = ApiError)
    ),
    tag = "quests"
)]
pub async fn complete_quest(
    State(state): State<AppState>,
    Path((session_id, quest_id)): Path<(Uuid, String)>,
    AppJson(req): AppJson<CompleteQuestRequest>,
) -> Result<Json<CompletionResult>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    let result = session
        .complete_quest(&quest_id, req.answers.as_deref())
        .await?;
    Ok(Json(result))
}
