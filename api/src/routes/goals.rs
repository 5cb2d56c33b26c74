use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use uuid::Uuid;

use lifequest_core::Goal;
use lifequest_core::catalog::popularity_percentage;
use lifequest_core::error::ApiError;
use lifequest_core::sequencer::QuestBatch;

use crate::error::AppError;
use crate::state::AppState;

/// Routes that call the generative service.
pub fn generation_router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{session_id}/goals", post(build_goals))
        .route(
            "/v1/sessions/{session_id}/goals/{goal_id}/quests",
            post(generate_quests),
        )
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions/{session_id}/goals", get(list_goals))
        .route(
            "/v1/sessions/{session_id}/goals/{goal_id}/select",
            post(select_goal),
        )
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GoalView {
    #[serde(flatten)]
    pub goal: Goal,
    /// Share of similar-age users pursuing this category
    pub popularity_percentage: u8,
    pub selected: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct GoalCatalogResponse {
    pub goals: Vec<GoalView>,
    /// True when defaults replaced generated goals
    pub fallback: bool,
    /// True when the active goal vanished from the rebuilt catalog
    pub goal_cleared: bool,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct SelectGoalResponse {
    pub goal: Goal,
    /// Quests completed for this goal so far; drives the next stage
    pub completed_for_goal: usize,
}

fn goal_views(goals: &[Goal], age: u32, current: Option<&str>) -> Vec<GoalView> {
    goals
        .iter()
        .map(|goal| GoalView {
            popularity_percentage: popularity_percentage(&goal.category, age),
            selected: current == Some(goal.id.as_str()),
            goal: goal.clone(),
        })
        .collect()
}

/// Build (or rebuild) the goal catalog
///
/// Health coverage is always first. When the generative service is
/// unavailable the deterministic default catalog is returned.
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/goals",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Goal catalog", body = GoalCatalogResponse),
        (status = 404, description = "Unknown session", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "goals"
)]
pub async fn build_goals(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GoalCatalogResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    let view = session.build_catalog().await;

    Ok(Json(GoalCatalogResponse {
        goals: goal_views(
            &view.goals,
            session.persona().age,
            session.ledger().current_goal_id(),
        ),
        fallback: view.fallback,
        goal_cleared: view.goal_cleared,
    }))
}

/// Current goal catalog
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}/goals",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Goal catalog (empty until built)", body = GoalCatalogResponse),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "goals"
)]
pub async fn list_goals(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<GoalCatalogResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let session = session.lock().await;
    Ok(Json(GoalCatalogResponse {
        goals: goal_views(
            session.goals(),
            session.persona().age,
            session.ledger().current_goal_id(),
        ),
        fallback: false,
        goal_cleared: false,
    }))
}

/// Make a goal active; the current quest batch is discarded
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/goals/{goal_id}/select",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
        ("goal_id" = String, Path, description = "Goal id from the catalog")
    ),
    responses(
        (status = 200, description = "Goal selected", body = SelectGoalResponse),
        (status = 404, description = "Unknown session or goal", body = ApiError)
    ),
    tag = "goals"
)]
pub async fn select_goal(
    State(state): State<AppState>,
    Path((session_id, goal_id)): Path<(Uuid, String)>,
) -> Result<Json<SelectGoalResponse>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    let goal = session.select_goal(&goal_id)?.clone();
    let completed_for_goal = session.ledger().completed_for_goal(&goal.id);
    Ok(Json(SelectGoalResponse {
        goal,
        completed_for_goal,
    }))
}

/// Generate a quest batch for the active goal
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/goals/{goal_id}/quests",
    params(
        ("session_id" = Uuid, Path, description = "Session id"),
        ("goal_id" = String, Path, description = "Active goal id")
    ),
    responses(
        (status = 200, description = "New active quest batch", body = QuestBatch),
        (status = 404, description = "Unknown session or goal", body = ApiError),
        (status = 409, description = "Goal is not the active goal", body = ApiError),
        (status = 429, description = "Rate limited", body = ApiError)
    ),
    tag = "quests"
)]
pub async fn generate_quests(
    State(state): State<AppState>,
    Path((session_id, goal_id)): Path<(Uuid, String)>,
) -> Result<Json<QuestBatch>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    let batch = session.generate_quests(&goal_id).await?;
    Ok(Json(batch))
}
