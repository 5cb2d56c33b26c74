use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::{delete, get, post, put};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use lifequest_core::error::ApiError;
use lifequest_core::persona::{Persona, ProfileUpdate, find_persona};
use lifequest_core::snapshot::ProgressSnapshot;

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/v1/sessions", post(create_session))
        .route("/v1/sessions/{session_id}", delete(end_session))
        .route("/v1/sessions/{session_id}/progress", get(get_progress))
        .route("/v1/sessions/{session_id}/profile", put(update_profile))
        .route("/v1/sessions/{session_id}/switch", post(switch_persona))
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct CreateSessionRequest {
    /// Built-in persona key, e.g. "tom_carter"
    pub persona_key: String,
    /// Optional edits applied on top of the built-in profile
    #[serde(default)]
    pub profile: Option<ProfileUpdate>,
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct CreateSessionResponse {
    pub session_id: Uuid,
    pub persona: Persona,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct SwitchPersonaRequest {
    pub persona_key: String,
}

/// Start a coaching session for a persona
#[utoipa::path(
    post,
    path = "/v1/sessions",
    request_body = CreateSessionRequest,
    responses(
        (status = 201, description = "Session created", body = CreateSessionResponse),
        (status = 400, description = "Invalid profile", body = ApiError),
        (status = 404, description = "Unknown persona", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn create_session(
    State(state): State<AppState>,
    AppJson(req): AppJson<CreateSessionRequest>,
) -> Result<(StatusCode, Json<CreateSessionResponse>), AppError> {
    let mut persona = find_persona(req.persona_key.trim())?;
    if let Some(profile) = req.profile {
        persona.apply_update(profile)?;
    }

    let session_id = state
        .sessions
        .create(persona.clone(), state.coach.clone())
        .await;
    tracing::info!(%session_id, persona = %persona.key, "session created");

    Ok((
        StatusCode::CREATED,
        Json(CreateSessionResponse {
            session_id,
            persona,
        }),
    ))
}

/// End a session and release its state
#[utoipa::path(
    delete,
    path = "/v1/sessions/{session_id}",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 204, description = "Session ended"),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn end_session(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.sessions.remove(session_id).await?;
    tracing::info!(%session_id, "session ended");
    Ok(StatusCode::NO_CONTENT)
}

/// Current progression snapshot
#[utoipa::path(
    get,
    path = "/v1/sessions/{session_id}/progress",
    params(("session_id" = Uuid, Path, description = "Session id")),
    responses(
        (status = 200, description = "Progress snapshot", body = ProgressSnapshot),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn get_progress(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
) -> Result<Json<ProgressSnapshot>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let session = session.lock().await;
    Ok(Json(session.snapshot()))
}

/// Edit the session's profile without resetting progress
#[utoipa::path(
    put,
    path = "/v1/sessions/{session_id}/profile",
    params(("session_id" = Uuid, Path, description = "Session id")),
    request_body = ProfileUpdate,
    responses(
        (status = 200, description = "Updated persona", body = Persona),
        (status = 400, description = "Invalid profile", body = ApiError),
        (status = 404, description = "Unknown session", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    AppJson(update): AppJson<ProfileUpdate>,
) -> Result<Json<Persona>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    let persona = session.update_profile(update)?.clone();
    Ok(Json(persona))
}

/// Switch persona; progression and catalogs are reset
#[utoipa::path(
    post,
    path = "/v1/sessions/{session_id}/switch",
    params(("session_id" = Uuid, Path, description = "Session id")),
    request_body = SwitchPersonaRequest,
    responses(
        (status = 200, description = "Snapshot after reset", body = ProgressSnapshot),
        (status = 404, description = "Unknown session or persona", body = ApiError)
    ),
    tag = "sessions"
)]
pub async fn switch_persona(
    State(state): State<AppState>,
    Path(session_id): Path<Uuid>,
    AppJson(req): AppJson<SwitchPersonaRequest>,
) -> Result<Json<ProgressSnapshot>, AppError> {
    let session = state.sessions.get(session_id).await?;
    let mut session = session.lock().await;
    session.switch_persona(req.persona_key.trim())?;
    Ok(Json(session.snapshot()))
}
