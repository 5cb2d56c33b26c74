use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use lifequest_core::error::{self, ApiError, ProgressionError};

/// Internal error type that converts to structured API responses
#[derive(Debug)]
pub enum AppError {
    /// Validation error (400)
    Validation {
        message: String,
        field: Option<String>,
        received: Option<serde_json::Value>,
        docs_hint: Option<String>,
    },
    /// Unknown session, goal, quest, or persona (404)
    NotFound { resource: String, message: String },
    /// Operation rejected by the current progression state (409)
    StateConflict { message: String, docs_hint: String },
}

impl AppError {
    pub fn session_not_found(session_id: uuid::Uuid) -> Self {
        AppError::NotFound {
            resource: "session".to_string(),
            message: format!("Session '{session_id}' does not exist"),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();

        let (status, api_error) = match self {
            AppError::Validation {
                message,
                field,
                received,
                docs_hint,
            } => (
                StatusCode::BAD_REQUEST,
                ApiError {
                    error: error::codes::VALIDATION_FAILED.to_string(),
                    message,
                    field,
                    received,
                    request_id,
                    docs_hint,
                },
            ),
            AppError::NotFound { resource, message } => (
                StatusCode::NOT_FOUND,
                ApiError {
                    error: error::codes::NOT_FOUND.to_string(),
                    message,
                    field: Some(resource),
                    received: None,
                    request_id,
                    docs_hint: None,
                },
            ),
            AppError::StateConflict { message, docs_hint } => (
                StatusCode::CONFLICT,
                ApiError {
                    error: error::codes::STATE_CONFLICT.to_string(),
                    message,
                    field: None,
                    received: None,
                    request_id,
                    docs_hint: Some(docs_hint),
                },
            ),
        };

        (status, Json(api_error)).into_response()
    }
}

impl From<ProgressionError> for AppError {
    fn from(err: ProgressionError) -> Self {
        let message = err.to_string();
        match err {
            ProgressionError::AlreadyCompleted { .. } => AppError::StateConflict {
                message,
                docs_hint: "Quests can be completed once. Fetch progress to see completed ids."
                    .to_string(),
            },
            ProgressionError::WrongGoalContext { .. } | ProgressionError::GoalNotSelected { .. } => {
                AppError::StateConflict {
                    message,
                    docs_hint: "Select the goal first: POST /v1/sessions/{id}/goals/{goal_id}/select"
                        .to_string(),
                }
            }
            ProgressionError::GoalNotFound(_) => AppError::NotFound {
                resource: "goal".to_string(),
                message,
            },
            ProgressionError::QuestNotFound(_) => AppError::NotFound {
                resource: "quest".to_string(),
                message,
            },
            ProgressionError::PersonaNotFound(_) => AppError::NotFound {
                resource: "persona".to_string(),
                message,
            },
            ProgressionError::InvalidProfile { field, .. } => AppError::Validation {
                message,
                field: Some(field),
                received: None,
                docs_hint: Some(
                    "Age must be 18-100; products must come from GET /v1/personas.".to_string(),
                ),
            },
        }
    }
}
