use serde::Serialize;
use utoipa::ToSchema;

/// Structured error response returned to presentation clients.
/// Carries enough context for a client to explain the rejection to the user.
#[derive(Debug, Serialize, ToSchema)]
pub struct ApiError {
    /// Machine-readable error code (e.g. "state_conflict", "not_found")
    pub error: String,
    /// Human-readable description of what went wrong
    pub message: String,
    /// Which field caused the error (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    /// The value that was received (if applicable)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received: Option<serde_json::Value>,
    /// Request ID for tracing and debugging
    pub request_id: String,
    /// Hint about what the correct usage looks like
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docs_hint: Option<String>,
}

/// Error codes used across the API
pub mod codes {
    pub const VALIDATION_FAILED: &str = "validation_failed";
    pub const NOT_FOUND: &str = "not_found";
    pub const STATE_CONFLICT: &str = "state_conflict";
    pub const INTERNAL_ERROR: &str = "internal_error";
    pub const RATE_LIMITED: &str = "rate_limited";
}

/// Rejections a caller can observe. Completing a quest twice or outside the
/// active goal is a rejected operation, not a system fault.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProgressionError {
    #[error("quest '{quest_id}' is already completed")]
    AlreadyCompleted { quest_id: String },

    #[error("quest '{quest_id}' belongs to goal '{quest_goal_id}', active goal is {active}")]
    WrongGoalContext {
        quest_id: String,
        quest_goal_id: String,
        active: String,
    },

    #[error("goal '{goal_id}' is not the active goal, active goal is {active}")]
    GoalNotSelected { goal_id: String, active: String },

    #[error("goal '{0}' is not in the current catalog")]
    GoalNotFound(String),

    #[error("quest '{0}' is not in the active quest batch")]
    QuestNotFound(String),

    #[error("persona '{0}' does not exist")]
    PersonaNotFound(String),

    #[error("invalid profile field '{field}': {message}")]
    InvalidProfile { field: String, message: String },
}

impl ProgressionError {
    pub fn wrong_goal(quest_id: &str, quest_goal_id: &str, active: Option<&str>) -> Self {
        Self::WrongGoalContext {
            quest_id: quest_id.to_string(),
            quest_goal_id: quest_goal_id.to_string(),
            active: describe_active(active),
        }
    }

    pub fn goal_not_selected(goal_id: &str, active: Option<&str>) -> Self {
        Self::GoalNotSelected {
            goal_id: goal_id.to_string(),
            active: describe_active(active),
        }
    }

    /// True for the state-conflict class (the operation was a no-op).
    pub fn is_state_conflict(&self) -> bool {
        matches!(
            self,
            Self::AlreadyCompleted { .. }
                | Self::WrongGoalContext { .. }
                | Self::GoalNotSelected { .. }
        )
    }
}

fn describe_active(active: Option<&str>) -> String {
    active
        .map(|id| format!("'{id}'"))
        .unwrap_or_else(|| "unset".to_string())
}

/// Generative-service unreliability. Every variant is recovered locally by a
/// deterministic default; values of this type are only ever logged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationIssue {
    #[error("generative service unavailable: {0}")]
    ServiceUnavailable(String),

    #[error("malformed payload: {0}")]
    MalformedPayload(String),

    #[error("invariant violation: {0}")]
    InvariantViolation(String),
}

impl GenerationIssue {
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::ServiceUnavailable(_) => "service_unavailable",
            Self::MalformedPayload(_) => "malformed_payload",
            Self::InvariantViolation(_) => "invariant_violation",
        }
    }
}
