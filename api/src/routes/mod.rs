use axum::Router;

use crate::state::AppState;

pub mod coach;
pub mod goals;
pub mod health;
pub mod leaderboard;
pub mod personas;
pub mod quests;
pub mod sessions;

/// Routes whose handlers call the generative service.
pub fn generation_router() -> Router<AppState> {
    goals::generation_router().merge(coach::router())
}

/// Session reads and local state transitions.
pub fn session_router() -> Router<AppState> {
    personas::router()
        .merge(sessions::router())
        .merge(goals::router())
        .merge(quests::router())
        .merge(leaderboard::router())
}
