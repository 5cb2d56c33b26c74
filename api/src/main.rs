use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use lifequest_core::Coach;

mod error;
mod extract;
mod leaderboard;
mod middleware;
mod routes;
mod state;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "LifeQuest API",
        version = "0.1.0",
        description = "Gamified financial coaching: goal catalogs, staged quests, and a progression ledger per session."
    ),
    paths(
        routes::health::health_check,
        routes::personas::list_personas,
        routes::sessions::create_session,
        routes::sessions::end_session,
        routes::sessions::get_progress,
        routes::sessions::update_profile,
        routes::sessions::switch_persona,
        routes::goals::build_goals,
        routes::goals::list_goals,
        routes::goals::select_goal,
        routes::goals::generate_quests,
        routes::quests::list_quests,
        routes::quests::complete_quest,
        routes::coach::next_best_action,
        routes::coach::ask_coach,
        routes::leaderboard::get_leaderboard,
    ),
    components(schemas(
        HealthResponse,
        lifequest_core::error::ApiError,
        lifequest_core::Persona,
        lifequest_core::persona::ProfileUpdate,
        lifequest_core::Goal,
        lifequest_core::goal::Priority,
        lifequest_core::goal::Timeline,
        lifequest_core::Quest,
        lifequest_core::quest::QuestContent,
        lifequest_core::quest::QuizQuestion,
        lifequest_core::quest::QuestKind,
        lifequest_core::Stage,
        lifequest_core::sequencer::QuestBatch,
        lifequest_core::ledger::Completion,
        lifequest_core::ledger::QuizAnswer,
        lifequest_core::ledger::QuizGrade,
        lifequest_core::ledger::QuestionFeedback,
        lifequest_core::reward::Reward,
        lifequest_core::reward::AchievementBadge,
        lifequest_core::events::ProgressEvent,
        lifequest_core::session::CompletionResult,
        lifequest_core::snapshot::ProgressSnapshot,
        lifequest_core::snapshot::GoalProgress,
        lifequest_core::nudge::NextBestAction,
        lifequest_core::nudge::Urgency,
        lifequest_core::nudge::CoachAnswer,
        routes::personas::PersonasResponse,
        routes::sessions::CreateSessionRequest,
        routes::sessions::CreateSessionResponse,
        routes::sessions::SwitchPersonaRequest,
        routes::goals::GoalView,
        routes::goals::GoalCatalogResponse,
        routes::goals::SelectGoalResponse,
        routes::quests::QuestListResponse,
        routes::quests::QuestView,
        routes::quests::CompleteQuestRequest,
        routes::coach::CoachQuestion,
        routes::leaderboard::LeaderboardResponse,
        leaderboard::LeaderboardEntry,
    ))
)]
struct ApiDoc;

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    /// Generative backend id; "offline" means every flow uses fallbacks
    pub generator: String,
    pub active_sessions: usize,
}

#[tokio::main]
async fn main() {
    // Load .env if present (dev only)
    let _ = dotenvy::dotenv();

    // Structured JSON logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "lifequest_api=debug,lifequest_core=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    let coach = match Coach::from_env() {
        Ok(coach) => Arc::new(coach),
        Err(err) => {
            tracing::error!(error = %err, "failed to configure coach");
            std::process::exit(1);
        }
    };

    let app_state = state::AppState {
        coach,
        sessions: state::SessionStore::default(),
        rivals: Arc::new(leaderboard::RandomRivals),
    };

    let app = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .merge(routes::health::router())
        .merge(routes::generation_router().layer(middleware::rate_limit::generation_layer()))
        .merge(routes::session_router().layer(middleware::rate_limit::session_layer()))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(axum::middleware::from_fn(middleware::security_headers::apply))
                .layer(middleware::cors::build_cors_layer()),
        )
        .with_state(app_state);

    let port: u16 = std::env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(3000);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!(%addr, error = %err, "failed to bind");
            std::process::exit(1);
        }
    };
    tracing::info!("LifeQuest API listening on {}", addr);

    if let Err(err) = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    {
        tracing::error!(error = %err, "server error");
    }
}
