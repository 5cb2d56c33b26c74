use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use lifequest_core::persona::{AVAILABLE_PRODUCTS, MAX_AGE, MIN_AGE, Persona, builtin_personas};

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/v1/personas", get(list_personas))
}

#[derive(Serialize, utoipa::ToSchema)]
pub struct PersonasResponse {
    pub personas: Vec<Persona>,
    /// Vocabulary for `current_products` in profile updates
    pub available_products: Vec<String>,
    pub min_age: u32,
    pub max_age: u32,
}

/// Built-in personas and profile constraints
#[utoipa::path(
    get,
    path = "/v1/personas",
    responses((status = 200, description = "Persona directory", body = PersonasResponse)),
    tag = "sessions"
)]
pub async fn list_personas() -> Json<PersonasResponse> {
    Json(PersonasResponse {
        personas: builtin_personas(),
        available_products: AVAILABLE_PRODUCTS.iter().map(|p| p.to_string()).collect(),
        min_age: MIN_AGE,
        max_age: MAX_AGE,
    })
}
