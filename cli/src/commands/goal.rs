use uuid::Uuid;

use crate::util::api_request;

/// Show the session's goal catalog, or build a fresh one with `generate`.
pub async fn list(api_url: &str, session: Uuid, generate: bool, raw: bool) -> i32 {
    let method = if generate {
        reqwest::Method::POST
    } else {
        reqwest::Method::GET
    };
    api_request(
        api_url,
        method,
        &format!("/v1/sessions/{session}/goals"),
        None,
        raw,
    )
    .await
}

pub async fn select(api_url: &str, session: Uuid, goal_id: &str, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        &format!("/v1/sessions/{session}/goals/{goal_id}/select"),
        None,
        raw,
    )
    .await
}
