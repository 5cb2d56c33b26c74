use serde_json::json;
use uuid::Uuid;

use crate::util::{api_request, exit_error};

pub async fn nudge(api_url: &str, session: Uuid, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        &format!("/v1/sessions/{session}/nudge"),
        None,
        raw,
    )
    .await
}

pub async fn ask(api_url: &str, session: Uuid, question: &[String], raw: bool) -> i32 {
    let question = question.join(" ");
    if question.trim().is_empty() {
        exit_error("Question must not be empty", Some("lifequest ask how much should I save?"));
    }
    api_request(
        api_url,
        reqwest::Method::POST,
        &format!("/v1/sessions/{session}/coach"),
        Some(json!({ "question": question })),
        raw,
    )
    .await
}
