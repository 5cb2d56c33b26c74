use lifequest_core::ledger::QuizAnswer;
use serde_json::json;
use uuid::Uuid;

use crate::util::api_request;

/// List the active batch. With `generate`, first request a new batch for that goal.
pub async fn list(api_url: &str, session: Uuid, generate: Option<&str>, raw: bool) -> i32 {
    match generate {
        Some(goal_id) => {
            api_request(
                api_url,
                reqwest::Method::POST,
                &format!("/v1/sessions/{session}/goals/{goal_id}/quests"),
                None,
                raw,
            )
            .await
        }
        None => {
            api_request(
                api_url,
                reqwest::Method::GET,
                &format!("/v1/sessions/{session}/quests"),
                None,
                raw,
            )
            .await
        }
    }
}

pub async fn complete(
    api_url: &str,
    session: Uuid,
    quest_id: &str,
    answers: &[String],
    raw: bool,
) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        &format!("/v1/sessions/{session}/quests/{quest_id}/complete"),
        Some(completion_body(answers)),
        raw,
    )
    .await
}

/// `#N` selects option N by zero-based index; anything else is sent as
/// option text, so numeric options like "12" can be answered verbatim.
fn parse_answer(raw: &str) -> QuizAnswer {
    let trimmed = raw.trim();
    match trimmed
        .strip_prefix('#')
        .and_then(|index| index.trim().parse::<usize>().ok())
    {
        Some(index) => QuizAnswer::Index(index),
        None => QuizAnswer::Text(trimmed.to_string()),
    }
}

fn completion_body(answers: &[String]) -> serde_json::Value {
    if answers.is_empty() {
        return json!({});
    }
    let answers: Vec<QuizAnswer> = answers.iter().map(|a| parse_answer(a)).collect();
    json!({ "answers": answers })
}
