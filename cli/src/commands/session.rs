use lifequest_core::persona::ProfileUpdate;
use serde_json::json;
use uuid::Uuid;

use crate::util::{api_request, exit_error};

/// Profile fields accepted by `start` and `profile`.
#[derive(clap::Args, Debug, Default)]
pub struct ProfileArgs {
    /// Age in years (18-100)
    #[arg(long)]
    pub age: Option<u32>,
    #[arg(long)]
    pub occupation: Option<String>,
    /// Income band, e.g. "$50k-75k"
    #[arg(long)]
    pub income_range: Option<String>,
    /// Products already held (repeatable). Pass `--product none` to clear.
    #[arg(long = "product")]
    pub products: Vec<String>,
}

impl ProfileArgs {
    fn is_empty(&self) -> bool {
        self.age.is_none()
            && self.occupation.is_none()
            && self.income_range.is_none()
            && self.products.is_empty()
    }

    fn into_update(self) -> ProfileUpdate {
        let current_products = match self.products.as_slice() {
            [] => None,
            [only] if only.eq_ignore_ascii_case("none") => Some(Vec::new()),
            _ => Some(self.products),
        };
        ProfileUpdate {
            age: self.age,
            occupation: self.occupation,
            income_range: self.income_range,
            current_products,
        }
    }
}

pub async fn start(api_url: &str, persona_key: &str, profile: ProfileArgs, raw: bool) -> i32 {
    let mut body = json!({ "persona_key": persona_key });
    if !profile.is_empty() {
        body["profile"] = json!(profile.into_update());
    }
    api_request(
        api_url,
        reqwest::Method::POST,
        "/v1/sessions",
        Some(body),
        raw,
    )
    .await
}

pub async fn switch(api_url: &str, session: Uuid, persona_key: &str, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::POST,
        &format!("/v1/sessions/{session}/switch"),
        Some(json!({ "persona_key": persona_key })),
        raw,
    )
    .await
}

pub async fn profile(api_url: &str, session: Uuid, profile: ProfileArgs, raw: bool) -> i32 {
    if profile.is_empty() {
        exit_error(
            "Nothing to update",
            Some("Pass at least one of --age, --occupation, --income-range, --product"),
        );
    }
    api_request(
        api_url,
        reqwest::Method::PUT,
        &format!("/v1/sessions/{session}/profile"),
        Some(json!(profile.into_update())),
        raw,
    )
    .await
}

pub async fn end(api_url: &str, session: Uuid, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::DELETE,
        &format!("/v1/sessions/{session}"),
        None,
        raw,
    )
    .await
}

pub async fn progress(api_url: &str, session: Uuid, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::GET,
        &format!("/v1/sessions/{session}/progress"),
        None,
        raw,
    )
    .await
}

pub async fn leaderboard(api_url: &str, session: Uuid, raw: bool) -> i32 {
    api_request(
        api_url,
        reqwest::Method::GET,
        &format!("/v1/sessions/{session}/leaderboard"),
        None,
        raw,
    )
    .await
}
