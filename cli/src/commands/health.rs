use crate::util::api_request;

pub async fn run(api_url: &str, raw: bool) -> i32 {
    api_request(api_url, reqwest::Method::GET, "/health", None, raw).await
}

/// Persona directory plus the product names a profile may list.
pub async fn personas(api_url: &str, raw: bool) -> i32 {
    api_request(api_url, reqwest::Method::GET, "/v1/personas", None, raw).await
}
