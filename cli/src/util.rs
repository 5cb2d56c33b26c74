use serde_json::json;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Print a structured usage error and exit with code 4.
pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", render(&err, false));
    std::process::exit(4);
}

/// Session id from `--session` / `LIFEQUEST_SESSION_ID`, validated as a UUID.
pub fn require_session(session: Option<&str>) -> uuid::Uuid {
    let Some(raw) = session else {
        exit_error(
            "A session id is required for this command",
            Some("Run `lifequest start --persona <key>` and export LIFEQUEST_SESSION_ID"),
        );
    };
    match uuid::Uuid::parse_str(raw.trim()) {
        Ok(id) => id,
        Err(e) => exit_error(&format!("Invalid session id '{raw}': {e}"), None),
    }
}

fn render(value: &serde_json::Value, raw: bool) -> String {
    let rendered = if raw {
        serde_json::to_string(value)
    } else {
        serde_json::to_string_pretty(value)
    };
    rendered.unwrap_or_else(|_| value.to_string())
}

/// Execute an API request, print the response, and map the status to an exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
    raw: bool,
) -> i32 {
    let url = match reqwest::Url::parse(&format!("{api_url}{path}")) {
        Ok(u) => u,
        Err(e) => {
            let err = json!({
                "error": "cli_error",
                "message": format!("Invalid URL: {api_url}{path}: {e}")
            });
            eprintln!("{}", render(&err, raw));
            return 4;
        }
    };

    let mut req = client().request(method.clone(), url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    tracing::debug!(%method, path, "sending request");
    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            let err = json!({
                "error": "connection_error",
                "message": format!("{e}"),
                "docs_hint": "Is the API server running? Check LIFEQUEST_API_URL."
            });
            eprintln!("{}", render(&err, raw));
            return 3;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for(status);

    let resp_body = match resp.bytes().await {
        Ok(bytes) => parse_body(status, &bytes),
        Err(e) => json!({"raw_error": format!("Failed to read response body: {e}")}),
    };

    let formatted = render(&resp_body, raw);
    if exit_code == 0 {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }

    exit_code
}

/// Empty bodies (204) are reported as just the status.
fn parse_body(status: u16, bytes: &[u8]) -> serde_json::Value {
    if bytes.is_empty() {
        return json!({ "status": status });
    }
    match serde_json::from_slice(bytes) {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    }
}

fn exit_code_for(status: u16) -> i32 {
    match status {
        200..=299 => 0,
        400..=499 => 1,
        _ => 2,
    }
}
