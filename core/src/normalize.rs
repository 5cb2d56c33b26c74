//! Extraction of a JSON payload from free-form generative output.
//!
//! The service may wrap its payload in prose or markdown code fences. The
//! normalizer prefers a fence labeled `json`, then any fence, then the trimmed
//! text itself. It never fails; whether the result parses is decided later by
//! the schema validator.

use std::sync::LazyLock;

use regex::Regex;

static JSON_FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?si)```json(.*?)```").expect("json fence regex must compile")
});

static ANY_FENCE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(.*?)```").expect("fence regex must compile"));

static INFO_STRING_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z0-9_+-]*[ \t]*\r?\n").expect("info string regex must compile")
});

/// Best-effort JSON substring of `raw`.
pub fn extract_payload(raw: &str) -> String {
    if let Some(body) = JSON_FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        return body.as_str().trim().to_string();
    }
    if let Some(body) = ANY_FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        // A fence labeled with another language keeps its label on the first line.
        let body = INFO_STRING_RE.replace(body.as_str(), "");
        return body.trim().to_string();
    }
    raw.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::extract_payload;

    #[test]
    fn prefers_json_labeled_fence() {
        let raw = "Sure!\n```text\nnot this\n```\n```json\n[{\"id\": 1}]\n```\nEnjoy.";
        assert_eq!(extract_payload(raw), "[{\"id\": 1}]");
    }

    #[test]
    fn json_label_is_case_insensitive() {
        let raw = "```JSON\n{\"a\": true}\n```";
        assert_eq!(extract_payload(raw), "{\"a\": true}");
    }

    #[test]
    fn falls_back_to_unlabeled_fence() {
        let raw = "Here you go:\n```\n[1, 2, 3]\n```";
        assert_eq!(extract_payload(raw), "[1, 2, 3]");
    }

    #[test]
    fn strips_foreign_language_label_from_fence() {
        let raw = "```javascript\n[{\"title\": \"x\"}]\n```";
        assert_eq!(extract_payload(raw), "[{\"title\": \"x\"}]");
    }

    #[test]
    fn unfenced_text_is_trimmed_and_returned_as_is() {
        assert_eq!(extract_payload("  \n[]\n  "), "[]");
        assert_eq!(extract_payload("no payload here"), "no payload here");
    }
}
