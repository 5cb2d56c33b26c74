//! Generative text service seam.
//!
//! The core issues structured prompts through [`TextGenerator`] and never
//! assumes well-formed output. Implementations:
//! - [`OpenAiGenerator`] for OpenAI-compatible chat completion endpoints
//! - [`OfflineGenerator`] when no service is configured
//! - [`ScriptedGenerator`] for deterministic tests

pub mod openai;
pub mod scripted;

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::GeneratorConfig;

pub use openai::OpenAiGenerator;
pub use scripted::{OfflineGenerator, ScriptedGenerator};

/// Failure of a single generation call.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request failed with HTTP {status}: {body}")]
    Http { status: u16, body: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("could not decode response: {0}")]
    Decode(String),

    #[error("service returned an empty response")]
    Empty,
}

/// One structured prompt: system role, user role, sampling settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationRequest {
    pub system_prompt: String,
    pub user_prompt: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl GenerationRequest {
    pub fn new(system_prompt: impl Into<String>, user_prompt: impl Into<String>) -> Self {
        Self {
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            temperature: 0.7,
            max_tokens: 800,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature.clamp(0.0, 2.0);
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Blocking request/response text generation. No retry is expected of
/// implementations; callers absorb failures through fallbacks.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Backend identifier (e.g. model name).
    fn id(&self) -> &str;

    /// Generate free-form text for `request`.
    async fn complete(&self, request: GenerationRequest) -> Result<String, GenerationError>;
}

/// Run a request and collapse failures and blank output to `None`, logging why.
pub async fn complete_or_none(
    generator: &dyn TextGenerator,
    purpose: &'static str,
    request: GenerationRequest,
) -> Option<String> {
    tracing::debug!(
        generator = generator.id(),
        purpose,
        temperature = request.temperature,
        max_tokens = request.max_tokens,
        "dispatching generation request"
    );
    match generator.complete(request).await {
        Ok(text) if !text.trim().is_empty() => Some(text),
        Ok(_) => {
            tracing::warn!(generator = generator.id(), purpose, "generation returned empty text");
            None
        }
        Err(err) => {
            tracing::warn!(generator = generator.id(), purpose, error = %err, "generation failed");
            None
        }
    }
}

/// Build the generator described by `config`: OpenAI-compatible when an API
/// key is configured, offline otherwise.
pub fn from_config(config: &GeneratorConfig) -> Result<Arc<dyn TextGenerator>, GenerationError> {
    match &config.api_key {
        Some(api_key) => Ok(Arc::new(OpenAiGenerator::new(
            &config.base_url,
            &config.model,
            api_key.clone(),
            config.timeout,
        )?)),
        None => {
            tracing::warn!("no generative service API key configured; running on fallback content");
            Ok(Arc::new(OfflineGenerator))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn temperature_is_clamped() {
        let request = GenerationRequest::new("s", "u").with_temperature(5.0);
        assert_eq!(request.temperature, 2.0);
    }

    #[tokio::test]
    async fn blank_text_collapses_to_none() {
        let generator = ScriptedGenerator::new().with_response("   \n");
        let text = complete_or_none(&generator, "test", GenerationRequest::new("s", "u")).await;
        assert_eq!(text, None);
    }

    #[tokio::test]
    async fn failure_collapses_to_none() {
        let text =
            complete_or_none(&OfflineGenerator, "test", GenerationRequest::new("s", "u")).await;
        assert_eq!(text, None);
    }
}
