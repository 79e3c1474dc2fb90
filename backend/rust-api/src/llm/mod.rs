//! The text generator behind chat answers and quiz questions.
//!
//! Handlers never talk to a vendor SDK directly: they receive an
//! `Arc<dyn Generator>` through `AppState`, which is a [`gemini::GeminiClient`]
//! in production and a scripted stand-in under test.

use async_trait::async_trait;
use thiserror::Error;

pub mod gemini;

pub use gemini::GeminiClient;

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_instruction: Option<String>,
    pub prompt: String,
    pub temperature: f32,
    pub max_output_tokens: u32,
    /// Let the model ground its answer with web search.
    pub grounded_search: bool,
}

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("generator timed out")]
    Timeout,

    #[error("generator API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("generator network error: {0}")]
    Network(String),

    #[error("generator returned no text")]
    EmptyResponse,

    #[error("generator is not configured")]
    NotConfigured,
}

#[async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, request: GenerationRequest) -> Result<String, LlmError>;
}

/// Used when no API key is configured: every call fails fast so chat reports
/// the outage and the quiz serves its fallback questions.
pub struct UnconfiguredGenerator;

#[async_trait]
impl Generator for UnconfiguredGenerator {
    async fn generate(&self, _request: GenerationRequest) -> Result<String, LlmError> {
        Err(LlmError::NotConfigured)
    }
}

const FENCE: &str = "```";

/// Language tags dropped when they directly follow an opening fence.
const FENCE_LANGUAGES: &[&str] = &["html", "json", "javascript", "js", "markdown", "md", "xml", "text"];

/// Removes markdown code fences (```` ```json ````, ```` ```html ````, ```` ``` ````)
/// that models like to wrap around structured answers. Only a known language tag
/// right after an opening fence is dropped; any other text is kept.
pub fn strip_code_fences(text: &str) -> String {
    let mut cleaned = String::with_capacity(text.len());
    let mut rest = text;
    let mut opening = true;
    while let Some(start) = rest.find(FENCE) {
        cleaned.push_str(&rest[..start]);
        rest = &rest[start + FENCE.len()..];
        if opening {
            rest = strip_language_tag(rest);
        }
        opening = !opening;
    }
    cleaned.push_str(rest);
    cleaned.trim().to_string()
}

fn strip_language_tag(after_fence: &str) -> &str {
    let tag_len = after_fence
        .find(|c: char| !c.is_ascii_alphanumeric())
        .unwrap_or(after_fence.len());
    let tag = &after_fence[..tag_len];
    if FENCE_LANGUAGES.iter().any(|known| tag.eq_ignore_ascii_case(known)) {
        &after_fence[tag_len..]
    } else {
        after_fence
    }
}
