//! Wire types for the OpenAI Chat Completions API
//!
//! Only the fields the relay reads or writes are modelled; everything else in
//! the provider's payloads is ignored on deserialization.

use serde::{Deserialize, Serialize};

/// SSE payload that marks the end of a completion stream
pub const DONE_SENTINEL: &str = "[DONE]";

/// Body of a streaming chat-completion request
///
/// Built through [`super::UpstreamClient::completion_params`], which always
/// sets `stream: true`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatCompletionParams {
    pub(super) model: String,
    pub(super) messages: Vec<serde_json::Value>,
    pub(super) temperature: f64,
    pub(super) max_tokens: u32,
    pub(super) stream: bool,
}

/// One `data:` payload of the completion stream
#[derive(Debug, Deserialize)]
pub struct ChatCompletionChunk {
    #[serde(default)]
    pub choices: Vec<ChunkChoice>,
    /// Providers may report a failure in-band instead of closing the stream
    #[serde(default)]
    pub error: Option<UpstreamErrorBody>,
}

impl ChatCompletionChunk {
    /// Text carried by the first choice, if it is non-empty
    pub fn text(&self) -> Option<&str> {
        self.choices
            .first()
            .and_then(|choice| choice.delta.content.as_deref())
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ChunkChoice {
    #[serde(default)]
    pub delta: Delta,
}

#[derive(Debug, Default, Deserialize)]
pub struct Delta {
    #[serde(default)]
    pub content: Option<String>,
}

/// Error document returned with non-2xx responses
#[derive(Debug, Deserialize)]
pub struct UpstreamErrorEnvelope {
    pub error: UpstreamErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct UpstreamErrorBody {
    #[serde(default)]
    pub message: Option<String>,
}

/// Extract the message from a non-2xx response body
///
/// Prefers `error.message` from the OpenAI error document, then the raw body
/// text. Returns an empty string when neither carries anything.
pub fn upstream_error_message(body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<UpstreamErrorEnvelope>(body)
        && let Some(message) = envelope.error.message
        && !message.is_empty()
    {
        return message;
    }
    body.trim().to_string()
}
