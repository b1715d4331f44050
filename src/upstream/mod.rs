//! Client for the upstream chat-completion provider
//!
//! Issues streaming `POST {base_url}/chat/completions` requests scoped to a
//! caller's [`Credentials`] and exposes the response as a stream of text
//! fragments.

pub mod stream;
pub mod types;

pub use stream::text_fragments;
pub use types::ChatCompletionParams;

use futures::StreamExt;
use futures::stream::BoxStream;
use reqwest::header::HeaderValue;
use std::time::Duration;

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::profile::Credentials;

/// Header carrying the OpenAI organization identifier
pub const OPENAI_ORGANIZATION_HEADER: &str = "OpenAI-Organization";

/// Text fragments produced by an upstream completion, in arrival order
pub type TextStream = BoxStream<'static, AppResult<String>>;

/// HTTP client for the provider's Chat Completions API
///
/// Cheap to clone; the underlying connection pool is shared.
#[derive(Clone)]
pub struct UpstreamClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    max_tokens: u32,
}

impl UpstreamClient {
    /// Create a client from validated upstream settings
    ///
    /// Only the connect phase is bounded by a timeout. A completion stream may
    /// run for as long as the provider keeps producing tokens.
    pub fn new(config: &UpstreamConfig) -> AppResult<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(config.connect_timeout_seconds()))
            .build()
            .map_err(|e| AppError::Internal(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            model: config.model().to_string(),
            max_tokens: config.max_tokens(),
        })
    }

    /// Build the request body for a streaming completion
    ///
    /// Messages are forwarded exactly as the caller sent them.
    pub fn completion_params(
        &self,
        messages: Vec<serde_json::Value>,
        temperature: f64,
    ) -> ChatCompletionParams {
        ChatCompletionParams {
            model: self.model.clone(),
            messages,
            temperature,
            max_tokens: self.max_tokens,
            stream: true,
        }
    }

    /// Start a streaming completion
    ///
    /// # Errors
    ///
    /// Returns [`AppError::Upstream`] if the request cannot be sent (status 500)
    /// or the provider answers with a non-2xx status (that status, with the
    /// provider's error message). Failures after this returns `Ok` surface as
    /// items of the returned stream.
    pub async fn stream_chat(
        &self,
        credentials: &Credentials,
        params: &ChatCompletionParams,
    ) -> AppResult<TextStream> {
        let url = format!("{}/chat/completions", self.base_url);

        let mut request = self
            .http
            .post(&url)
            .bearer_auth(credentials.api_key())
            .json(params);

        if let Some(organization) = credentials.organization() {
            let value = HeaderValue::from_str(organization).map_err(|_| {
                AppError::Internal(
                    "OpenAI organization identifier is not a valid header value".to_string(),
                )
            })?;
            request = request.header(OPENAI_ORGANIZATION_HEADER, value);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(
                upstream_url = %url,
                error = %e,
                "Failed to reach upstream provider"
            );
            AppError::Upstream {
                status: 500,
                message: format!("Connection error: {}", e),
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = types::upstream_error_message(&body);
            tracing::debug!(
                upstream_status = status.as_u16(),
                message = %message,
                "Upstream provider rejected completion request"
            );
            return Err(AppError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        Ok(text_fragments(response.bytes_stream()).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> UpstreamClient {
        UpstreamClient::new(&UpstreamConfig::default()).expect("should build client")
    }

    #[test]
    fn test_completion_params_always_stream() {
        let params = client().completion_params(vec![], 0.3);
        assert!(params.stream);
        assert_eq!(params.model, "gpt-3.5-turbo");
        assert_eq!(params.max_tokens, 4096);
        assert_eq!(params.temperature, 0.3);
    }

    #[test]
    fn test_completion_params_wire_shape() {
        let messages = vec![serde_json::json!({"role": "user", "content": "hi", "extra": [1, 2]})];
        let params = client().completion_params(messages.clone(), 0.7);
        let json = serde_json::to_value(&params).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "model": "gpt-3.5-turbo",
                "messages": messages,
                "temperature": 0.7,
                "max_tokens": 4096,
                "stream": true,
            })
        );
    }

    #[test]
    fn test_trailing_slash_is_trimmed() {
        let config = UpstreamConfig::default().with_base_url("http://localhost:1234/v1/");
        let client = UpstreamClient::new(&config).unwrap();
        assert_eq!(client.base_url, "http://localhost:1234/v1");
    }
}
