//! Chat relay endpoint
//!
//! Accepts a chat request, resolves the caller's provider credentials, starts
//! a streaming completion upstream and relays the text fragments back as a
//! plain-text streaming body.

use crate::config::UpstreamConfig;
use crate::error::{AppError, AppResult};
use crate::handlers::AppState;
use crate::metrics::{Metrics, Outcome};
use crate::middleware::RequestId;
use crate::profile::{Caller, Profile};
use crate::upstream::{TextStream, UpstreamClient};
use axum::{
    Extension,
    body::Body,
    extract::State,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use futures::StreamExt;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Instant;

use super::extractor::RelayJson;

/// Route the relay is mounted on
pub const CHAT_ROUTE: &str = "/api/chat/openai";

/// Content type of a successful relay response
pub const STREAMING_TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";

/// Request body accepted by the relay
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    #[serde(default)]
    pub chat_settings: Option<ChatSettings>,
    /// Forwarded upstream unmodified; shape is not validated here
    pub messages: Vec<serde_json::Value>,
}

impl ChatRequest {
    /// Caller's temperature, or `default` when settings or the field are absent
    pub fn temperature_or(&self, default: f64) -> f64 {
        self.chat_settings
            .as_ref()
            .and_then(|settings| settings.temperature)
            .unwrap_or(default)
    }
}

/// Caller-supplied chat settings; only `temperature` is consumed
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChatSettings {
    #[serde(default)]
    pub temperature: Option<f64>,
}

/// Start a relayed completion for an already-resolved profile
///
/// Does not touch request context; the outcome depends only on the
/// arguments and the provider's behaviour.
///
/// # Errors
///
/// - [`AppError::ProfileMissing`] if `profile` is `None`
/// - [`AppError::KeyMissing`] / [`AppError::KeyInvalid`] from the key checks
/// - [`AppError::Upstream`] if the provider refuses the request
pub async fn relay_chat(
    upstream: &UpstreamClient,
    settings: &UpstreamConfig,
    profile: Option<Profile>,
    request: ChatRequest,
) -> AppResult<TextStream> {
    let profile = profile.ok_or(AppError::ProfileMissing)?;
    let credentials = profile.credentials(settings.provider_label())?;

    let temperature = request.temperature_or(settings.default_temperature());
    let params = upstream.completion_params(request.messages, temperature);

    upstream.stream_chat(&credentials, &params).await
}

/// POST /api/chat/openai handler
///
/// # Response
///
/// - `200 OK`, `text/plain; charset=utf-8`: fragments streamed as they arrive
/// - any other status: `{ "message": "..." }` describing what failed before
///   the stream started
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    caller: Caller,
    body: Result<RelayJson<ChatRequest>, AppError>,
) -> Response {
    let started = Instant::now();

    match start_relay(&state, request_id, &caller, body).await {
        Ok(fragments) => {
            let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;
            if let Err(e) = state.metrics().record_upstream_start(elapsed_ms) {
                tracing::warn!(
                    request_id = %request_id,
                    error = %e,
                    "Failed to record upstream start latency"
                );
            }
            record_outcome(state.metrics(), Outcome::Streamed, request_id);

            tracing::info!(
                request_id = %request_id,
                upstream_start_ms = %elapsed_ms,
                "Upstream stream started, relaying to client"
            );

            streaming_text_response(fragments, Arc::clone(state.metrics()), request_id)
        }
        Err(e) => {
            let status = e.status();
            tracing::warn!(
                request_id = %request_id,
                status = status.as_u16(),
                outcome = e.outcome().as_str(),
                error = %e,
                "Chat relay request failed before streaming"
            );
            record_outcome(state.metrics(), e.outcome(), request_id);
            e.into_response()
        }
    }
}

async fn start_relay(
    state: &AppState,
    request_id: RequestId,
    caller: &Caller,
    body: Result<RelayJson<ChatRequest>, AppError>,
) -> AppResult<TextStream> {
    let RelayJson(request) = body?;

    tracing::debug!(
        request_id = %request_id,
        messages_count = request.messages.len(),
        temperature = ?request.chat_settings.as_ref().and_then(|s| s.temperature),
        "Received chat relay request"
    );

    let profile = state.profiles().load_profile(caller).await?;
    if let Some(profile) = &profile {
        tracing::debug!(
            request_id = %request_id,
            user_id = %profile.user_id(),
            "Resolved caller profile"
        );
    }

    relay_chat(state.upstream(), &state.config().upstream, profile, request).await
}

fn record_outcome(metrics: &Metrics, outcome: Outcome, request_id: RequestId) {
    if let Err(e) = metrics.record_outcome(outcome) {
        tracing::warn!(
            request_id = %request_id,
            outcome = outcome.as_str(),
            error = %e,
            "Failed to record request outcome"
        );
    }
}

/// Wrap upstream fragments in a plain-text streaming response
///
/// Headers are committed before the first fragment, so a failure later in the
/// stream cannot become a JSON error. It is logged and counted, and the body
/// is aborted so the client sees a truncated transfer instead of a clean end.
fn streaming_text_response(
    fragments: TextStream,
    metrics: Arc<Metrics>,
    request_id: RequestId,
) -> Response {
    let mut relayed: usize = 0;
    let body = fragments.inspect(move |item| match item {
        Ok(_) => {
            relayed += 1;
            metrics.fragment_relayed();
        }
        Err(e) => {
            metrics.mid_stream_failure();
            tracing::warn!(
                request_id = %request_id,
                fragments = relayed,
                error = %e,
                "Upstream stream failed after response started"
            );
        }
    });

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, STREAMING_TEXT_CONTENT_TYPE)],
        Body::from_stream(body),
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_parses_camel_case_settings() {
        let request: ChatRequest = serde_json::from_str(
            r#"{"chatSettings":{"model":"gpt-4","temperature":0.2,"contextLength":4096},"messages":[{"role":"user","content":"hi"}]}"#,
        )
        .unwrap();
        assert_eq!(request.temperature_or(0.7), 0.2);
        assert_eq!(request.messages.len(), 1);
    }

    #[test]
    fn test_temperature_defaults_when_omitted() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"chatSettings":{},"messages":[]}"#).unwrap();
        assert_eq!(request.temperature_or(0.7), 0.7);
    }

    #[test]
    fn test_temperature_defaults_when_settings_absent_or_null() {
        let absent: ChatRequest = serde_json::from_str(r#"{"messages":[]}"#).unwrap();
        assert_eq!(absent.temperature_or(0.7), 0.7);

        let null: ChatRequest =
            serde_json::from_str(r#"{"chatSettings":null,"messages":[]}"#).unwrap();
        assert_eq!(null.temperature_or(0.7), 0.7);

        let null_temp: ChatRequest =
            serde_json::from_str(r#"{"chatSettings":{"temperature":null},"messages":[]}"#)
                .unwrap();
        assert_eq!(null_temp.temperature_or(0.7), 0.7);
    }

    #[test]
    fn test_zero_temperature_is_kept() {
        let request: ChatRequest =
            serde_json::from_str(r#"{"chatSettings":{"temperature":0},"messages":[]}"#).unwrap();
        assert_eq!(request.temperature_or(0.7), 0.0);
    }

    #[test]
    fn test_messages_are_required() {
        assert!(serde_json::from_str::<ChatRequest>(r#"{"chatSettings":{}}"#).is_err());
    }

    #[test]
    fn test_opaque_messages_are_kept_verbatim() {
        let raw = r#"{"messages":[{"role":"user","content":[{"type":"image_url","image_url":{"url":"data:..."}}],"name":"x"}]}"#;
        let request: ChatRequest = serde_json::from_str(raw).unwrap();
        let original: serde_json::Value = serde_json::from_str(raw).unwrap();
        assert_eq!(request.messages[0], original["messages"][0]);
    }

    fn upstream() -> (UpstreamClient, UpstreamConfig) {
        let settings = UpstreamConfig::default().with_base_url("http://127.0.0.1:9/v1");
        (UpstreamClient::new(&settings).unwrap(), settings)
    }

    fn request() -> ChatRequest {
        serde_json::from_str(r#"{"messages":[]}"#).unwrap()
    }

    #[tokio::test]
    async fn test_relay_without_profile_is_profile_missing() {
        let (client, settings) = upstream();
        let result = relay_chat(&client, &settings, None, request()).await;
        assert!(matches!(result, Err(AppError::ProfileMissing)));
    }

    #[tokio::test]
    async fn test_relay_without_key_is_key_missing() {
        let (client, settings) = upstream();
        let profile = Profile::new("u", None, Some("org".to_string()));
        let result = relay_chat(&client, &settings, Some(profile), request()).await;
        assert!(matches!(result, Err(AppError::KeyMissing)));
    }

    #[tokio::test]
    async fn test_relay_with_malformed_key_is_key_invalid() {
        let (client, settings) = upstream();
        let profile = Profile::new("u", Some("sk bad".to_string()), None);
        let result = relay_chat(&client, &settings, Some(profile), request()).await;
        assert!(matches!(result, Err(AppError::KeyInvalid(_))));
    }
}
