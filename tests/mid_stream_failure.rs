//! Integration tests for failures after the relay response has started
//!
//! Once the 200 headers are sent no JSON error can replace the body. These
//! tests check that the fragments received so far are delivered, that the
//! body then ends in an error instead of a clean end-of-stream, and that the
//! failure is counted.

use axum::{
    body::Body,
    http::{Request, StatusCode},
};
use chat_relay::{
    config::Config,
    handlers::{self, AppState, chat::CHAT_ROUTE},
    metrics::Outcome,
};
use futures::StreamExt;
use std::str::FromStr;
use std::sync::Arc;
use tower::ServiceExt;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{method, path},
};

fn create_test_state(upstream_base_url: &str) -> AppState {
    let config = Config::from_str(&format!(
        r#"
[server]
host = "127.0.0.1"
port = 8080

[upstream]
base_url = "{upstream_base_url}"

[[profiles]]
token = "token-alice"
user_id = "alice"
openai_api_key = "sk-alice"
"#
    ))
    .expect("should parse test config");
    AppState::new(Arc::new(config)).expect("AppState::new should succeed")
}

fn content_event(text: &str) -> String {
    format!(
        "data: {{\"choices\":[{{\"index\":0,\"delta\":{{\"content\":{}}}}}]}}\n\n",
        serde_json::to_string(text).unwrap()
    )
}

/// Read the body frame by frame, returning the text received before the
/// first error and whether an error occurred
async fn drain(response: axum::response::Response) -> (String, bool) {
    let mut stream = response.into_body().into_data_stream();
    let mut text = String::new();
    while let Some(frame) = stream.next().await {
        match frame {
            Ok(bytes) => text.push_str(&String::from_utf8_lossy(&bytes)),
            Err(_) => return (text, true),
        }
    }
    (text, false)
}

async fn run(sse: String) -> (StatusCode, String, bool, AppState) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(sse, "text/event-stream"))
        .mount(&server)
        .await;

    let state = create_test_state(&format!("{}/v1", server.uri()));
    let app = handlers::router(state.clone());

    let request = Request::builder()
        .method("POST")
        .uri(CHAT_ROUTE)
        .header("authorization", "Bearer token-alice")
        .body(Body::from(
            r#"{"chatSettings":{},"messages":[{"role":"user","content":"Hi"}]}"#,
        ))
        .unwrap();

    let response = app.oneshot(request).await.unwrap();
    let status = response.status();
    let (text, errored) = drain(response).await;
    (status, text, errored, state)
}

#[tokio::test]
async fn test_in_band_error_truncates_body() {
    let sse = [
        content_event("Once upon"),
        content_event(" a time"),
        "data: {\"error\":{\"message\":\"The server had an error while processing your request.\"}}\n\n"
            .to_string(),
        content_event(" never sent"),
    ]
    .concat();

    let (status, text, errored, state) = run(sse).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "Once upon a time");
    assert!(errored, "body should end with an error, not a clean EOF");
    assert_eq!(state.metrics().mid_stream_failures_count(), 1);
    assert_eq!(state.metrics().outcome_count(Outcome::Streamed), 1);
}

#[tokio::test]
async fn test_malformed_chunk_truncates_body() {
    let sse = [content_event("partial"), "data: {\"choices\": [\n\n".to_string()].concat();

    let (status, text, errored, state) = run(sse).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "partial");
    assert!(errored);
    assert_eq!(state.metrics().mid_stream_failures_count(), 1);
}

#[tokio::test]
async fn test_clean_stream_has_no_failure() {
    let sse = [content_event("all"), content_event(" good"), "data: [DONE]\n\n".to_string()].concat();

    let (status, text, errored, state) = run(sse).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(text, "all good");
    assert!(!errored);
    assert_eq!(state.metrics().mid_stream_failures_count(), 0);
    assert_eq!(state.metrics().fragments_relayed_count(), 2);
}
