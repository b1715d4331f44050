//! JSON body extractor that reports failures as relay errors
//!
//! Browsers posting chat requests frequently omit `Content-Type`, so the body
//! is parsed as JSON regardless of the declared media type. Any failure turns
//! into [`AppError::InvalidBody`] and is rendered like every other relay error
//! (`{ "message": "..." }`).

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::StatusCode,
};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::AppError;

/// Custom JSON extractor producing [`AppError`] rejections
///
/// Take it as `Result<RelayJson<T>, AppError>` to handle the failure inside
/// the handler instead of short-circuiting.
pub struct RelayJson<T>(pub T);

impl<S, T> FromRequest<S> for RelayJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|rejection| AppError::InvalidBody {
                status: rejection.status(),
                message: rejection.body_text(),
            })?;

        serde_json::from_slice(&bytes)
            .map(RelayJson)
            .map_err(invalid_json)
    }
}

/// Map a serde_json failure to a status the way axum's `Json` does:
/// syntax errors are 400, well-formed JSON of the wrong shape is 422.
fn invalid_json(error: serde_json::Error) -> AppError {
    let status = match error.classify() {
        Category::Data => StatusCode::UNPROCESSABLE_ENTITY,
        Category::Syntax | Category::Eof | Category::Io => StatusCode::BAD_REQUEST,
    };
    AppError::InvalidBody {
        status,
        message: format!("Failed to parse the request body as JSON: {}", error),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use serde::Deserialize;

    #[derive(Debug, Deserialize)]
    struct Sample {
        value: u32,
    }

    async fn extract(body: &'static str) -> Result<RelayJson<Sample>, AppError> {
        let request = Request::builder()
            .method("POST")
            .body(Body::from(body))
            .unwrap();
        RelayJson::<Sample>::from_request(request, &()).await
    }

    #[tokio::test]
    async fn test_parses_without_content_type() {
        let RelayJson(sample) = extract(r#"{"value": 7}"#).await.unwrap();
        assert_eq!(sample.value, 7);
    }

    #[tokio::test]
    async fn test_syntax_error_is_bad_request() {
        match extract("{not json").await {
            Err(AppError::InvalidBody { status, message }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST);
                assert!(message.contains("JSON"));
            }
            other => panic!("expected InvalidBody, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_bad_request() {
        match extract("").await {
            Err(AppError::InvalidBody { status, .. }) => {
                assert_eq!(status, StatusCode::BAD_REQUEST)
            }
            other => panic!("expected InvalidBody, got {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn test_wrong_shape_is_unprocessable() {
        match extract(r#"{"value": "seven"}"#).await {
            Err(AppError::InvalidBody { status, .. }) => {
                assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY)
            }
            other => panic!("expected InvalidBody, got {:?}", other.map(|_| ())),
        }
    }
}
