//! Error types for chat-relay
//!
//! All errors implement `IntoResponse` for Axum handlers. Every error body has
//! the shape `{ "message": "..." }`, with the two known API-key messages
//! rewritten into user-facing text first.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::metrics::Outcome;

/// Message used when an error carries no text of its own
pub const DEFAULT_ERROR_MESSAGE: &str = "An error occurred";

/// Replacement for any message mentioning a missing API key
pub const KEY_NOT_CONFIGURED_MESSAGE: &str = "OpenAI API key not configured in profile settings";

/// Replacement for any message mentioning an incorrect API key
pub const KEY_INVALID_MESSAGE: &str = "Invalid OpenAI API key in profile settings";

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    /// Request body could not be extracted as JSON
    #[error("{message}")]
    InvalidBody { status: StatusCode, message: String },

    #[error("User profile not found")]
    ProfileMissing,

    /// The profile store failed; its message and status reach the caller as-is
    #[error("{message}")]
    ProfileLookup {
        status: Option<u16>,
        message: String,
    },

    #[error("OpenAI API key not configured")]
    KeyMissing,

    /// The key checker rejected the key; carries the checker's own message
    #[error("{0}")]
    KeyInvalid(String),

    /// The upstream provider refused or failed the completion request
    #[error("{message}")]
    Upstream { status: u16, message: String },

    /// The upstream stream failed after the response had started
    #[error("Upstream stream failed: {0}")]
    UpstreamStream(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// HTTP status code this error is reported with
    pub fn status(&self) -> StatusCode {
        match self {
            Self::InvalidBody { status, .. } => *status,
            Self::Upstream { status, .. } => {
                StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
            }
            Self::ProfileLookup { status, .. } => status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            Self::UpstreamStream(_) => StatusCode::BAD_GATEWAY,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::ProfileMissing
            | Self::KeyMissing
            | Self::KeyInvalid(_)
            | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Metrics label for the request outcome this error represents
    pub fn outcome(&self) -> Outcome {
        match self {
            Self::InvalidBody { .. } => Outcome::InvalidBody,
            Self::ProfileMissing => Outcome::ProfileMissing,
            Self::ProfileLookup { .. } => Outcome::ProfileLookupFailed,
            Self::KeyMissing => Outcome::KeyMissing,
            Self::KeyInvalid(_) => Outcome::KeyInvalid,
            Self::Upstream { .. } | Self::UpstreamStream(_) => Outcome::UpstreamError,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::Internal(_) => Outcome::Internal,
        }
    }

    /// Message shown to the caller, after the known rewrites are applied
    pub fn user_message(&self) -> String {
        user_facing_message(&self.to_string())
    }
}

/// Rewrite the two known API-key error texts into user-facing messages
///
/// Matching is case-insensitive on substrings. The "not found" rule wins when
/// both appear. Every other message passes through unchanged, except that an
/// empty message becomes [`DEFAULT_ERROR_MESSAGE`].
pub fn user_facing_message(message: &str) -> String {
    if message.is_empty() {
        return DEFAULT_ERROR_MESSAGE.to_string();
    }

    let lowered = message.to_lowercase();
    if lowered.contains("api key not found") {
        KEY_NOT_CONFIGURED_MESSAGE.to_string()
    } else if lowered.contains("incorrect api key") {
        KEY_INVALID_MESSAGE.to_string()
    } else {
        message.to_string()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(serde_json::json!({
            "message": self.user_message(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;
