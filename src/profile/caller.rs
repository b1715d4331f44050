//! Caller identity extracted from the request
//!
//! The relay identifies callers by the bearer token in the `Authorization`
//! header. A request without one is anonymous and resolves to no profile.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;

/// Identity of the caller making a relay request
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Caller {
    token: Option<String>,
}

impl Caller {
    /// A caller that presented no credentials
    pub fn anonymous() -> Self {
        Self { token: None }
    }

    /// A caller identified by a bearer token
    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
        }
    }

    /// Bearer token presented by the caller, if any
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Parse an `Authorization` header value of the form `Bearer <token>`
    ///
    /// The scheme is matched case-insensitively. Anything else yields an
    /// anonymous caller.
    pub fn from_authorization(value: &str) -> Self {
        let mut parts = value.trim().splitn(2, ' ');
        let scheme = parts.next().unwrap_or_default();
        let token = parts.next().map(str::trim).unwrap_or_default();

        if scheme.eq_ignore_ascii_case("bearer") && !token.is_empty() {
            Self::with_token(token)
        } else {
            Self::anonymous()
        }
    }
}

impl std::fmt::Debug for Caller {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let token = if self.token.is_some() {
            "<redacted>"
        } else {
            "<anonymous>"
        };
        f.debug_struct("Caller").field("token", &token).finish()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let caller = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .map(Caller::from_authorization)
            .unwrap_or_default();
        Ok(caller)
    }
}
