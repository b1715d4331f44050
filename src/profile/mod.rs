//! Caller profiles and provider credentials
//!
//! A [`Profile`] is resolved per request through an injected [`ProfileStore`],
//! never from ambient state. Only a key that passes [`check_api_key`] can be
//! turned into [`Credentials`] for the upstream call.

pub mod caller;
pub mod static_store;

pub use caller::Caller;
pub use static_store::StaticProfileStore;

use async_trait::async_trait;

use crate::error::{AppError, AppResult};

/// Per-user settings holding provider credentials
#[derive(Clone, PartialEq, Eq)]
pub struct Profile {
    user_id: String,
    openai_api_key: Option<String>,
    openai_organization_id: Option<String>,
}

impl Profile {
    pub fn new(
        user_id: impl Into<String>,
        openai_api_key: Option<String>,
        openai_organization_id: Option<String>,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            openai_api_key,
            openai_organization_id,
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn openai_api_key(&self) -> Option<&str> {
        self.openai_api_key.as_deref()
    }

    pub fn openai_organization_id(&self) -> Option<&str> {
        self.openai_organization_id.as_deref()
    }

    /// Derive upstream credentials from this profile
    ///
    /// # Errors
    ///
    /// - [`AppError::KeyMissing`] when the key is absent or empty
    /// - [`AppError::KeyInvalid`] when [`check_api_key`] rejects it
    pub fn credentials(&self, provider_label: &str) -> AppResult<Credentials> {
        let api_key = match self.openai_api_key.as_deref() {
            Some(key) if !key.is_empty() => key,
            _ => return Err(AppError::KeyMissing),
        };

        check_api_key(api_key, provider_label)?;

        let organization = self
            .openai_organization_id
            .as_deref()
            .filter(|org| !org.trim().is_empty())
            .map(str::to_string);

        Ok(Credentials {
            api_key: api_key.to_string(),
            organization,
        })
    }
}

impl std::fmt::Debug for Profile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Profile")
            .field("user_id", &self.user_id)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_organization_id", &self.openai_organization_id)
            .finish()
    }
}

/// A checked API key plus the optional organization it is scoped to
#[derive(Clone)]
pub struct Credentials {
    api_key: String,
    organization: Option<String>,
}

impl Credentials {
    pub fn api_key(&self) -> &str {
        &self.api_key
    }

    pub fn organization(&self) -> Option<&str> {
        self.organization.as_deref()
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"<redacted>")
            .field("organization", &self.organization)
            .finish()
    }
}

/// Validate the format of a provider API key
///
/// An empty key is reported as "not found" and a key that could not be sent
/// in an `Authorization` header, whitespace included, is reported as
/// incorrect. Both messages are later
/// matched by the user-facing rewrites in [`crate::error::user_facing_message`].
pub fn check_api_key(key: &str, provider_label: &str) -> AppResult<()> {
    if key.is_empty() {
        return Err(AppError::KeyInvalid(format!(
            "{} API Key not found",
            provider_label
        )));
    }

    if !key.chars().all(|c| c.is_ascii_graphic()) {
        return Err(AppError::KeyInvalid(format!(
            "Incorrect API key format for {}",
            provider_label
        )));
    }

    Ok(())
}

/// Source of caller profiles
///
/// Implementations look a caller up on every request; the relay never caches
/// or mutates the returned profile.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    /// Resolve the profile for `caller`, or `None` if there is none
    async fn load_profile(&self, caller: &Caller) -> AppResult<Option<Profile>>;
}
