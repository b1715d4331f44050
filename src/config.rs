//! Configuration management for chat-relay
//!
//! Parses TOML configuration files and provides typed access to settings.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::str::FromStr;

use crate::error::{AppError, AppResult};

/// Root configuration structure
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub profiles: Vec<ProfileEntry>,
    #[serde(default)]
    pub observability: ObservabilityConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl ServerConfig {
    /// Address to bind the listener to
    ///
    /// `host` must be an IP literal. Hostnames such as `localhost` are
    /// rejected rather than resolved.
    pub fn socket_addr(&self) -> AppResult<SocketAddr> {
        let ip = self.host.parse::<IpAddr>().map_err(|_| {
            AppError::Config(format!(
                "server.host '{}' must be an IP address such as '127.0.0.1' or '0.0.0.0'",
                self.host
            ))
        })?;
        Ok(SocketAddr::from((ip, self.port)))
    }
}

/// Upstream chat-completion provider settings
///
/// All fields are private; values are only reachable through accessors after
/// `Config::validate()` has accepted them.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    base_url: String,
    #[serde(default = "default_model")]
    model: String,
    #[serde(default = "default_max_tokens")]
    max_tokens: u32,
    #[serde(default = "default_temperature")]
    default_temperature: f64,
    #[serde(default = "default_connect_timeout")]
    connect_timeout_seconds: u64,
    #[serde(default = "default_provider_label")]
    provider_label: String,
}

impl UpstreamConfig {
    /// Base URL of the provider API, e.g. `https://api.openai.com/v1`
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Model identifier sent with every completion request
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Maximum output tokens requested from the provider
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Temperature used when the caller's chat settings omit one
    pub fn default_temperature(&self) -> f64 {
        self.default_temperature
    }

    /// Upper bound on establishing the TCP connection to the provider
    pub fn connect_timeout_seconds(&self) -> u64 {
        self.connect_timeout_seconds
    }

    /// Provider name used in key-check messages
    pub fn provider_label(&self) -> &str {
        &self.provider_label
    }

    /// Override the base URL (used to point the relay at a mock provider)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            model: default_model(),
            max_tokens: default_max_tokens(),
            default_temperature: default_temperature(),
            connect_timeout_seconds: default_connect_timeout(),
            provider_label: default_provider_label(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_model() -> String {
    "gpt-3.5-turbo".to_string()
}

fn default_max_tokens() -> u32 {
    4096
}

fn default_temperature() -> f64 {
    0.7
}

fn default_connect_timeout() -> u64 {
    10
}

fn default_provider_label() -> String {
    "OpenAI".to_string()
}

/// A caller profile stored in the configuration file
///
/// Callers are matched by the bearer token they present.
#[derive(Clone, Deserialize, Serialize)]
pub struct ProfileEntry {
    pub token: String,
    pub user_id: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default)]
    pub openai_organization_id: Option<String>,
}

impl std::fmt::Debug for ProfileEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProfileEntry")
            .field("token", &"<redacted>")
            .field("user_id", &self.user_id)
            .field(
                "openai_api_key",
                &self.openai_api_key.as_ref().map(|_| "<redacted>"),
            )
            .field("openai_organization_id", &self.openai_organization_id)
            .finish()
    }
}

/// Observability configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ObservabilityConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> AppResult<Self> {
        let path_display = path.as_ref().display().to_string();

        let content =
            std::fs::read_to_string(path.as_ref()).map_err(|source| AppError::ConfigFileRead {
                path: path_display.clone(),
                source,
            })?;

        let config: Self = toml::from_str(&content).map_err(|source| {
            AppError::ConfigParseFailed {
                path: path_display.clone(),
                source,
            }
        })?;

        config
            .validate()
            .map_err(|e| AppError::ConfigValidationFailed {
                path: path_display,
                reason: e.to_string(),
            })?;

        Ok(config)
    }

    /// Validate configuration after parsing
    ///
    /// This is called automatically by `from_file()` and `from_str()`, but can
    /// also be called explicitly when constructing Config via other means.
    pub fn validate(&self) -> AppResult<()> {
        self.server.socket_addr()?;

        let upstream = &self.upstream;

        if !upstream.base_url.starts_with("http://") && !upstream.base_url.starts_with("https://")
        {
            return Err(AppError::Config(format!(
                "upstream.base_url '{}' must start with 'http://' or 'https://'",
                upstream.base_url
            )));
        }

        if upstream.model.trim().is_empty() {
            return Err(AppError::Config(
                "upstream.model cannot be empty".to_string(),
            ));
        }

        if upstream.max_tokens == 0 {
            return Err(AppError::Config(
                "upstream.max_tokens must be greater than 0".to_string(),
            ));
        }

        if !upstream.default_temperature.is_finite()
            || !(0.0..=2.0).contains(&upstream.default_temperature)
        {
            return Err(AppError::Config(format!(
                "upstream.default_temperature must be a finite number between 0.0 and 2.0, got {}",
                upstream.default_temperature
            )));
        }

        if upstream.connect_timeout_seconds == 0 {
            return Err(AppError::Config(
                "upstream.connect_timeout_seconds must be greater than 0".to_string(),
            ));
        }
        if upstream.connect_timeout_seconds > 300 {
            return Err(AppError::Config(format!(
                "upstream.connect_timeout_seconds cannot exceed 300 seconds (5 minutes), got {}",
                upstream.connect_timeout_seconds
            )));
        }

        if upstream.provider_label.trim().is_empty() {
            return Err(AppError::Config(
                "upstream.provider_label cannot be empty".to_string(),
            ));
        }

        let mut seen_tokens = HashSet::new();
        for profile in &self.profiles {
            if profile.token.trim().is_empty() {
                return Err(AppError::Config(format!(
                    "profile '{}' has an empty token",
                    profile.user_id
                )));
            }
            if !seen_tokens.insert(profile.token.as_str()) {
                return Err(AppError::Config(format!(
                    "profile '{}' reuses a token that is already assigned to another profile",
                    profile.user_id
                )));
            }
        }

        Ok(())
    }
}

impl FromStr for Config {
    type Err = AppError;

    fn from_str(toml_str: &str) -> Result<Self, Self::Err> {
        let config: Config =
            toml::from_str(toml_str).map_err(|source| AppError::ConfigParseFailed {
                path: "<string>".to_string(),
                source,
            })?;

        config.validate()?;
        Ok(config)
    }
}
