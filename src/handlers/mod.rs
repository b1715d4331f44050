//! HTTP request handlers for the chat-relay API

use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::metrics::Metrics;
use crate::middleware::request_id_middleware;
use crate::profile::{ProfileStore, StaticProfileStore};
use crate::upstream::UpstreamClient;
use axum::{
    Router, middleware,
    routing::{get, post},
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

pub mod chat;
pub mod extractor;
pub mod health;
pub mod metrics;

/// Application state shared across all handlers
///
/// Contains configuration, the injected profile store, the upstream client
/// and metrics. All fields are cheap to clone across Axum handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<Config>,
    profiles: Arc<dyn ProfileStore>,
    upstream: UpstreamClient,
    metrics: Arc<Metrics>,
}

impl AppState {
    /// Create a new AppState whose profiles come from the config file
    pub fn new(config: Arc<Config>) -> AppResult<Self> {
        let profiles = Arc::new(StaticProfileStore::from_entries(&config.profiles));
        Self::with_profile_store(config, profiles)
    }

    /// Create a new AppState with an explicit profile store
    pub fn with_profile_store(
        config: Arc<Config>,
        profiles: Arc<dyn ProfileStore>,
    ) -> AppResult<Self> {
        let upstream = UpstreamClient::new(&config.upstream)?;
        let metrics = Metrics::new()
            .map_err(|e| AppError::Internal(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            config,
            profiles,
            upstream,
            metrics: Arc::new(metrics),
        })
    }

    /// Get reference to the configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Get reference to the profile store
    pub fn profiles(&self) -> &dyn ProfileStore {
        self.profiles.as_ref()
    }

    /// Get reference to the upstream client
    pub fn upstream(&self) -> &UpstreamClient {
        &self.upstream
    }

    /// Get the shared metrics collector
    pub fn metrics(&self) -> &Arc<Metrics> {
        &self.metrics
    }
}

/// Build the full application router
///
/// Routes:
/// - `POST /api/chat/openai` - streaming chat relay
/// - `GET /health` - liveness probe
/// - `GET /metrics` - Prometheus scrape endpoint
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(chat::CHAT_ROUTE, post(chat::handler))
        .route("/health", get(health::handler))
        .route("/metrics", get(metrics::handler))
        .with_state(state)
        .layer(middleware::from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
}
