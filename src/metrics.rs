//! Prometheus metrics collection for chat-relay
//!
//! This module provides metrics instrumentation for tracking:
//! - Request outcomes (streamed vs. each error class)
//! - Latency until the upstream stream starts
//! - Fragments relayed and streams that broke after headers were sent
//!
//! Metrics are exposed via the `/metrics` endpoint in Prometheus text format.

use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};
use std::sync::Arc;

/// Request outcome for type-safe metrics labels
///
/// Restricts the `outcome` label to a fixed set of values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Upstream stream started and was handed to the client
    Streamed,
    InvalidBody,
    ProfileMissing,
    ProfileLookupFailed,
    KeyMissing,
    KeyInvalid,
    UpstreamError,
    Internal,
}

impl Outcome {
    /// Convert outcome to Prometheus label string
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Streamed => "streamed",
            Outcome::InvalidBody => "invalid_body",
            Outcome::ProfileMissing => "profile_missing",
            Outcome::ProfileLookupFailed => "profile_lookup_failed",
            Outcome::KeyMissing => "key_missing",
            Outcome::KeyInvalid => "key_invalid",
            Outcome::UpstreamError => "upstream_error",
            Outcome::Internal => "internal",
        }
    }
}

/// Metrics collector for chat-relay
#[derive(Clone)]
pub struct Metrics {
    pub registry: Arc<Registry>,
    requests_total: IntCounterVec,
    upstream_start_duration: Histogram,
    fragments_relayed: IntCounter,
    mid_stream_failures: IntCounter,
}

impl Metrics {
    /// Create a new Metrics instance
    ///
    /// Registers all metrics with a new Prometheus registry.
    ///
    /// # Errors
    ///
    /// Returns an error if metric registration fails (e.g., duplicate names).
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        // Cardinality: one series per Outcome variant (8)
        let requests_total = IntCounterVec::new(
            Opts::new(
                "chat_relay_requests_total",
                "Total number of chat relay requests by outcome",
            ),
            &["outcome"],
        )?;

        let upstream_start_duration = Histogram::with_opts(
            HistogramOpts::new(
                "chat_relay_upstream_start_duration_ms",
                "Time from request receipt until the upstream stream started, in milliseconds",
            )
            .buckets(vec![
                10.0, 50.0, 100.0, 250.0, 500.0, 1000.0, 2500.0, 5000.0, 10000.0,
            ]),
        )?;

        let fragments_relayed = IntCounter::with_opts(Opts::new(
            "chat_relay_fragments_relayed_total",
            "Total number of text fragments forwarded to clients",
        ))?;

        // Failures after the 200 response has been committed; the client sees a
        // truncated body rather than a JSON error.
        let mid_stream_failures = IntCounter::with_opts(Opts::new(
            "chat_relay_mid_stream_failures_total",
            "Total number of upstream streams that failed after the response started",
        ))?;

        registry.register(Box::new(requests_total.clone()))?;
        registry.register(Box::new(upstream_start_duration.clone()))?;
        registry.register(Box::new(fragments_relayed.clone()))?;
        registry.register(Box::new(mid_stream_failures.clone()))?;

        Ok(Self {
            registry: Arc::new(registry),
            requests_total,
            upstream_start_duration,
            fragments_relayed,
            mid_stream_failures,
        })
    }

    /// Record the outcome of a relay request
    ///
    /// # Errors
    ///
    /// Returns an error if the metric is not registered.
    pub fn record_outcome(&self, outcome: Outcome) -> Result<(), prometheus::Error> {
        self.requests_total
            .get_metric_with_label_values(&[outcome.as_str()])?
            .inc();
        Ok(())
    }

    /// Record how long it took for the upstream stream to start
    ///
    /// # Errors
    ///
    /// Returns an error if `duration_ms` is NaN, infinite, or negative. Such
    /// values would corrupt every percentile of the histogram.
    pub fn record_upstream_start(&self, duration_ms: f64) -> Result<(), prometheus::Error> {
        if !duration_ms.is_finite() {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be finite (not NaN or Infinity), got: {}",
                duration_ms
            )));
        }
        if duration_ms < 0.0 {
            return Err(prometheus::Error::Msg(format!(
                "Histogram value must be non-negative, got: {}",
                duration_ms
            )));
        }

        self.upstream_start_duration.observe(duration_ms);
        Ok(())
    }

    /// Count one fragment forwarded to a client
    pub fn fragment_relayed(&self) {
        self.fragments_relayed.inc();
    }

    /// Count one stream that failed after the response started
    pub fn mid_stream_failure(&self) {
        self.mid_stream_failures.inc();
    }

    /// Number of outcome records for a given outcome (used by tests and health)
    pub fn outcome_count(&self, outcome: Outcome) -> u64 {
        self.requests_total
            .get_metric_with_label_values(&[outcome.as_str()])
            .map(|c| c.get())
            .unwrap_or(0)
    }

    /// Number of fragments relayed so far
    pub fn fragments_relayed_count(&self) -> u64 {
        self.fragments_relayed.get()
    }

    /// Number of mid-stream failures so far
    pub fn mid_stream_failures_count(&self) -> u64 {
        self.mid_stream_failures.get()
    }

    /// Gather all metrics in Prometheus text format
    pub fn gather(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| {
            prometheus::Error::Msg(format!("Metrics output is not valid UTF-8: {}", e))
        })
    }
}
