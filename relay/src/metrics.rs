//! # Prometheus Metrics
//!
//! Operational metrics for the relay, scraped at the `/metrics` HTTP
//! endpoint on the configured metrics port.
//!
//! All metrics live in a dedicated [`prometheus::Registry`] with the
//! `flux` namespace so they do not collide with any default global
//! registry consumers.

use axum::http::StatusCode;
use axum::response::IntoResponse;
use prometheus::{
    Encoder, Histogram, HistogramOpts, IntCounter, IntCounterVec, IntGauge, Opts, Registry,
    TextEncoder,
};
use std::sync::Arc;

/// Holds all Prometheus metric handles for the relay.
///
/// Clone-friendly (wraps `Arc` internally via prometheus handles) so it can
/// be shared across request handlers.
#[derive(Clone)]
pub struct RelayMetrics {
    /// Prometheus registry that owns all metrics below.
    registry: Registry,
    /// Total relay submissions received, accepted or not.
    pub relay_requests_total: IntCounter,
    /// Rejected submissions, labeled by rejection reason.
    pub relay_rejections_total: IntCounterVec,
    /// Successful ledger credits.
    pub credits_total: IntCounter,
    /// Sum of credited amounts in micros.
    pub credited_micros_total: IntCounter,
    /// Number of materialized ledger accounts.
    pub accounts: IntGauge,
    /// Histogram of relay pipeline latency in seconds.
    pub relay_latency_seconds: Histogram,
}

impl RelayMetrics {
    /// Creates and registers all metrics. Call once at startup.
    pub fn new() -> Self {
        let registry = Registry::new_custom(Some("flux".into()), None)
            .expect("failed to create prometheus registry");

        let relay_requests_total = IntCounter::new(
            "relay_requests_total",
            "Total number of relay submissions received",
        )
        .expect("metric creation");
        registry
            .register(Box::new(relay_requests_total.clone()))
            .expect("metric registration");

        let relay_rejections_total = IntCounterVec::new(
            Opts::new(
                "relay_rejections_total",
                "Rejected relay submissions by reason",
            ),
            &["reason"],
        )
        .expect("metric creation");
        registry
            .register(Box::new(relay_rejections_total.clone()))
            .expect("metric registration");

        let credits_total =
            IntCounter::new("credits_total", "Total number of successful ledger credits")
                .expect("metric creation");
        registry
            .register(Box::new(credits_total.clone()))
            .expect("metric registration");

        let credited_micros_total = IntCounter::new(
            "credited_micros_total",
            "Sum of credited amounts in micro-units",
        )
        .expect("metric creation");
        registry
            .register(Box::new(credited_micros_total.clone()))
            .expect("metric registration");

        let accounts = IntGauge::new("accounts", "Number of materialized ledger accounts")
            .expect("metric creation");
        registry
            .register(Box::new(accounts.clone()))
            .expect("metric registration");

        let relay_latency_seconds = Histogram::with_opts(
            HistogramOpts::new(
                "relay_latency_seconds",
                "End-to-end relay pipeline latency in seconds",
            )
            .buckets(vec![
                0.001, 0.005, 0.01, 0.025, 0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0,
            ]),
        )
        .expect("metric creation");
        registry
            .register(Box::new(relay_latency_seconds.clone()))
            .expect("metric registration");

        Self {
            registry,
            relay_requests_total,
            relay_rejections_total,
            credits_total,
            credited_micros_total,
            accounts,
            relay_latency_seconds,
        }
    }

    /// Encodes all registered metrics into the Prometheus text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer).expect("prometheus output is valid utf-8"))
    }
}

impl Default for RelayMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Shared metrics state passed to axum handlers.
pub type SharedMetrics = Arc<RelayMetrics>;

/// Axum handler that renders `/metrics` in Prometheus text format.
///
/// Returns HTTP 500 if encoding fails (should never happen in practice).
pub async fn metrics_handler(
    axum::extract::State(metrics): axum::extract::State<SharedMetrics>,
) -> impl IntoResponse {
    match metrics.encode() {
        Ok(body) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
            body,
        )
            .into_response(),
        Err(e) => {
            tracing::error!("failed to encode metrics: {}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "metrics encoding failed").into_response()
        }
    }
}
