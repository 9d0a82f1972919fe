//! Prometheus metrics
//!
//! Routing outcomes are counted per provider and model so fallback rates
//! and provider health can be watched from outside the process.

use std::time::Duration;

use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::Lazy;

use crate::tiers::types::{ModelRef, Provider, Tier};

/// Global Prometheus handle for metrics export
static PROMETHEUS_HANDLE: Lazy<PrometheusHandle> = Lazy::new(|| {
    PrometheusBuilder::new()
        .install_recorder()
        .expect("Failed to install Prometheus recorder")
});

/// Initialize metrics (call once at startup)
pub fn init_metrics() {
    let _ = &*PROMETHEUS_HANDLE;
    register_metrics();
}

fn register_metrics() {
    metrics::describe_counter!(
        "callmate_route_attempts_total",
        "Provider attempts made while routing, by outcome"
    );
    metrics::describe_counter!(
        "callmate_route_fallbacks_total",
        "Requests served by a fallback model"
    );
    metrics::describe_counter!(
        "callmate_route_exhausted_total",
        "Requests for which every model in the chain failed"
    );
    metrics::describe_histogram!(
        "callmate_provider_call_duration_seconds",
        "Provider call duration in seconds"
    );
}

/// Metrics in Prometheus text format
pub fn render() -> String {
    PROMETHEUS_HANDLE.render()
}

/// Record one provider attempt; `outcome` is "success" or a failure reason
pub fn record_attempt(target: &ModelRef, outcome: &str) {
    metrics::counter!(
        "callmate_route_attempts_total",
        "provider" => target.provider.as_str(),
        "model" => target.model.clone(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn record_fallback(tier: Tier) {
    metrics::counter!("callmate_route_fallbacks_total", "tier" => tier.as_str()).increment(1);
}

pub fn record_exhausted(tier: Tier) {
    metrics::counter!("callmate_route_exhausted_total", "tier" => tier.as_str()).increment(1);
}

pub fn record_call_duration(provider: Provider, elapsed: Duration) {
    metrics::histogram!(
        "callmate_provider_call_duration_seconds",
        "provider" => provider.as_str()
    )
    .record(elapsed.as_secs_f64());
}
