use std::net::SocketAddr;

use anyhow::Context;
use metrics::{counter, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Start the Prometheus HTTP exporter on `addr`.
/// Without it the macros below are no-ops.
pub fn init_metrics_server(addr: SocketAddr) -> anyhow::Result<()> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .with_context(|| format!("failed to start Prometheus metrics server on {addr}"))
}

// ── Cache metrics ────────────────────────────────────────────────

pub fn record_cache_lookup(hit: bool) {
    let outcome = if hit { "hit" } else { "miss" };
    counter!("price_cache_lookups_total", "outcome" => outcome).increment(1);
}

// ── Provider metrics ─────────────────────────────────────────────

/// `outcome` is one of `ok`, `empty`, `error`.
pub fn record_provider_request(provider: &str, outcome: &'static str) {
    counter!("provider_requests_total", "provider" => provider.to_string(), "outcome" => outcome)
        .increment(1);
}

pub fn record_provider_latency(provider: &str, latency_ms: f64) {
    histogram!("provider_request_latency_ms", "provider" => provider.to_string()).record(latency_ms);
}

// ── Session metrics ──────────────────────────────────────────────

pub fn record_evaluation(trigger: &'static str) {
    counter!("evaluations_total", "trigger" => trigger).increment(1);
}
