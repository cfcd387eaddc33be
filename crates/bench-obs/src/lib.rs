//! Observability utilities: request outcome counters and latency histogram

use bench_backend::Outcome;
use once_cell::sync::Lazy;
use prometheus::{Encoder, Histogram, IntCounterVec, TextEncoder};

static REQUESTS_TOTAL: Lazy<IntCounterVec> = Lazy::new(|| {
    prometheus::register_int_counter_vec!(
        "bench_requests_total",
        "Completion requests issued, by outcome",
        &["outcome"]
    )
    .expect("counter")
});

static REQUEST_LATENCY: Lazy<Histogram> = Lazy::new(|| {
    prometheus::register_histogram!(
        "bench_request_latency_seconds",
        "Wall-clock latency of completion requests",
        vec![0.05, 0.1, 0.25, 0.5, 1.0, 2.5, 5.0, 10.0, 30.0, 60.0]
    )
    .expect("histogram")
});

pub fn init() {
    let _ = &*REQUESTS_TOTAL;
    let _ = &*REQUEST_LATENCY;
}

pub fn record(outcome: &Outcome) {
    let label = if outcome.success { "success" } else { "failure" };
    REQUESTS_TOTAL.with_label_values(&[label]).inc();
    REQUEST_LATENCY.observe(outcome.latency_ms / 1000.0);
}

pub fn requests_total(success: bool) -> u64 {
    REQUESTS_TOTAL
        .with_label_values(&[if success { "success" } else { "failure" }])
        .get()
}

/// Prometheus text exposition of everything in the default registry.
pub fn render() -> String {
    let encoder = TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&prometheus::gather(), &mut buffer) {
        tracing::warn!(target: "obs", error = %e, "failed to encode metrics");
        return String::new();
    }
    String::from_utf8_lossy(&buffer).into_owned()
}
