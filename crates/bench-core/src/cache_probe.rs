//! Prefix cache probe: the same prompt, sent strictly one after another.

use bench_backend::CompletionBackend;
use bench_common::config::CacheProbeSpec;
use bench_common::{BenchError, Result};
use serde::{Deserialize, Serialize};

use crate::stats::mean;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheProbeRecord {
    /// 1-based position in the probe sequence.
    pub request_num: usize,
    pub latency_ms: f64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheProbeResult {
    pub first_latency_ms: f64,
    pub avg_subsequent_ms: f64,
    pub improvement_pct: f64,
    pub requests: Vec<CacheProbeRecord>,
}

impl CacheProbeResult {
    /// Compares the cold first request against the mean of the rest.
    pub fn from_records(requests: Vec<CacheProbeRecord>) -> Self {
        let latencies: Vec<f64> = requests.iter().map(|r| r.latency_ms).collect();
        let first_latency_ms = latencies.first().copied().unwrap_or(0.0);
        let avg_subsequent_ms = if latencies.len() > 1 { mean(&latencies[1..]) } else { 0.0 };
        Self {
            first_latency_ms,
            avg_subsequent_ms,
            improvement_pct: improvement_pct(first_latency_ms, avg_subsequent_ms),
            requests,
        }
    }
}

/// Percentage drop from `first` to `subsequent`; 0 when `first` is not positive.
pub fn improvement_pct(first: f64, subsequent: f64) -> f64 {
    if first > 0.0 {
        (first - subsequent) / first * 100.0
    } else {
        0.0
    }
}

pub async fn probe_prefix_cache<B>(backend: &B, spec: &CacheProbeSpec) -> Result<CacheProbeResult>
where
    B: CompletionBackend,
{
    if spec.repeats == 0 {
        return Err(BenchError::InvalidScenario {
            label: "cache probe".into(),
            reason: "repeats must be at least 1".into(),
        });
    }
    tracing::info!(target: "cache_probe", prompt = %spec.prompt, repeats = spec.repeats, "sending identical requests");

    let mut records = Vec::with_capacity(spec.repeats);
    for i in 1..=spec.repeats {
        let outcome = backend.complete(&spec.prompt, spec.max_tokens).await;
        bench_obs::record(&outcome);
        let status = if outcome.success { "✓" } else { "✗" };
        tracing::info!(
            target: "cache_probe",
            request = i,
            status,
            latency_ms = %format!("{:.0}", outcome.latency_ms),
            "probe request"
        );
        records.push(CacheProbeRecord { request_num: i, latency_ms: outcome.latency_ms, success: outcome.success });
    }

    let result = CacheProbeResult::from_records(records);
    tracing::info!(
        target: "cache_probe",
        first_ms = %format!("{:.0}", result.first_latency_ms),
        avg_subsequent_ms = %format!("{:.0}", result.avg_subsequent_ms),
        speedup_pct = %format!("{:.1}", result.improvement_pct),
        "analysis"
    );
    if result.improvement_pct > 0.0 {
        tracing::info!(target: "cache_probe", "cache speedup detected");
    } else {
        tracing::warn!(target: "cache_probe", "no cache speedup detected");
    }
    Ok(result)
}
