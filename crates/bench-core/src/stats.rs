//! Aggregate latency and throughput metrics for one load scenario.

use std::time::Duration;

use bench_backend::Outcome;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioMetrics {
    pub total_requests: usize,
    pub concurrency: usize,
    pub successful_requests: usize,
    pub failed_requests: usize,
    pub total_time_sec: f64,
    pub throughput_rps: f64,
    pub latency_mean_ms: f64,
    pub latency_median_ms: f64,
    pub latency_p95_ms: f64,
    pub latency_p99_ms: f64,
    pub latency_min_ms: f64,
    pub latency_max_ms: f64,
    pub latency_stddev_ms: f64,
}

impl ScenarioMetrics {
    /// Latency figures cover every outcome, failed ones included.
    pub fn from_outcomes(outcomes: &[Outcome], concurrency: usize, total_time: Duration) -> Self {
        let mut latencies: Vec<f64> = outcomes.iter().map(|o| o.latency_ms).collect();
        latencies.sort_by(|a, b| a.total_cmp(b));

        let total_requests = outcomes.len();
        let successful_requests = outcomes.iter().filter(|o| o.success).count();
        let total_time_sec = total_time.as_secs_f64();
        let throughput_rps = if total_time_sec > 0.0 { total_requests as f64 / total_time_sec } else { 0.0 };

        Self {
            total_requests,
            concurrency,
            successful_requests,
            failed_requests: total_requests - successful_requests,
            total_time_sec,
            throughput_rps,
            latency_mean_ms: mean(&latencies),
            latency_median_ms: median(&latencies),
            latency_p95_ms: nearest_rank(&latencies, 0.95),
            latency_p99_ms: nearest_rank(&latencies, 0.99),
            latency_min_ms: latencies.first().copied().unwrap_or(0.0),
            latency_max_ms: latencies.last().copied().unwrap_or(0.0),
            latency_stddev_ms: sample_stddev(&latencies),
        }
    }

    pub fn success_rate_pct(&self) -> f64 {
        if self.total_requests == 0 {
            return 0.0;
        }
        self.successful_requests as f64 / self.total_requests as f64 * 100.0
    }
}

/// Zero-based `floor(q * len)`, clamped to the last index.
pub fn percentile_index(len: usize, q: f64) -> usize {
    let idx = (len as f64 * q).floor() as usize;
    idx.min(len.saturating_sub(1))
}

/// `sorted` must be ascending.
pub fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    sorted[percentile_index(sorted.len(), q)]
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// `sorted` must be ascending. Even lengths average the two middle samples.
pub fn median(sorted: &[f64]) -> f64 {
    let n = sorted.len();
    match n {
        0 => 0.0,
        _ if n % 2 == 1 => sorted[n / 2],
        _ => (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0,
    }
}

/// Sample standard deviation (n - 1); 0 for fewer than two samples.
pub fn sample_stddev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let m = mean(values);
    let ss: f64 = values.iter().map(|v| (v - m) * (v - m)).sum();
    (ss / (values.len() - 1) as f64).sqrt()
}
