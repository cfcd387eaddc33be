//! Load driver: N requests through a worker pool bounded to C in flight.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;

use bench_backend::{CompletionBackend, Outcome};
use bench_common::config::ScenarioSpec;
use bench_common::{BenchError, Result};
use tokio::sync::mpsc;

use crate::stats::ScenarioMetrics;

/// Runs one scenario and aggregates its outcomes. The worker pool lives only
/// for the duration of this call.
pub async fn run_scenario<B>(
    backend: Arc<B>,
    scenario: &ScenarioSpec,
    prompt: &str,
    max_tokens: u32,
) -> Result<ScenarioMetrics>
where
    B: CompletionBackend + 'static,
{
    let n = scenario.requests;
    let c = scenario.concurrency;
    if n == 0 || c == 0 {
        return Err(BenchError::InvalidScenario {
            label: scenario.label.clone(),
            reason: format!("requests={} concurrency={}", n, c),
        });
    }
    tracing::info!(target: "driver", scenario = %scenario.label, requests = n, concurrency = c, "starting scenario");

    let started = Instant::now();
    let (tx, mut rx) = mpsc::channel::<Outcome>(n);
    let next_slot = Arc::new(AtomicUsize::new(0));
    let prompt: Arc<str> = Arc::from(prompt);

    let mut workers = Vec::with_capacity(c.min(n));
    for _ in 0..c.min(n) {
        let backend = backend.clone();
        let next_slot = next_slot.clone();
        let prompt = prompt.clone();
        let tx = tx.clone();
        workers.push(tokio::spawn(async move {
            while next_slot.fetch_add(1, Ordering::Relaxed) < n {
                let outcome = backend.complete(&prompt, max_tokens).await;
                if tx.send(outcome).await.is_err() {
                    break;
                }
            }
        }));
    }
    drop(tx);

    let progress_every = (n / 10).max(1);
    let mut outcomes = Vec::with_capacity(n);
    let mut successful = 0usize;
    while let Some(outcome) = rx.recv().await {
        bench_obs::record(&outcome);
        if outcome.success {
            successful += 1;
        }
        outcomes.push(outcome);
        if outcomes.len() % progress_every == 0 {
            tracing::info!(target: "driver", completed = outcomes.len(), total = n, successful, "progress");
        }
    }
    let total_time = started.elapsed();

    for worker in workers {
        worker
            .await
            .map_err(|e| BenchError::Message(format!("scenario `{}` worker failed: {}", scenario.label, e)))?;
    }
    if outcomes.len() != n {
        return Err(BenchError::Message(format!(
            "scenario `{}` collected {} of {} outcomes",
            scenario.label,
            outcomes.len(),
            n
        )));
    }

    let metrics = ScenarioMetrics::from_outcomes(&outcomes, c, total_time);
    log_metrics(&scenario.label, &metrics);
    Ok(metrics)
}

fn log_metrics(label: &str, m: &ScenarioMetrics) {
    tracing::info!(
        target: "driver",
        scenario = %label,
        total_time_sec = %format!("{:.2}", m.total_time_sec),
        throughput_rps = %format!("{:.2}", m.throughput_rps),
        successful = m.successful_requests,
        total = m.total_requests,
        success_rate_pct = %format!("{:.1}", m.success_rate_pct()),
        "scenario finished"
    );
    tracing::info!(
        target: "driver",
        scenario = %label,
        mean_ms = %format!("{:.0}", m.latency_mean_ms),
        median_ms = %format!("{:.0}", m.latency_median_ms),
        p95_ms = %format!("{:.0}", m.latency_p95_ms),
        p99_ms = %format!("{:.0}", m.latency_p99_ms),
        min_ms = %format!("{:.0}", m.latency_min_ms),
        max_ms = %format!("{:.0}", m.latency_max_ms),
        stddev_ms = %format!("{:.0}", m.latency_stddev_ms),
        "latency distribution"
    );
}
