use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use bench_backend::http::HttpCompletionClient;
use bench_backend::mock::MockBackend;
use bench_backend::Outcome;
use bench_common::config::{BenchConfig, CacheProbeSpec, ScenarioSpec};
use bench_common::BenchError;
use bench_core::{run_scenario, Orchestrator, RunReport};
use serde_json::{json, Value};

async fn spawn(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move { axum::serve(listener, app).await.unwrap(); });
    format!("http://{}:{}", addr.ip(), addr.port())
}

async fn completions_ok(State(hits): State<Arc<AtomicUsize>>, Json(_body): Json<Value>) -> Json<Value> {
    hits.fetch_add(1, Ordering::SeqCst);
    Json(json!({"choices": [{"text": " fixed reply"}]}))
}

async fn completions_500(State(hits): State<Arc<AtomicUsize>>) -> (StatusCode, &'static str) {
    hits.fetch_add(1, Ordering::SeqCst);
    (StatusCode::INTERNAL_SERVER_ERROR, "boom")
}

fn http_client(base: &str, cfg: &BenchConfig) -> Arc<HttpCompletionClient> {
    Arc::new(HttpCompletionClient::from_config(reqwest::Client::new(), base, cfg))
}

#[tokio::test]
async fn baseline_scenario_against_a_healthy_endpoint() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(Router::new().route("/v1/completions", post(completions_ok)).with_state(hits.clone())).await;
    let client = http_client(&base, &BenchConfig::default());

    let m = run_scenario(client, &ScenarioSpec::new(5, 1, "Baseline"), "Explain", 50).await.unwrap();
    assert_eq!(m.successful_requests, 5);
    assert_eq!(m.failed_requests, 0);
    assert!(m.latency_stddev_ms >= 0.0);
    assert_eq!(hits.load(Ordering::SeqCst), 5);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn full_run_writes_both_files_in_scenario_order() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(Router::new().route("/v1/completions", post(completions_ok)).with_state(hits.clone())).await;
    let dir = tempfile::tempdir().unwrap();
    let cfg = BenchConfig { output_dir: dir.path().join("results"), ..BenchConfig::default() };

    let artifacts = Orchestrator::new(http_client(&base, &cfg), cfg.clone(), base.clone()).run().await.unwrap();

    let labels: Vec<_> = artifacts.report.scenarios.iter().map(|s| s.description.as_str()).collect();
    assert_eq!(labels, vec!["Baseline", "Light load", "Medium load", "Heavy load"]);
    for s in &artifacts.report.scenarios {
        assert_eq!(s.metrics.successful_requests + s.metrics.failed_requests, s.metrics.total_requests);
        assert_eq!(s.metrics.failed_requests, 0);
    }
    assert_eq!(artifacts.report.cache_test.requests.len(), 5);
    assert_eq!(artifacts.report.metadata.endpoint, base);
    assert_eq!(artifacts.report.metadata.model, "/mnt/models");
    // pre-flight + 5 + 20 + 50 + 100 + cache probe
    assert_eq!(hits.load(Ordering::SeqCst), 1 + 175 + 5);

    assert!(artifacts.paths.summary.exists());
    assert_eq!(std::fs::read_to_string(&artifacts.paths.summary).unwrap(), artifacts.summary);
    assert!(artifacts.summary.contains("Heavy load:"));
    assert_eq!(RunReport::load(&artifacts.paths.json).unwrap(), artifacts.report);
}

#[tokio::test]
async fn failing_preflight_aborts_with_exit_code_one_and_no_files() {
    let hits = Arc::new(AtomicUsize::new(0));
    let base = spawn(Router::new().route("/v1/completions", post(completions_500)).with_state(hits.clone())).await;
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("results");
    let cfg = BenchConfig { output_dir: out.clone(), ..BenchConfig::default() };

    let err = Orchestrator::new(http_client(&base, &cfg), cfg, base).run().await.unwrap_err();

    assert!(matches!(err, BenchError::PreflightFailed(ref d) if d.contains("500")), "{:?}", err);
    assert_eq!(err.exit_code(), 1);
    assert_eq!(hits.load(Ordering::SeqCst), 1);
    assert!(!out.exists());
}

#[tokio::test]
async fn unreachable_endpoint_fails_preflight() {
    let listener = tokio::net::TcpListener::bind(("127.0.0.1", 0)).await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);
    let dir = tempfile::tempdir().unwrap();
    let cfg = BenchConfig { output_dir: dir.path().join("results"), ..BenchConfig::default() };

    let err = Orchestrator::new(http_client(&base, &cfg), cfg, base).run().await.unwrap_err();
    assert!(matches!(err, BenchError::PreflightFailed(_)));
}

#[tokio::test]
async fn scenario_failures_do_not_abort_the_run() {
    let mut script = vec![Outcome::success(5.0, "pre-flight")];
    script.extend((0..4).map(|_| Outcome::failure(1.0, "HTTP 503")));
    let backend = Arc::new(MockBackend::scripted(script, Outcome::success(9.0, "ok")));
    let dir = tempfile::tempdir().unwrap();
    let cfg = BenchConfig {
        output_dir: dir.path().to_path_buf(),
        scenarios: vec![ScenarioSpec::new(4, 2, "all failing"), ScenarioSpec::new(3, 3, "recovered")],
        cache_probe: CacheProbeSpec { repeats: 2, ..CacheProbeSpec::default() },
        ..BenchConfig::default()
    };

    let artifacts = Orchestrator::new(backend.clone(), cfg, "mock://").run().await.unwrap();
    assert_eq!(artifacts.report.scenarios[0].metrics.failed_requests, 4);
    assert_eq!(artifacts.report.scenarios[1].metrics.successful_requests, 3);

    let calls = backend.calls();
    assert_eq!(calls[0].prompt, "Hello");
    assert_eq!(calls[0].max_tokens, 1);
    assert_eq!(calls.len(), 1 + 4 + 3 + 2);
    assert!(calls[calls.len() - 2..].iter().all(|c| c.max_tokens == 30));
}
