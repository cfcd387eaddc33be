use std::collections::HashMap;
use std::io::Write;

use bench_common::config::{BenchConfig, ScenarioSpec};
use bench_common::BenchError;

#[test]
fn defaults_match_the_fixed_scenario_list() {
    let cfg = BenchConfig::default();
    let labels: Vec<_> = cfg.scenarios.iter().map(|s| (s.requests, s.concurrency, s.label.as_str())).collect();
    assert_eq!(
        labels,
        vec![(5, 1, "Baseline"), (20, 5, "Light load"), (50, 10, "Medium load"), (100, 20, "Heavy load")]
    );
    assert_eq!(cfg.model, "/mnt/models");
    assert_eq!(cfg.request_timeout_secs, 60);
    assert_eq!(cfg.cache_probe.repeats, 5);
    assert_eq!(cfg.cache_probe.max_tokens, 30);
    assert!(cfg.validate().is_ok());
}

#[test]
fn env_overrides_replace_only_parsable_values() {
    let vars: HashMap<&str, &str> = [
        ("BENCH_MODEL", "qwen"),
        ("BENCH_TIMEOUT_SECS", "5"),
        ("BENCH_TEMPERATURE", "not-a-number"),
        ("BENCH_CACHE_REPEATS", "3"),
    ]
    .into_iter()
    .collect();
    let mut cfg = BenchConfig::default();
    cfg.apply_overrides(|k| vars.get(k).map(|v| v.to_string()));
    assert_eq!(cfg.model, "qwen");
    assert_eq!(cfg.request_timeout_secs, 5);
    assert_eq!(cfg.temperature, 0.7);
    assert_eq!(cfg.cache_probe.repeats, 3);
}

#[test]
fn partial_yaml_keeps_defaults() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "scenarios:\n  - {{ requests: 2, concurrency: 2, label: smoke }}\nmax_tokens: 8").unwrap();
    let cfg = BenchConfig::from_file(file.path()).unwrap();
    assert_eq!(cfg.scenarios, vec![ScenarioSpec::new(2, 2, "smoke")]);
    assert_eq!(cfg.max_tokens, 8);
    assert_eq!(cfg.cache_probe.prompt, "Explain Kubernetes in one sentence:");
}

#[test]
fn unreadable_config_is_an_error() {
    let err = BenchConfig::from_file(std::path::Path::new("/nonexistent/bench.yaml")).unwrap_err();
    assert!(matches!(err, BenchError::Config(_)));
    assert_eq!(err.exit_code(), 1);
}

#[test]
fn zero_concurrency_fails_validation() {
    let mut cfg = BenchConfig::default();
    cfg.scenarios.push(ScenarioSpec::new(10, 0, "broken"));
    assert!(matches!(cfg.validate(), Err(BenchError::Config(_))));
}
