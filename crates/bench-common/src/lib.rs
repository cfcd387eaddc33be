pub type Result<T> = core::result::Result<T, BenchError>;

#[derive(thiserror::Error, Debug)]
pub enum BenchError {
    #[error("pre-flight check failed: {0}")]
    PreflightFailed(String),
    #[error("invalid scenario `{label}`: {reason}")]
    InvalidScenario { label: String, reason: String },
    #[error("config: {0}")]
    Config(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("{0}")]
    Message(String),
}

impl BenchError {
    /// Process exit code for a run that ended with this error.
    pub fn exit_code(&self) -> i32 {
        1
    }
}

pub mod config {
    use serde::{Deserialize, Serialize};
    use std::env;
    use std::path::{Path, PathBuf};

    use crate::{BenchError, Result};

    pub const DEFAULT_MODEL: &str = "/mnt/models";
    pub const DEFAULT_OUTPUT_DIR: &str = "benchmarks/results";

    /// One load scenario: `requests` completions with at most `concurrency` in flight.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ScenarioSpec {
        pub requests: usize,
        pub concurrency: usize,
        pub label: String,
    }

    impl ScenarioSpec {
        pub fn new(requests: usize, concurrency: usize, label: impl Into<String>) -> Self {
            Self { requests, concurrency, label: label.into() }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct CacheProbeSpec {
        pub prompt: String,
        pub repeats: usize,
        pub max_tokens: u32,
    }

    impl Default for CacheProbeSpec {
        fn default() -> Self {
            Self {
                prompt: "Explain Kubernetes in one sentence:".into(),
                repeats: 5,
                max_tokens: 30,
            }
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(default)]
    pub struct BenchConfig {
        pub model: String,
        pub output_dir: PathBuf,
        pub request_timeout_secs: u64,
        pub temperature: f64,
        pub prompt: String,
        pub max_tokens: u32,
        pub preflight_prompt: String,
        pub scenarios: Vec<ScenarioSpec>,
        pub cache_probe: CacheProbeSpec,
    }

    impl Default for BenchConfig {
        fn default() -> Self {
            Self {
                model: DEFAULT_MODEL.into(),
                output_dir: PathBuf::from(DEFAULT_OUTPUT_DIR),
                request_timeout_secs: 60,
                temperature: 0.7,
                prompt: "Explain quantum computing in one sentence:".into(),
                max_tokens: 50,
                preflight_prompt: "Hello".into(),
                scenarios: vec![
                    ScenarioSpec::new(5, 1, "Baseline"),
                    ScenarioSpec::new(20, 5, "Light load"),
                    ScenarioSpec::new(50, 10, "Medium load"),
                    ScenarioSpec::new(100, 20, "Heavy load"),
                ],
                cache_probe: CacheProbeSpec::default(),
            }
        }
    }

    impl BenchConfig {
        /// Reads `path` (or `BENCH_CONFIG`) if given, otherwise starts from defaults,
        /// then applies `BENCH_*` environment overrides.
        pub fn load(path: Option<&Path>) -> Result<Self> {
            let path = path
                .map(Path::to_path_buf)
                .or_else(|| env::var_os("BENCH_CONFIG").map(PathBuf::from));
            let mut cfg = match path {
                Some(p) => Self::from_file(&p)?,
                None => Self::default(),
            };
            cfg.apply_overrides(|key| env::var(key).ok());
            cfg.validate()?;
            Ok(cfg)
        }

        pub fn from_file(path: &Path) -> Result<Self> {
            let text = std::fs::read_to_string(path)
                .map_err(|e| BenchError::Config(format!("read {}: {}", path.display(), e)))?;
            serde_yaml::from_str(&text)
                .map_err(|e| BenchError::Config(format!("parse {}: {}", path.display(), e)))
        }

        pub fn apply_overrides<F>(&mut self, lookup: F)
        where
            F: Fn(&str) -> Option<String>,
        {
            if let Some(v) = lookup("BENCH_MODEL") { self.model = v; }
            if let Some(v) = lookup("BENCH_OUTPUT_DIR") { self.output_dir = PathBuf::from(v); }
            if let Some(v) = lookup("BENCH_TIMEOUT_SECS").and_then(|v| v.parse().ok()) { self.request_timeout_secs = v; }
            if let Some(v) = lookup("BENCH_TEMPERATURE").and_then(|v| v.parse().ok()) { self.temperature = v; }
            if let Some(v) = lookup("BENCH_CACHE_REPEATS").and_then(|v| v.parse().ok()) { self.cache_probe.repeats = v; }
        }

        pub fn validate(&self) -> Result<()> {
            for s in &self.scenarios {
                if s.requests == 0 || s.concurrency == 0 {
                    return Err(BenchError::Config(format!(
                        "scenario `{}` needs at least one request and a concurrency of at least one",
                        s.label
                    )));
                }
            }
            if self.cache_probe.repeats == 0 {
                return Err(BenchError::Config("cache_probe.repeats must be at least 1".into()));
            }
            if self.request_timeout_secs == 0 {
                return Err(BenchError::Config("request_timeout_secs must be positive".into()));
            }
            Ok(())
        }
    }
}
