//! Run report: one JSON record plus one plain-text summary per run.

use std::fmt::Write as _;
use std::fs::OpenOptions;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};

use bench_common::Result;
use serde::{Deserialize, Serialize};

use crate::cache_probe::CacheProbeResult;
use crate::stats::ScenarioMetrics;

pub const TIMESTAMP_FORMAT: &str = "%Y%m%d_%H%M%S";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunMetadata {
    pub timestamp: String,
    pub endpoint: String,
    pub model: String,
}

impl RunMetadata {
    /// Stamps the current local time as `YYYYMMDD_HHMMSS`.
    pub fn stamp(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            timestamp: chrono::Local::now().format(TIMESTAMP_FORMAT).to_string(),
            endpoint: endpoint.into(),
            model: model.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioReport {
    pub description: String,
    pub metrics: ScenarioMetrics,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub metadata: RunMetadata,
    pub scenarios: Vec<ScenarioReport>,
    pub cache_test: CacheProbeResult,
}

impl RunReport {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPaths {
    pub json: PathBuf,
    pub summary: PathBuf,
}

/// Where a run landed on disk, plus the summary text that was written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrittenReport {
    pub paths: ReportPaths,
    pub summary: String,
}

pub struct ReportWriter {
    dir: PathBuf,
}

impl ReportWriter {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn paths_for(&self, timestamp: &str) -> ReportPaths {
        ReportPaths {
            json: self.dir.join(format!("benchmark_{}.json", timestamp)),
            summary: self.dir.join(format!("benchmark_summary_{}.txt", timestamp)),
        }
    }

    /// Creates the output directory on first use. Never overwrites an
    /// earlier run: an existing file with the same timestamp is an `Io` error.
    pub fn write(&self, report: &RunReport) -> Result<WrittenReport> {
        std::fs::create_dir_all(&self.dir)?;
        let paths = self.paths_for(&report.metadata.timestamp);
        if let Some(existing) = [&paths.json, &paths.summary].into_iter().find(|p| p.exists()) {
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("{} already exists", existing.display()),
            )
            .into());
        }

        let json = serde_json::to_string_pretty(report)?;
        write_new(&paths.json, json.as_bytes())?;

        let generated_at = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let summary = render_summary(report, &generated_at);
        write_new(&paths.summary, summary.as_bytes())?;

        tracing::info!(target: "report", json = %paths.json.display(), summary = %paths.summary.display(), "results saved");
        Ok(WrittenReport { paths, summary })
    }
}

fn write_new(path: &Path, contents: &[u8]) -> io::Result<()> {
    let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
    file.write_all(contents)
}

/// Display rounding only; the JSON record keeps full precision.
pub fn render_summary(report: &RunReport, generated_at: &str) -> String {
    let rule = "=".repeat(60);
    let mut s = String::new();
    let _ = writeln!(s, "{}", rule);
    let _ = writeln!(s, "  Inference Benchmark Summary");
    let _ = writeln!(s, "{}", rule);
    let _ = writeln!(s, "Date: {}", generated_at);
    let _ = writeln!(s, "Endpoint: {}", report.metadata.endpoint);
    let _ = writeln!(s, "Model: {}", report.metadata.model);
    let _ = writeln!(s);

    for scenario in &report.scenarios {
        let m = &scenario.metrics;
        let _ = writeln!(s, "\n{}:", scenario.description);
        let _ = writeln!(s, "  Requests: {}, Concurrency: {}", m.total_requests, m.concurrency);
        let _ = writeln!(s, "  Throughput: {:.2} req/sec", m.throughput_rps);
        let _ = writeln!(s, "  Latency (mean): {:.0} ms", m.latency_mean_ms);
        let _ = writeln!(s, "  Latency (P95): {:.0} ms", m.latency_p95_ms);
        let _ = writeln!(s, "  Success rate: {}/{}", m.successful_requests, m.total_requests);
    }

    let cache = &report.cache_test;
    let _ = writeln!(s, "\n\nPrefix Cache Test:");
    let _ = writeln!(s, "  First request: {:.0} ms", cache.first_latency_ms);
    let _ = writeln!(s, "  Avg subsequent: {:.0} ms", cache.avg_subsequent_ms);
    let _ = writeln!(s, "  Speedup: {:.2}%", cache.improvement_pct);
    s
}
