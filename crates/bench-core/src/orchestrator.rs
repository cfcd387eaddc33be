//! Run sequencing: pre-flight, load scenarios, cache probe, report.

use std::sync::Arc;

use bench_backend::{CompletionBackend, Outcome};
use bench_common::config::BenchConfig;
use bench_common::{BenchError, Result};

use crate::cache_probe::probe_prefix_cache;
use crate::driver::run_scenario;
use crate::report::{ReportPaths, ReportWriter, RunMetadata, RunReport, ScenarioReport};

#[derive(Debug, Clone)]
pub struct RunArtifacts {
    pub report: RunReport,
    pub paths: ReportPaths,
    /// Text written to the summary file.
    pub summary: String,
}

pub struct Orchestrator<B> {
    backend: Arc<B>,
    config: BenchConfig,
    endpoint: String,
}

impl<B> Orchestrator<B>
where
    B: CompletionBackend + 'static,
{
    pub fn new(backend: Arc<B>, config: BenchConfig, endpoint: impl Into<String>) -> Self {
        Self { backend, config, endpoint: endpoint.into() }
    }

    /// One-token request proving the endpoint answers before any load is sent.
    pub async fn preflight(&self) -> Result<Outcome> {
        let outcome = self.backend.complete(&self.config.preflight_prompt, 1).await;
        if outcome.success {
            tracing::info!(target: "orchestrator", latency_ms = %format!("{:.0}", outcome.latency_ms), "pre-flight check ok");
            Ok(outcome)
        } else {
            tracing::error!(target: "orchestrator", error = %outcome.detail, "pre-flight check failed");
            Err(BenchError::PreflightFailed(outcome.detail))
        }
    }

    /// Scenario failure rates are recorded, never fatal. Only a failed
    /// pre-flight or an unwritable report ends the run early.
    pub async fn run(&self) -> Result<RunArtifacts> {
        let metadata = RunMetadata::stamp(self.endpoint.clone(), self.config.model.clone());
        tracing::info!(
            target: "orchestrator",
            endpoint = %metadata.endpoint,
            model = %metadata.model,
            timestamp = %metadata.timestamp,
            "benchmark starting"
        );

        self.preflight().await?;

        let mut scenarios = Vec::with_capacity(self.config.scenarios.len());
        for spec in &self.config.scenarios {
            let metrics = run_scenario(self.backend.clone(), spec, &self.config.prompt, self.config.max_tokens).await?;
            scenarios.push(ScenarioReport { description: spec.label.clone(), metrics });
        }

        let cache_test = probe_prefix_cache(self.backend.as_ref(), &self.config.cache_probe).await?;

        let report = RunReport { metadata, scenarios, cache_test };
        let written = ReportWriter::new(&self.config.output_dir).write(&report)?;
        Ok(RunArtifacts { report, paths: written.paths, summary: written.summary })
    }
}
