//! Load driving, cache probing, and run reporting

pub mod cache_probe;
pub mod driver;
pub mod orchestrator;
pub mod report;
pub mod stats;

pub use cache_probe::{probe_prefix_cache, CacheProbeRecord, CacheProbeResult};
pub use driver::run_scenario;
pub use orchestrator::{Orchestrator, RunArtifacts};
pub use report::{render_summary, ReportPaths, ReportWriter, RunMetadata, RunReport, ScenarioReport, WrittenReport};
pub use stats::ScenarioMetrics;
