use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use bench_backend::http::HttpCompletionClient;
use bench_common::config::BenchConfig;
use bench_common::BenchError;
use bench_core::Orchestrator;
use clap::Parser;
use opentelemetry_otlp::WithExportConfig;
use tracing_opentelemetry::OpenTelemetryLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser, Debug)]
#[command(
    name = "infer-bench",
    version,
    about = "Latency, throughput and prefix-cache benchmark for OpenAI-style completion endpoints"
)]
struct Cli {
    /// Base URL of the inference endpoint, e.g. http://10.0.0.7/qwen2-3b
    #[arg(long)]
    url: String,
    /// Model sent with every request (default: /mnt/models)
    #[arg(long)]
    model: Option<String>,
    /// Output directory for results (default: benchmarks/results)
    #[arg(long)]
    output: Option<PathBuf>,
    /// YAML file overriding scenarios, prompts and timeouts
    #[arg(long, env = "BENCH_CONFIG")]
    config: Option<PathBuf>,
    /// Print Prometheus request metrics after the run
    #[arg(long)]
    print_metrics: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => 0,
        Err(e) => {
            tracing::error!("{:#}", e);
            e.downcast_ref::<BenchError>().map(BenchError::exit_code).unwrap_or(1)
        }
    };
    std::process::exit(code);
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut cfg = BenchConfig::load(cli.config.as_deref())?;
    if let Some(model) = cli.model {
        cfg.model = model;
    }
    if let Some(output) = cli.output {
        cfg.output_dir = output;
    }
    bench_obs::init();

    // One pooled client for the whole run; every request shares its connections.
    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(cfg.request_timeout_secs))
        .build()
        .context("building HTTP client")?;
    let client = Arc::new(HttpCompletionClient::from_config(http, &cli.url, &cfg));

    let artifacts = Orchestrator::new(client, cfg, cli.url.clone()).run().await?;

    println!();
    print!("{}", artifacts.summary);
    println!("\nResults saved to:");
    println!("  JSON: {}", artifacts.paths.json.display());
    println!("  Summary: {}", artifacts.paths.summary.display());
    if cli.print_metrics {
        println!();
        print!("{}", bench_obs::render());
    }
    Ok(())
}

/// Console logs filtered by `RUST_LOG` (default `info`). Spans are also
/// exported over OTLP when `OTEL_EXPORTER_OTLP_ENDPOINT` is set.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let otlp_endpoint = std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").ok();
    let otel = otlp_endpoint
        .clone()
        .and_then(|endpoint| {
            opentelemetry_otlp::new_pipeline()
                .tracing()
                .with_exporter(opentelemetry_otlp::new_exporter().tonic().with_endpoint(endpoint))
                .install_simple()
                .ok()
        })
        .map(OpenTelemetryLayer::new);
    let exporter_failed = otlp_endpoint.is_some() && otel.is_none();

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_target(true))
        .with(otel)
        .init();

    if exporter_failed {
        tracing::warn!(endpoint = ?otlp_endpoint, "OTLP exporter unavailable, logging to console only");
    }
}
