//! Simulation Runner
//!
//! Runs one scenario over a set of targets read from JSON candle files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use batch_runner::{
    BatchOrchestrator, JsonFileCandleSource, LogSink, ResultCache, RunSummary, RunnerConfig,
    Scheduling, Target,
};
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "sim-runner", version, about = "Run a strategy scenario across many targets")]
struct Args {
    /// Config file (TOML or JSON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding <target>.json candle files
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Maximum targets in flight
    #[arg(long)]
    max_concurrency: Option<usize>,

    /// Collect per-target failures instead of aborting on the first one
    #[arg(long)]
    no_fail_fast: bool,

    /// Admit targets through a sliding window instead of fixed batches
    #[arg(long)]
    sliding_window: bool,

    /// Print the run summary as JSON
    #[arg(long)]
    json: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sim_runner=info,batch_runner=info,backtester=warn".into()),
        )
        .with(args.log_json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!args.log_json).then(tracing_subscriber::fmt::layer))
        .init();

    let mut config = RunnerConfig::load(args.config.as_deref())?;
    if let Some(dir) = args.data_dir {
        config.data_dir = dir;
    }
    if let Some(max) = args.max_concurrency {
        config.options.max_concurrency = max;
    }
    if args.no_fail_fast {
        config.options.fail_fast = false;
    }
    if args.sliding_window {
        config.options.scheduling = Scheduling::SlidingWindow;
    }
    if config.targets.is_empty() {
        config.targets = discover_targets(&config.data_dir)?;
    }

    info!(
        scenario = %config.scenario.name,
        targets = config.targets.len(),
        data_dir = %config.data_dir.display(),
        "Starting simulation runner"
    );

    let source = Arc::new(JsonFileCandleSource::new(&config.data_dir));
    let mut orchestrator = BatchOrchestrator::new(source).with_sink(Arc::new(LogSink));
    if config.cache.enabled {
        orchestrator = orchestrator.with_cache(Arc::new(ResultCache::new(&config.cache)));
    }

    let summary = orchestrator
        .run(&config.scenario, &config.targets, &config.options)
        .await?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        print_summary(&summary);
    }

    Ok(())
}

/// Every `<id>.json` file in `dir`, sorted by id.
fn discover_targets(dir: &Path) -> Result<Vec<Target>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("failed to read data directory {}", dir.display()))?;

    let mut ids: Vec<String> = entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path.extension().is_some_and(|ext| ext == "json"))
        .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
        .collect();
    ids.sort();

    if ids.is_empty() {
        warn!(data_dir = %dir.display(), "No candle files found");
    }

    Ok(ids.into_iter().map(Target::new).collect())
}

fn print_summary(summary: &RunSummary) {
    println!(
        "Run {} ({}): {} succeeded, {} failed, {} cache hits, {} ms",
        summary.run_id,
        summary.scenario,
        summary.success,
        summary.failure,
        summary.cache_hits,
        summary.elapsed_ms
    );

    for context in &summary.results {
        let result = &context.result;
        println!(
            "  {:<24} pnl {:>8.4}x  events {:>3}  re-entries {}{}",
            context.target.id,
            result.final_pnl,
            result.events.len(),
            result.entry_optimization.re_entry_count,
            if context.cache_hit { "  (cached)" } else { "" }
        );
    }

    for failure in &summary.errors {
        println!("  {:<24} FAILED [{}] {}", failure.target, failure.code, failure.message);
    }
}
