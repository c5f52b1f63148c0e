use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use cycle_arbitrage::{
    load_pool_updates, log_error, log_metrics, log_success, parse_update_line, ArbitrageConfig,
    ArbitrageDetector, ArbitrageService, JsonLinesSink,
};
use pool_graph::{PoolGraph, QueueError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "cycle_arbitrage", version, about = "Multi-hop DEX cycle arbitrage detector")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one full detection pass over a pool file and print the report
    Scan {
        /// TOML (or .json) configuration file
        #[arg(long)]
        config: Option<PathBuf>,
        /// JSON array of pool updates
        #[arg(long)]
        pools: PathBuf,
    },
    /// Read newline-delimited pool updates from stdin and print opportunities
    Stream {
        #[arg(long)]
        config: Option<PathBuf>,
        /// Initial pool states loaded before the first pass
        #[arg(long)]
        pools: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command {
        Command::Scan { config, pools } => scan(config, pools),
        Command::Stream { config, pools } => stream(config, pools).await,
    }
}

fn load_config(path: Option<PathBuf>) -> Result<ArbitrageConfig> {
    let config = ArbitrageConfig::load(path.as_deref())?;
    cycle_arbitrage::init_tracing(&config.logging);
    Ok(config)
}

fn build_graph(pools: Option<&PathBuf>) -> Result<Arc<PoolGraph>> {
    let graph = Arc::new(PoolGraph::new());
    if let Some(path) = pools {
        let rejected = graph.initialize_from_updates(load_pool_updates(path)?);
        for err in &rejected {
            warn!("Skipped pool state: {}", err);
        }
    }
    Ok(graph)
}

fn scan(config: Option<PathBuf>, pools: PathBuf) -> Result<()> {
    let config = load_config(config)?;
    info!("🚀 Starting cycle arbitrage scan...");

    let graph = build_graph(Some(&pools))?;
    let detector = ArbitrageDetector::new(config.detector_settings())?;
    let snapshot = graph.snapshot();
    let report = detector
        .run_pass(&snapshot, &config.pass_params())
        .context("Detection pass failed")?;

    println!("{}", serde_json::to_string_pretty(&report)?);
    log_success!(
        "Scan complete: {} opportunities from {} candidates",
        report.opportunities.len(),
        report.candidates
    );
    Ok(())
}

async fn stream(config: Option<PathBuf>, pools: Option<PathBuf>) -> Result<()> {
    let config = load_config(config)?;
    info!("🚀 Starting cycle arbitrage service...");

    let graph = build_graph(pools.as_ref())?;
    let detector = ArbitrageDetector::new(config.detector_settings())?;
    let mut service = ArbitrageService::new(
        graph,
        detector,
        JsonLinesSink::new(std::io::stdout()),
        config.pass_params(),
        config.service.queue_capacity,
    );
    info!("✅ Detector initialized for {} max hops", config.detector.max_hops);

    let producer = service.producer();
    let metrics = service.metrics();
    let ingest_metrics = Arc::clone(&metrics);
    let mut ingest = tokio::spawn(async move {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            let update = match parse_update_line(&line) {
                Ok(Some(update)) => update,
                Ok(None) => continue,
                Err(e) => {
                    warn!("Ignoring malformed update: {:#}", e);
                    continue;
                }
            };
            match producer.submit(update) {
                Ok(()) => {}
                Err(QueueError::QueueFull { capacity }) => {
                    ingest_metrics.record_dropped_update();
                    warn!("Update queue full ({}), dropping update", capacity);
                }
                Err(QueueError::Disconnected) => break,
            }
        }
        anyhow::Ok(())
    });
    info!("📡 Listening for pool updates on stdin");

    let mut ticker = tokio::time::interval(Duration::from_millis(config.service.tick_interval_ms));
    let mut ingest_done = false;
    while !ingest_done {
        tokio::select! {
            _ = ticker.tick() => {}
            joined = &mut ingest => {
                ingest_done = true;
                match joined {
                    Ok(Ok(())) => info!("Input closed"),
                    Ok(Err(e)) => log_error!("Reading updates failed: {:#}", e),
                    Err(e) => log_error!("Ingestion task failed: {}", e),
                }
            }
        }
        if let Err(e) = tokio::task::block_in_place(|| service.tick()) {
            log_error!("Pass failed: {}", e);
        }
    }

    let snapshot = metrics.snapshot();
    log_metrics!(
        "{} passes, {} opportunities, {} failures, {} updates applied, {} stale, {} dropped in {:?}",
        snapshot.passes,
        snapshot.opportunities,
        snapshot.path_failures,
        snapshot.updates_applied,
        snapshot.updates_stale,
        snapshot.updates_dropped,
        metrics.uptime()
    );
    Ok(())
}
