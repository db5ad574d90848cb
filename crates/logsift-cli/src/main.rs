//! LogSift CLI
//!
//! Thin shell around the classification engine: load a configuration,
//! read a CSV batch, classify, write the labeled CSV, print a summary.
//! Everything interesting happens in the engine crates.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

mod cli;
mod summary;

use cli::{Cli, Commands};
use logsift_core::export;
use logsift_router::{Router, RouterConfig};
use summary::BatchSummary;

/// Shipped engine configuration, also the `demo` fallback
const DEFAULT_CONFIG: &str = include_str!("../../../config/default.yaml");

/// Bundled sample batch for the `demo` subcommand
const DEMO_DATA: &str = include_str!("../../../demos/demo.csv");

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Classify {
            input,
            output,
            config,
            workers,
        } => classify(input, output, config, workers).await,
        Commands::CheckConfig { config } => check_config(config),
        Commands::Demo { config } => demo(config).await,
    }
}

async fn classify(
    input: PathBuf,
    output: Option<PathBuf>,
    config_path: PathBuf,
    workers: Option<usize>,
) -> Result<()> {
    let mut config = RouterConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;
    if let Some(workers) = workers {
        config.max_concurrency = workers.max(1);
    }

    let router = Arc::new(Router::from_config(config)?);

    let entries = export::read_entries_from_path(&input)
        .with_context(|| format!("reading {}", input.display()))?;
    info!(entries = entries.len(), "input loaded");

    let cancel = CancellationToken::new();
    spawn_cancel_on_interrupt(cancel.clone());

    let results = router.classify_batch(entries, cancel).await;

    match &output {
        Some(path) => {
            export::write_results_to_path(path, &results)?;
            info!(path = %path.display(), "results written");
        }
        None => {
            // CSV on stdout; logs and the summary stay on stderr.
            print!("{}", export::results_to_string(&results)?);
        }
    }

    eprintln!("{}", BatchSummary::from_results(&results));
    Ok(())
}

fn check_config(config_path: PathBuf) -> Result<()> {
    let config = RouterConfig::from_file(&config_path)
        .with_context(|| format!("loading {}", config_path.display()))?;

    println!("rules:               {}", config.rules.len());
    println!("explicit sources:    {}", config.policies.sources.len());
    println!("confidence threshold: {}", config.confidence_threshold);
    println!(
        "embedding:           {}",
        if config.embedding.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );
    println!(
        "generative:          {}",
        if config.generative.is_configured() {
            "configured"
        } else {
            "not configured"
        }
    );

    // Building exercises every load-time validation, including rule
    // compilation and artifact loading.
    Router::from_config(config)?;
    println!("configuration OK");
    Ok(())
}

async fn demo(config_path: Option<PathBuf>) -> Result<()> {
    let config = match &config_path {
        Some(path) => RouterConfig::from_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => RouterConfig::from_yaml(DEFAULT_CONFIG)?,
    };

    let router = Arc::new(Router::from_config(config)?);
    let entries = export::read_entries(DEMO_DATA.as_bytes())?;

    let results = router
        .classify_batch(entries, CancellationToken::new())
        .await;

    println!(
        "{:<16} {:<48} {:<20} {}",
        "SOURCE", "MESSAGE", "LABEL", "STRATEGY"
    );
    for result in &results {
        println!(
            "{:<16} {:<48} {:<20} {}",
            result.source,
            truncate(&result.message, 48),
            result.label,
            result.strategy
        );
    }
    println!();
    println!("{}", BatchSummary::from_results(&results));
    Ok(())
}

/// Cancel the batch on Ctrl+C so interrupted runs still flush cleanly
fn spawn_cancel_on_interrupt(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling batch");
            cancel.cancel();
        }
    });
}

/// Initialize tracing/logging on stderr
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = if verbose {
        EnvFilter::new("logsift=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("logsift=info"))
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}
