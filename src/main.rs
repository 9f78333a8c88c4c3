//! CLI Entry Point for sensor_daq
//!
//! Provides command-line interface for:
//! - Running the pipeline under an interactive command loop
//! - Headless simulation for a fixed duration
//!
//! # Usage
//!
//! Interactive:
//! ```bash
//! sensor_daq run --config config/sensor_daq.toml
//! ```
//!
//! Headless, printing the final snapshot as JSON:
//! ```bash
//! sensor_daq simulate --duration-secs 5 --json
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sensor_daq::config::{PipelineConfig, DEFAULT_CONFIG_PATH};
use sensor_daq::logging;
use sensor_daq::report::{format_snapshot, CollectingSink, ConsoleReport};
use sensor_daq::{AppContext, Orchestrator};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{error, info, warn};

#[derive(Parser)]
#[command(name = "sensor_daq")]
#[command(about = "Simulated sensor with sliding-window processing", long_about = None)]
struct Cli {
    /// Configuration file (TOML). Missing files fall back to defaults.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive command loop on stdin
    Run,

    /// Run headless for a fixed time and print the final snapshot
    Simulate {
        /// How long to generate samples
        #[arg(long, default_value = "5")]
        duration_secs: u64,

        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = PipelineConfig::load_from(&cli.config)
        .with_context(|| format!("loading {}", cli.config.display()))?;
    config.validate()?;
    logging::init_from_config(&config)?;
    info!(name = %config.application.name, "Configuration loaded");

    match cli.command {
        Commands::Run => run_interactive(config).await,
        Commands::Simulate {
            duration_secs,
            json,
        } => simulate(config, duration_secs, json).await,
    }
}

async fn run_interactive(config: PipelineConfig) -> Result<()> {
    let ctx = Arc::new(AppContext::new(&config)?);
    let orchestrator = Orchestrator::new(ctx.clone(), Arc::new(ConsoleReport)).spawn();

    println!("{}", ctx.describe());
    println!("Type 'help' for commands.");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                match ctx.execute_line(&line).await {
                    Ok(outcome) => {
                        println!("{}", outcome.message);
                        if outcome.exit {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Command failed: {e}");
                        println!("{e}");
                    }
                }
            }
            _ = tokio::signal::ctrl_c() => {
                warn!("Interrupted");
                break;
            }
        }
    }

    if !ctx.is_shut_down() {
        ctx.shutdown().await?;
    }
    orchestrator.await?;
    Ok(())
}

async fn simulate(config: PipelineConfig, duration_secs: u64, json: bool) -> Result<()> {
    let ctx = Arc::new(AppContext::new(&config)?);
    let sink = Arc::new(CollectingSink::new());
    let orchestrator = Orchestrator::new(ctx.clone(), sink.clone()).spawn();

    ctx.start()?;
    tokio::time::sleep(Duration::from_secs(duration_secs)).await;
    ctx.shutdown().await?;
    orchestrator.await?;

    info!(batches = sink.len(), "Simulation finished");
    let snapshot = ctx.snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
    } else {
        println!("{}", ctx.describe());
        println!("{}", format_snapshot(&snapshot, config.orchestrator.print_data));
    }
    Ok(())
}
