//! Blue/green access log watcher (v1)
//!
//! # Architecture Overview
//!
//! ```text
//!   proxy access.log (JSON lines)
//!        │
//!        ▼
//!   ┌─────────┐    ┌─────────┐    ┌──────────────────────────┐
//!   │  tail   │───▶│ ingest  │───▶│        detection         │
//!   │follower │    │ record  │    │ window → pool → degraded │
//!   └─────────┘    └─────────┘    └────────────┬─────────────┘
//!                                              │ MonitorEvent
//!                                              ▼
//!                                 ┌──────────────────────────┐
//!                                 │  alerting::dispatcher    │
//!                                 │ maintenance + cooldown   │
//!                                 └────────────┬─────────────┘
//!                                              │ bounded queue
//!                                              ▼
//!                                 ┌──────────────────────────┐
//!                                 │ notification worker task │──▶ webhook
//!                                 └──────────────────────────┘
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

use pool_watcher::config::{load_config, WatcherConfig};
use pool_watcher::lifecycle::{self, signals, Shutdown};
use pool_watcher::observability::logging;

#[derive(Parser)]
#[command(name = "pool-watcher")]
#[command(
    about = "Watches a proxy access log for failovers and error-rate spikes",
    long_about = None
)]
struct Cli {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Tail the log and send alerts (default)
    Run,
    /// Validate configuration and print the effective settings
    Check,
    /// Send one test alert through the configured channel
    TestAlert,
    /// Run detection over an existing log file without sending alerts
    Replay {
        /// Log file to read from the beginning
        file: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Logging is not installed yet, so this one goes straight to stderr.
    let config = match load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration error: {e}");
            return ExitCode::FAILURE;
        }
    };

    logging::init_logging(&config.observability);
    tracing::info!("pool-watcher v{} starting", env!("CARGO_PKG_VERSION"));

    match execute(cli.command.unwrap_or(Commands::Run), config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "Fatal error");
            ExitCode::FAILURE
        }
    }
}

async fn execute(
    command: Commands,
    config: WatcherConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Run => {
            let shutdown = Shutdown::new();
            signals::spawn_signal_listener(shutdown.clone());
            lifecycle::run(config, shutdown).await?;
            tracing::info!("Shutdown complete");
        }
        Commands::Check => print_config(&config)?,
        Commands::TestAlert => {
            lifecycle::send_test_alert(&config).await?;
            println!("Test alert sent");
        }
        Commands::Replay { file } => {
            let summary = lifecycle::replay(&config, &file).await?;
            println!("Lines:        {}", summary.lines);
            println!("Records:      {}", summary.records);
            println!("Malformed:    {}", summary.malformed);
            println!("Alerts:       {}", summary.alerts_queued);
            let final_pool = summary.final_pool.as_deref().unwrap_or("-");
            println!("Final pool:   {}", final_pool);
            println!("Degraded:     {}", summary.degraded);
        }
    }
    Ok(())
}

fn print_config(config: &WatcherConfig) -> Result<(), Box<dyn std::error::Error>> {
    let mut shown = config.clone();
    // Webhook URLs embed their secret.
    if shown.alerts.webhook_url.is_some() {
        shown.alerts.webhook_url = Some("<redacted>".to_string());
    }
    println!("Configuration OK\n");
    println!("{}", toml::to_string_pretty(&shown)?);
    Ok(())
}
