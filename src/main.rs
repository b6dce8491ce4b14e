//! Bit Grade Engine service
//!
//! Cumulative drill bit wear scoring from WITS telemetry.
//!
//! # Usage
//!
//! ```bash
//! # Serve the task API
//! bitgrade serve --addr 0.0.0.0:8080
//!
//! # Run one task from the command line
//! bitgrade task '{"task": "return_cache", "asset_id": 123456789}'
//!
//! # Calculate a long window in one-minute batches
//! bitgrade task --batch-secs 60 \
//!     '{"task": "calculate_bg", "asset_id": 123456789, "start_ts": 1677112070, "end_ts": 1677115068}'
//!
//! # Check a config file
//! bitgrade validate-config bitgrade.toml
//! ```
//!
//! # Environment Variables
//!
//! - `BITGRADE_CONFIG`: Path to the TOML config file
//! - `BITGRADE_SERVER_ADDR`: HTTP bind address for `serve`
//! - `BITGRADE_CORS_ORIGINS`: Comma-separated allowed CORS origins
//! - `RUST_LOG`: Logging level (default: info)

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use serde_json::Value;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bitgrade::api::{create_app, ApiState};
use bitgrade::config::{AppConfig, LOCAL_CONFIG_FILE};
use bitgrade::storage::Stores;
use bitgrade::tasks::{TaskDispatcher, TaskOutcome, TaskRequest};

// ============================================================================
// CLI Arguments
// ============================================================================

#[derive(Parser, Debug)]
#[command(name = "bitgrade")]
#[command(about = "Bit Grade Engine - cumulative bit wear from WITS telemetry")]
#[command(version)]
struct CliArgs {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Config file to use instead of the standard search order
    #[arg(short, long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: SubCommand,
}

#[derive(clap::Subcommand, Debug)]
enum SubCommand {
    /// Serve the HTTP task API
    Serve {
        /// Override the server address (default: "0.0.0.0:8080")
        #[arg(short, long, env = "BITGRADE_SERVER_ADDR")]
        addr: Option<String>,
    },

    /// Run one task payload and print its result as JSON
    Task {
        /// Task payload, e.g. '{"task": "get_app_setting", "asset_id": 1}'
        payload: String,

        /// Split a calculate_bg window into consecutive windows of this many seconds
        #[arg(long, value_name = "SECS", value_parser = clap::value_parser!(i64).range(1..))]
        batch_secs: Option<i64>,
    },

    /// Parse and validate a config file, then exit
    ValidateConfig {
        /// Config file (default: ./bitgrade.toml)
        path: Option<PathBuf>,
    },
}

fn init_tracing(json: bool) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if json {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .init();
    }
}

fn load_config(path: Option<&PathBuf>) -> Result<AppConfig> {
    match path {
        Some(p) => AppConfig::load_from_file(p)
            .with_context(|| format!("Failed to load config from {}", p.display())),
        None => Ok(AppConfig::load()),
    }
}

// ============================================================================
// Commands
// ============================================================================

async fn serve(config: AppConfig, addr: Option<String>) -> Result<()> {
    let server_addr = addr.unwrap_or_else(|| config.server.addr.clone());

    let stores = Stores::open(&config.storage).context("Failed to open stores")?;
    let dispatcher = TaskDispatcher::from_config(stores, &config);
    let app = create_app(ApiState::new(dispatcher));

    let listener = tokio::net::TcpListener::bind(&server_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", server_addr))?;
    info!("HTTP server listening on {}", server_addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            info!("Received Ctrl+C, shutting down");
        })
        .await
        .context("HTTP server error")?;

    info!("Graceful shutdown complete");
    Ok(())
}

fn run_task(config: &AppConfig, payload: &str, batch_secs: Option<i64>) -> Result<Value> {
    let payload: Value = serde_json::from_str(payload).context("Task payload is not valid JSON")?;
    let request = TaskRequest::parse(&payload)?;

    let stores = Stores::open(&config.storage).context("Failed to open stores")?;
    let dispatcher = TaskDispatcher::from_config(stores, config);

    let requests = match batch_secs {
        Some(step) => request.into_batches(step),
        None => vec![request],
    };
    if requests.len() > 1 {
        info!(batches = requests.len(), "Running task in batches");
    }

    let mut outcome = TaskOutcome::Completed;
    for request in requests {
        outcome = dispatcher.execute(request)?;
    }
    Ok(outcome.into_json())
}

fn validate_config(path: Option<PathBuf>) -> Result<()> {
    let path = path.unwrap_or_else(|| PathBuf::from(LOCAL_CONFIG_FILE));
    let config = AppConfig::load_from_file(&path)
        .with_context(|| format!("{} is not a valid config", path.display()))?;

    println!("{} is valid", path.display());
    println!("{}", config.to_toml()?);
    Ok(())
}

// ============================================================================
// Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    init_tracing(args.log_json);

    match args.command {
        SubCommand::Serve { addr } => {
            let config = load_config(args.config.as_ref())?;
            serve(config, addr).await
        }
        SubCommand::Task { payload, batch_secs } => {
            let config = load_config(args.config.as_ref())?;
            let result = tokio::task::spawn_blocking(move || run_task(&config, &payload, batch_secs))
                .await
                .context("Task worker failed")?;
            match result {
                Ok(value) => {
                    println!("{}", serde_json::to_string_pretty(&value)?);
                    Ok(())
                }
                Err(e) => {
                    warn!(error = %e, "Task failed");
                    Err(e)
                }
            }
        }
        SubCommand::ValidateConfig { path } => validate_config(path.or(args.config)),
    }
}
