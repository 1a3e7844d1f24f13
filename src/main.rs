//! collabd: collaboration object service
//!
//! Serves the collaboration REST API and stores collaboration objects in a
//! lazily provisioned system index.

use anyhow::Result;
use clap::{Parser, Subcommand};
use collabd::config::{Config, LogFormat, LoggingConfig};
use std::path::PathBuf;

mod commands;

use commands::{init_config, start_daemon};

#[derive(Parser)]
#[command(name = "collabd")]
#[command(about = "Collaboration object service")]
#[command(version)]
struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "collabd.toml")]
    config: PathBuf,

    /// Verbosity level (raises the configured log level)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the collaboration service
    Start {
        /// Listen address
        #[arg(short, long)]
        listen: Option<String>,
    },

    /// Initialize a new collabd configuration
    Init {
        /// Output directory
        #[arg(default_value = ".")]
        path: PathBuf,
    },
}

fn init_logging(logging: &LoggingConfig, verbose: u8) -> Result<()> {
    let level = logging.level.raised_by(verbose).as_tracing_level();
    let builder = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    match logging.format {
        LogFormat::Json => tracing::subscriber::set_global_default(builder.json().finish())?,
        LogFormat::Text => tracing::subscriber::set_global_default(builder.finish())?,
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load or create config
    let config = if cli.config.exists() {
        Config::load(&cli.config)?
    } else {
        Config::default()
    };

    init_logging(&config.logging, cli.verbose)?;

    match cli.command {
        Commands::Start { listen } => start_daemon(config, listen).await,
        Commands::Init { path } => init_config(path).await,
    }
}
