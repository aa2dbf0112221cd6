//! Trakr - Terminal canvas for Trello cards
//!
//! Connects to a Trello board, fetches the cards carrying one label, and lets
//! the user arrange them freely on a canvas by dragging.

use anyhow::Result;
use clap::Parser;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trakr::app::{self, LaunchOptions};
use trakr::config::Config;
use trakr::constants::{APP_BINARY_NAME, LOG_FILE_NAME};
use trakr::services::Storage;

/// Trakr - Terminal canvas for arranging Trello cards by label
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Start with sample cards when nothing is stored
    #[arg(long)]
    demo: bool,

    /// Clear stored cards and start at the connect screen
    #[arg(long)]
    reset: bool,

    /// Directory for stored credentials, label choice and cards
    #[arg(long, value_name = "DIR")]
    data_dir: Option<PathBuf>,

    /// Path to the configuration file
    #[arg(short, long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

/// Sends logs to a file in the data directory; the terminal belongs to the UI.
fn init_logging(data_dir: Option<&Path>, verbose: bool) {
    let Some(dir) = data_dir else {
        return;
    };
    if std::fs::create_dir_all(dir).is_err() {
        return;
    }
    let Ok(file) = OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join(LOG_FILE_NAME))
    else {
        return;
    };

    let filter = if verbose { "debug" } else { "info" };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| filter.into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(Arc::new(file))
                .with_ansi(false),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };

    let data_dir = cli
        .data_dir
        .clone()
        .or_else(|| config.storage.resolve_data_dir().ok());
    init_logging(data_dir.as_deref(), cli.verbose);

    tracing::info!("Starting {APP_BINARY_NAME} v{}", env!("CARGO_PKG_VERSION"));
    let storage = Storage::open(data_dir.as_deref());

    app::run(
        config,
        storage,
        LaunchOptions {
            demo: cli.demo,
            reset: cli.reset,
        },
    )
}
