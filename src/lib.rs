pub mod cli;
pub mod commands;
pub mod config;
pub mod diff;
pub mod models;
pub mod parsers;
pub mod processors;
pub mod storage;
pub mod utils;

pub use commands::Workspace;
pub use config::AppConfig;
pub use diff::merge::{reconcile, Inventory};
pub use models::{AppError, ImportBatch, ImportReport, ImportWarning, LotRecord, RemoteSync};
pub use storage::{LocalCache, MemoryStore, RemoteStore};

use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Parses the command line, installs logging and runs the chosen command.
pub fn run() -> Result<(), AppError> {
    let cli = cli::Cli::parse();
    init_tracing();
    cli::run(cli)
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("lotsync=info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();

    if tracing::subscriber::set_global_default(subscriber).is_err() {
        tracing::warn!("Tracing subscriber already set; skipping re-initialization.");
    }
}
