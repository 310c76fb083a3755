pub mod classify;
pub mod console;
pub mod models;
pub mod monitor;
pub mod settings;
pub mod store;
pub mod utils;
pub mod view;

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

/// Live cold-chain temperature monitor for batch block records.
#[derive(Debug, Parser)]
#[command(name = "coldwatch", version, about)]
pub struct Cli {
    /// Settings file; created when a batch is first remembered.
    #[arg(long, default_value = "coldwatch.json")]
    pub config: PathBuf,

    /// Base URL of the record store. Overrides the settings file.
    #[arg(long)]
    pub store_url: Option<String>,

    /// Seconds between polls. Overrides the settings file.
    #[arg(long)]
    pub interval: Option<u64>,

    /// Batch to start monitoring immediately.
    #[arg(long)]
    pub batch: Option<String>,
}

pub fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Reads RUST_LOG; COLDWATCH_DEBUG=1 turns on per-record detail.
    let level = if std::env::var("COLDWATCH_DEBUG").is_ok_and(|value| value == "1") {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    env_logger::Builder::from_default_env()
        .filter_level(level)
        .init();

    log::info!("coldwatch starting up...");

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;
    runtime.block_on(console::run_console(cli))
}
