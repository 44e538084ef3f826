use std::io;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use message_probe::{run, sample_messages, Cli, ProbeConfig};

fn main() -> Result<()> {
    // Default to WARN level if RUST_LOG is not set
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();

    let config = ProbeConfig::try_from(Cli::parse())?;
    info!(
        endpoint = %config.endpoint(),
        delay_ms = config.delay.as_millis() as u64,
        "starting probe"
    );

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to build tokio runtime")?;

    let messages = sample_messages(chrono::Local::now());
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = runtime.block_on(run(&config, &messages, &mut out)) {
        error!("failed to write probe report: {}", err);
    }
    Ok(())
}
