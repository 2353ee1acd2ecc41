// pagetree - console host for interactive message pages
//
// Renders a demo page tree into a simulated message on stdout and turns
// typed commands into interactions, so the paging engine can be driven
// without a chat platform.
//
// Architecture:
// - Config: file + env, see pagetree::config
// - Tracing: stderr, optional rotating JSON file, in-memory capture for `logs`
// - Demo: ConsoleHost + page tree, see demo.rs

mod cli;
mod demo;

use anyhow::{Context as _, Result};
use clap::Parser;
use pagetree::config::{Config, LogRotation, LoggingConfig};
use pagetree::logging::{CaptureLayer, LogBuffer};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber.
///
/// Precedence for the filter: RUST_LOG env var > config level. The returned
/// guard must be kept alive for the file writer to flush.
fn init_tracing(logging: &LoggingConfig, buffer: LogBuffer) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(logging.filter_directive()));

    // File layer uses JSON format for structured log parsing
    let (file_layer, guard) = if logging.file_enabled {
        match std::fs::create_dir_all(&logging.file_dir) {
            Ok(()) => {
                let appender = match logging.file_rotation {
                    LogRotation::Hourly => {
                        tracing_appender::rolling::hourly(&logging.file_dir, &logging.file_prefix)
                    }
                    LogRotation::Daily => {
                        tracing_appender::rolling::daily(&logging.file_dir, &logging.file_prefix)
                    }
                    LogRotation::Never => {
                        tracing_appender::rolling::never(&logging.file_dir, &logging.file_prefix)
                    }
                };
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let layer = tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(writer)
                    .with_ansi(false);
                (Some(layer), Some(guard))
            }
            Err(e) => {
                eprintln!(
                    "Warning: Could not create log directory {:?}: {}",
                    logging.file_dir, e
                );
                (None, None)
            }
        }
    } else {
        (None, None)
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(file_layer)
        .with(CaptureLayer::new(buffer))
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = cli::Cli::parse();

    // Handle config subcommands first; exit early if one ran
    if cli::handle_command(&cli)? {
        return Ok(());
    }

    // Write the template on first run so users can discover the options
    if cli.config.is_none() {
        if let Some(path) = Config::config_path() {
            if let Err(e) = Config::write_default(&path) {
                eprintln!("Warning: {e:#}");
            }
        }
    }

    let config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    let log_buffer = LogBuffer::new();
    let _file_guard = init_tracing(&config.logging, log_buffer.clone());

    tracing::info!(version = pagetree::config::VERSION, "pagetree starting");
    demo::run(&config, log_buffer).await?;
    tracing::info!("pagetree exiting");

    Ok(())
}
