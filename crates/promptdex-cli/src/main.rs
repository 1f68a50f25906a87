//! promptdex - command-line front end for a Promptdex session.
//!
//! Drives the same session store, gates and login flows the web front ends
//! use: log in and out, inspect the current identity, check whether a route
//! is reachable, finish an external login, and make authenticated requests.

mod cli;
mod commands;

use std::io;
use std::path::PathBuf;

use anyhow::Result;
use tracing::info;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cli::Invocation;

/// Directory for an optional rolling log file
const LOG_DIR_ENV: &str = "PROMPTDEX_LOG_DIR";

const LOG_FILE_PREFIX: &str = "promptdex.log";

/// Initialize the tracing subscriber for logging.
///
/// `RUST_LOG` controls the level (default `warn`). When `PROMPTDEX_LOG_DIR`
/// is set, events are also written to a daily rolling file there; the
/// returned guard must stay alive for the file writer to flush.
fn init_tracing() -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (file_layer, guard) = match std::env::var(LOG_DIR_ENV).ok().filter(|d| !d.is_empty()) {
        Some(dir) => {
            let appender = RollingFileAppender::new(Rotation::DAILY, PathBuf::from(dir), LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_writer(writer).with_ansi(false);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let args: Vec<String> = std::env::args().skip(1).collect();
    let invocation = match cli::parse(&args) {
        Ok(invocation) => invocation,
        Err(e) => {
            eprintln!("Error: {}\n", e);
            eprintln!("{}", cli::USAGE);
            std::process::exit(2);
        }
    };

    let Invocation { app, command } = invocation;
    info!(%app, "promptdex starting");

    if let Err(e) = commands::run(app, command).await {
        eprintln!("Error: {:#}", e);
        std::process::exit(1);
    }
    Ok(())
}
