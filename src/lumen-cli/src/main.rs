//! LumenFlow CLI - Main entry point.
//!
//! Subcommands:
//! - `stream` - track an operation from its output on stdin
//! - `simulate` - timer-driven demo of every notification phase
//! - `rpc` - JSON method calls on stdin, responses on stdout

use anyhow::Result;
use clap::Parser;

use lumen_cli::cli::{Cli, LogLevel, dispatch_command};

const DEBUG_LOG_FILE: &str = "lumen-debug.log";

/// Guard that ensures debug log file is properly flushed when dropped.
struct DebugLogGuard {
    _guard: tracing_appender::non_blocking::WorkerGuard,
}

/// Set up debug file logging that writes ALL trace-level logs to ./lumen-debug.log.
fn setup_debug_file_logging() -> Result<DebugLogGuard> {
    use std::fs::File;
    use tracing_subscriber::layer::SubscriberExt;
    use tracing_subscriber::util::SubscriberInitExt;

    let debug_file_path = std::env::current_dir()?.join(DEBUG_LOG_FILE);

    let file = File::create(&debug_file_path).map_err(|e| {
        anyhow::anyhow!(
            "Failed to create {}: {}. Check write permissions.",
            DEBUG_LOG_FILE,
            e
        )
    })?;

    let (non_blocking, guard) = tracing_appender::non_blocking(file);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new("trace"))
        .with(file_layer)
        .init();

    eprintln!(
        "Debug mode enabled: logging to {}",
        debug_file_path.display()
    );

    Ok(DebugLogGuard { _guard: guard })
}

/// Log to stderr so stdout stays clean for `rpc` responses.
fn setup_stderr_logging(log_level: LogLevel) {
    let level = log_level.as_filter_str();
    let filter_str = if std::env::var("RUST_LOG").is_ok() {
        format!(
            "error,lumen_live_update={},lumen_cli={},lumenflow={}",
            level, level, level
        )
    } else {
        level.to_string()
    };

    tracing_subscriber::fmt()
        .with_env_filter(&filter_str)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _debug_guard = if cli.debug {
        Some(setup_debug_file_logging()?)
    } else {
        let env_level = std::env::var("LUMEN_LOG_LEVEL").ok();
        setup_stderr_logging(cli.effective_log_level(env_level.as_deref()));
        None
    };

    dispatch_command(cli).await
}
