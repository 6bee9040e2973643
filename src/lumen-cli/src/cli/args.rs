//! CLI argument structures and parsing.

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::rpc_cmd::RpcCli;
use crate::simulate_cmd::SimulateCli;
use crate::stream_cmd::StreamCli;

/// Log verbosity level for CLI output.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Only show errors
    Error,
    /// Show warnings and errors
    Warn,
    /// Show informational messages, warnings, and errors (default)
    #[default]
    Info,
    /// Show debug messages and above
    Debug,
    /// Show all messages including trace-level details
    Trace,
}

impl LogLevel {
    /// Convert to tracing filter string.
    pub fn as_filter_str(&self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }

    /// Parse from string (case-insensitive).
    pub fn from_str_loose(s: &str) -> Option<LogLevel> {
        match s.to_lowercase().as_str() {
            "error" => Some(LogLevel::Error),
            "warn" | "warning" => Some(LogLevel::Warn),
            "info" => Some(LogLevel::Info),
            "debug" => Some(LogLevel::Debug),
            "trace" => Some(LogLevel::Trace),
            _ => None,
        }
    }
}

/// Where notification frames are shown.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum ChannelKind {
    /// Progress bar on stderr
    #[default]
    Terminal,
    /// Native desktop notifications
    Desktop,
    /// Frames are only written to the log
    Log,
}

/// LumenFlow - live update notifications for long-running operations.
#[derive(Debug, Parser)]
#[command(name = "lumenflow", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Delivery channel for notification frames
    #[arg(long, global = true, value_enum, default_value_t = ChannelKind::Terminal)]
    pub channel: ChannelKind,

    /// Configuration file (defaults to the per-user config path)
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Pretend the host cannot show progress notifications
    #[arg(long, global = true)]
    pub unsupported: bool,

    /// Log level
    #[arg(long, global = true, value_enum, default_value_t = LogLevel::Info)]
    pub log_level: LogLevel,

    /// Shorthand for --log-level debug
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Shorthand for --log-level trace
    #[arg(long, global = true)]
    pub trace: bool,

    /// Write trace-level logs to ./lumen-debug.log
    #[arg(long, global = true)]
    pub debug: bool,
}

impl Cli {
    /// Effective log level: flags first, then `LUMEN_LOG_LEVEL`, then `--log-level`.
    pub fn effective_log_level(&self, env_level: Option<&str>) -> LogLevel {
        if self.trace {
            LogLevel::Trace
        } else if self.verbose {
            LogLevel::Debug
        } else if let Some(level) = env_level {
            LogLevel::from_str_loose(level).unwrap_or(self.log_level)
        } else {
            self.log_level
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Track an operation whose output arrives line by line on stdin
    Stream(StreamCli),

    /// Walk a notification through five canned phases on a timer
    Simulate(SimulateCli),

    /// Serve host method calls as JSON lines on stdin/stdout
    Rpc(RpcCli),
}
