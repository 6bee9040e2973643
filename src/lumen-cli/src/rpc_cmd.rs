//! Rpc command - serve host method calls over stdin/stdout.
//!
//! Reads one JSON method call per line:
//!
//! ```text
//! {"method": "startLiveUpdate", "arguments": {"title": "Build"}}
//! ```
//!
//! and writes one JSON response per line. Logs go to stderr, so stdout
//! carries nothing but responses.

use anyhow::{Context, Result};
use clap::Parser;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tracing::{debug, warn};

use lumen_live_update::control::codes;
use lumen_live_update::{LiveUpdateControl, MethodCall, MethodResponse, Phase};

use crate::host::Host;
use crate::stream_cmd::wait_until_removed;

/// Rpc CLI.
#[derive(Debug, Parser)]
pub struct RpcCli {
    /// Leave a running live update alone when input ends instead of stopping it
    #[arg(long)]
    pub keep_running: bool,
}

impl RpcCli {
    pub async fn run(self, host: Host) -> Result<()> {
        let control = host.control();
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();

        serve(&control, stdin, &mut stdout).await?;

        match control.machine().phase() {
            Phase::Running { .. } if !self.keep_running => {
                debug!("Input closed, stopping running live update");
                control.stop_live_update().await?;
            }
            Phase::Completed => wait_until_removed(&control).await,
            _ => {}
        }
        Ok(())
    }
}

/// Answer every call read from `reader` until end of input.
///
/// Returns the number of calls answered. Blank lines are skipped; lines that
/// are not a method call get a `BAD_ARGS` error response.
pub async fn serve<R, W>(control: &LiveUpdateControl, reader: R, writer: &mut W) -> Result<usize>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();
    let mut answered = 0;

    while let Some(line) = lines.next_line().await.context("Failed to read request")? {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<MethodCall>(line) {
            Ok(call) => control.handle_method_call(&call).await,
            Err(e) => {
                warn!(error = %e, "Malformed method call");
                MethodResponse::error(codes::BAD_ARGS, format!("malformed method call: {}", e))
            }
        };

        let mut encoded = serde_json::to_string(&response)?;
        encoded.push('\n');
        writer.write_all(encoded.as_bytes()).await?;
        writer.flush().await?;
        answered += 1;
    }

    Ok(answered)
}
