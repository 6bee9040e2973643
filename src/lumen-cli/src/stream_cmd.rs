//! Stream command - track an operation from its incremental output.
//!
//! Every input line extends the accumulated content and becomes an update.
//! End of input completes the live update; Ctrl+C cancels it, including
//! while the completed notification waits for its removal.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader};
use tracing::{debug, info};

use lumen_live_update::{LiveUpdateControl, LiveUpdateError, Phase};

use crate::host::Host;

/// Stream CLI.
#[derive(Debug, Parser)]
pub struct StreamCli {
    /// Notification title (defaults to the configured title)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Read content from a file instead of stdin
    #[arg(long, short = 'i', value_name = "FILE")]
    pub input: Option<PathBuf>,

    /// Pause between lines, in milliseconds
    #[arg(long, default_value_t = 0)]
    pub line_delay_ms: u64,
}

/// How a stream ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamOutcome {
    Completed,
    Cancelled,
}

impl StreamCli {
    pub async fn run(self, host: Host) -> Result<()> {
        let control = host.control();

        let reader: Box<dyn AsyncBufRead + Unpin + Send> = match &self.input {
            Some(path) => {
                let file = tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open {}", path.display()))?;
                Box::new(BufReader::new(file))
            }
            None => Box::new(BufReader::new(tokio::io::stdin())),
        };

        let outcome = stream_content(
            &control,
            self.title.as_deref(),
            reader,
            Duration::from_millis(self.line_delay_ms),
            tokio::signal::ctrl_c(),
        )
        .await?;

        if outcome == StreamOutcome::Completed {
            await_removal(&control, tokio::signal::ctrl_c()).await?;
        }
        Ok(())
    }
}

/// Drive one live update from `reader` until end of input or `interrupt`.
pub async fn stream_content<R, I>(
    control: &LiveUpdateControl,
    title: Option<&str>,
    reader: R,
    line_delay: Duration,
    interrupt: I,
) -> Result<StreamOutcome>
where
    R: AsyncBufRead + Unpin,
    I: Future<Output = std::io::Result<()>>,
{
    match control.start_live_update(title).await {
        Ok(_) => {}
        Err(LiveUpdateError::Unsupported(reason)) => {
            bail!("Live updates are not available here: {}", reason)
        }
        Err(e) => return Err(e.into()),
    }

    let mut lines = reader.lines();
    let mut content = String::new();
    tokio::pin!(interrupt);

    loop {
        let line = tokio::select! {
            line = lines.next_line() => line.context("Failed to read input")?,
            _ = &mut interrupt => {
                info!("Interrupted, cancelling live update");
                control.stop_live_update().await?;
                return Ok(StreamOutcome::Cancelled);
            }
        };

        let Some(line) = line else { break };
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&line);
        control.update_live_update(&content).await?;

        if !line_delay.is_zero() {
            tokio::time::sleep(line_delay).await;
        }
    }

    debug!(chars = content.chars().count(), "Input finished");
    control.complete_live_update().await?;
    Ok(StreamOutcome::Completed)
}

/// Wait for the completed notification's auto-removal.
pub async fn wait_until_removed(control: &LiveUpdateControl) {
    let mut phases = control.machine().subscribe();
    // An error means the machine is gone, so nothing is left to wait for.
    let _ = phases.wait_for(|phase| *phase == Phase::Idle).await;
}

/// Wait for the auto-removal, or take the notification down at once when
/// `interrupt` fires first.
pub async fn await_removal<I>(control: &LiveUpdateControl, interrupt: I) -> Result<StreamOutcome>
where
    I: Future<Output = std::io::Result<()>>,
{
    tokio::select! {
        _ = wait_until_removed(control) => Ok(StreamOutcome::Completed),
        _ = interrupt => {
            info!("Interrupted, removing completed live update");
            control.stop_live_update().await?;
            Ok(StreamOutcome::Cancelled)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::ChannelKind;
    use lumen_live_update::LiveUpdateConfig;
    use std::future::pending;

    fn host(unsupported: bool) -> Host {
        Host::with_config(ChannelKind::Log, LiveUpdateConfig::default(), unsupported)
    }

    #[tokio::test(start_paused = true)]
    async fn test_stream_completes_at_end_of_input() {
        let control = host(false).control();
        let input: &[u8] = b"compiling\nlinking\n";

        let outcome = stream_content(
            &control,
            Some("Build"),
            input,
            Duration::ZERO,
            pending(),
        )
        .await
        .unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        let state = control.machine().snapshot().await;
        assert_eq!(state.phase, Phase::Completed);
        assert_eq!(state.last_content, "compiling\nlinking");

        wait_until_removed(&control).await;
        assert_eq!(control.machine().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_stream_interrupted_cancels() {
        let control = host(false).control();
        let (_tx, rx) = tokio::io::duplex(64);

        let outcome = stream_content(
            &control,
            None,
            BufReader::new(rx),
            Duration::ZERO,
            async { Ok(()) },
        )
        .await
        .unwrap();

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(control.machine().phase(), Phase::Idle);
        assert!(!control.machine().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_interrupt_during_removal_wait_removes_now() {
        let control = host(false).control();
        let input: &[u8] = b"done\n";
        stream_content(&control, Some("Build"), input, Duration::ZERO, pending())
            .await
            .unwrap();
        let started = tokio::time::Instant::now();

        let interrupt = async {
            tokio::time::sleep(Duration::from_millis(500)).await;
            Ok(())
        };
        let outcome = await_removal(&control, interrupt).await.unwrap();

        assert_eq!(outcome, StreamOutcome::Cancelled);
        assert_eq!(control.machine().phase(), Phase::Idle);
        assert!(started.elapsed() < Duration::from_millis(3000));
    }

    #[tokio::test(start_paused = true)]
    async fn test_removal_wait_without_interrupt_completes() {
        let control = host(false).control();
        let input: &[u8] = b"done\n";
        stream_content(&control, Some("Build"), input, Duration::ZERO, pending())
            .await
            .unwrap();

        let outcome = await_removal(&control, pending()).await.unwrap();

        assert_eq!(outcome, StreamOutcome::Completed);
        assert_eq!(control.machine().phase(), Phase::Idle);
    }

    #[tokio::test]
    async fn test_stream_unsupported_fails_early() {
        let control = host(true).control();
        let input: &[u8] = b"never read\n";

        let err = stream_content(&control, None, input, Duration::ZERO, pending())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("not available"));
        assert!(!control.machine().is_running());
    }
}
