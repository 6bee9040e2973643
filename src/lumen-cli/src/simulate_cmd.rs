//! Simulate command - walk a notification through the canned phases.

use anyhow::Result;
use clap::Parser;
use tracing::info;

use lumen_live_update::{Schedule, ScheduledPhaseSimulator, SimulationHandle, ensure_supported};

use crate::host::Host;

/// Simulate CLI.
#[derive(Debug, Parser)]
pub struct SimulateCli {
    /// Notification title (defaults to the configured title)
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Fire phases at 1/2/4/6/8s instead of 2/5/8/11/14s
    #[arg(long)]
    pub compressed: bool,
}

impl SimulateCli {
    pub fn schedule(&self) -> Schedule {
        if self.compressed {
            Schedule::Compressed
        } else {
            Schedule::Standard
        }
    }

    pub async fn run(self, host: Host) -> Result<()> {
        ensure_supported(host.capability.as_ref())?;

        let title = self
            .title
            .clone()
            .unwrap_or_else(|| host.config.default_title.clone());
        let schedule = self.schedule();
        info!(title = %title, total_secs = schedule.total().as_secs(), "Starting simulation");

        let simulator = ScheduledPhaseSimulator::new(host.channel, host.config)
            .with_schedule(schedule);
        let handle = simulator.start(title);

        run_until_interrupted(handle, tokio::signal::ctrl_c()).await
    }
}

/// Wait for the last phase, or cancel the simulation when `interrupt` fires.
pub async fn run_until_interrupted<I>(mut handle: SimulationHandle, interrupt: I) -> Result<()>
where
    I: Future<Output = std::io::Result<()>>,
{
    let interrupted = tokio::select! {
        result = handle.finished() => {
            result?;
            false
        }
        _ = interrupt => true,
    };

    if interrupted {
        info!(phase = ?handle.current_phase(), "Interrupted, cancelling simulation");
        handle.cancel().await?;
    }
    Ok(())
}
