//! Timer-driven phase simulator.
//!
//! An alternative driver to [`ProgressStateMachine`](crate::ProgressStateMachine):
//! instead of being told about progress, it walks through five canned phases
//! at fixed offsets from `start`. Useful for demos and for exercising a host's
//! rendering of every visual variant.

use crate::channel::{DeliveryChannel, NotificationId};
use crate::config::{LiveUpdateConfig, Palette};
use crate::error::{LiveUpdateError, Result};
use crate::frame::NotificationFrame;
use crate::visual::{Point, TrackerIcon, VisualLayout, milestone_points, milestone_segments};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tracing::{debug, warn};

/// Canned phase of a simulated operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimulatedPhase {
    Initializing,
    Processing,
    Transferring,
    NearlyDone,
    Completed,
}

impl SimulatedPhase {
    /// Every phase, in firing order.
    pub const ALL: [SimulatedPhase; 5] = [
        SimulatedPhase::Initializing,
        SimulatedPhase::Processing,
        SimulatedPhase::Transferring,
        SimulatedPhase::NearlyDone,
        SimulatedPhase::Completed,
    ];

    pub fn progress(self) -> u32 {
        match self {
            SimulatedPhase::Initializing => 0,
            SimulatedPhase::Processing => 25,
            SimulatedPhase::Transferring => 50,
            SimulatedPhase::NearlyDone => 75,
            SimulatedPhase::Completed => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            SimulatedPhase::Initializing => "Initializing",
            SimulatedPhase::Processing => "Processing",
            SimulatedPhase::Transferring => "Transferring",
            SimulatedPhase::NearlyDone => "Almost done",
            SimulatedPhase::Completed => "Completed",
        }
    }

    pub fn body(self) -> &'static str {
        match self {
            SimulatedPhase::Initializing => "Preparing...",
            SimulatedPhase::Processing => "Processing data...",
            SimulatedPhase::Transferring => "Syncing data...",
            SimulatedPhase::NearlyDone => "Finishing the last steps...",
            SimulatedPhase::Completed => "All operations completed successfully!",
        }
    }

    pub fn tracker_icon(self) -> Option<TrackerIcon> {
        match self {
            SimulatedPhase::Initializing | SimulatedPhase::Processing => None,
            SimulatedPhase::Transferring => Some(TrackerIcon::Upload),
            SimulatedPhase::NearlyDone => Some(TrackerIcon::View),
            SimulatedPhase::Completed => Some(TrackerIcon::Check),
        }
    }

    /// Milestones already passed.
    pub fn completed_points(self) -> &'static [u32] {
        match self {
            SimulatedPhase::Initializing | SimulatedPhase::Processing => &[],
            SimulatedPhase::Transferring => &[25],
            SimulatedPhase::NearlyDone => &[25, 50],
            SimulatedPhase::Completed => &[25, 50, 75],
        }
    }

    /// Estimated time left, shown as a countdown chronometer.
    pub fn countdown_secs(self) -> Option<u64> {
        match self {
            SimulatedPhase::Transferring => Some(5 * 60),
            SimulatedPhase::NearlyDone => Some(2 * 60),
            _ => None,
        }
    }

    pub fn is_final(self) -> bool {
        self == SimulatedPhase::Completed
    }
}

/// When each simulated phase fires, relative to `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Schedule {
    /// 2s / 5s / 8s / 11s / 14s.
    #[default]
    Standard,
    /// 1s / 2s / 4s / 6s / 8s.
    Compressed,
}

impl Schedule {
    pub fn delay(self, phase: SimulatedPhase) -> Duration {
        let secs = match (self, phase) {
            (Schedule::Standard, SimulatedPhase::Initializing) => 2,
            (Schedule::Standard, SimulatedPhase::Processing) => 5,
            (Schedule::Standard, SimulatedPhase::Transferring) => 8,
            (Schedule::Standard, SimulatedPhase::NearlyDone) => 11,
            (Schedule::Standard, SimulatedPhase::Completed) => 14,
            (Schedule::Compressed, SimulatedPhase::Initializing) => 1,
            (Schedule::Compressed, SimulatedPhase::Processing) => 2,
            (Schedule::Compressed, SimulatedPhase::Transferring) => 4,
            (Schedule::Compressed, SimulatedPhase::NearlyDone) => 6,
            (Schedule::Compressed, SimulatedPhase::Completed) => 8,
        };
        Duration::from_secs(secs)
    }

    /// Offset of the last phase.
    pub fn total(self) -> Duration {
        self.delay(SimulatedPhase::Completed)
    }
}

/// Visual for a simulated phase.
///
/// Segments always cover the whole track. Points show the milestones already
/// passed, or all four milestones before the first one is reached.
pub fn simulated_visual(phase: SimulatedPhase, palette: &Palette) -> VisualLayout {
    let passed = phase.completed_points();
    let points = if passed.is_empty() {
        milestone_points(palette)
    } else {
        passed
            .iter()
            .map(|&position| Point {
                position,
                color: palette.point_color,
            })
            .collect()
    };

    VisualLayout {
        segments: milestone_segments(palette),
        points,
        tracker_icon: phase.tracker_icon(),
        indeterminate: phase == SimulatedPhase::Initializing,
        progress_value: phase.progress(),
    }
}

/// Frame for a simulated phase.
pub fn simulated_frame(
    phase: SimulatedPhase,
    title: &str,
    config: &LiveUpdateConfig,
) -> NotificationFrame {
    let visual = simulated_visual(phase, &config.palette);

    if phase.is_final() {
        return NotificationFrame::finished(
            format!("{}: {}", title, config.completion_title_suffix),
            config.completion_body.clone(),
            visual,
        );
    }

    let frame = NotificationFrame::ongoing(
        format!("{}: {}", title, phase.label()),
        phase.body(),
        visual,
    );
    match phase.countdown_secs() {
        Some(secs) => frame.with_countdown(secs),
        None => frame,
    }
}

/// Drives a notification through the canned phases on a timer.
pub struct ScheduledPhaseSimulator {
    channel: Arc<dyn DeliveryChannel>,
    config: LiveUpdateConfig,
    schedule: Schedule,
}

impl ScheduledPhaseSimulator {
    pub fn new(channel: Arc<dyn DeliveryChannel>, config: LiveUpdateConfig) -> Self {
        Self {
            channel,
            config,
            schedule: Schedule::default(),
        }
    }

    pub fn with_schedule(mut self, schedule: Schedule) -> Self {
        self.schedule = schedule;
        self
    }

    pub fn schedule(&self) -> Schedule {
        self.schedule
    }

    /// Schedule every phase and return immediately.
    pub fn start(&self, title: impl Into<String>) -> SimulationHandle {
        let title = title.into();
        let id = self.config.notification_id;
        let (phase_tx, phase_rx) = watch::channel(None);

        debug!(title = %title, schedule = ?self.schedule, "Starting simulated live update");
        let task = tokio::spawn(run_schedule(
            Arc::clone(&self.channel),
            self.config.clone(),
            self.schedule,
            title,
            phase_tx,
        ));

        SimulationHandle {
            task,
            channel: Arc::clone(&self.channel),
            id,
            phase_rx,
        }
    }
}

async fn run_schedule(
    channel: Arc<dyn DeliveryChannel>,
    config: LiveUpdateConfig,
    schedule: Schedule,
    title: String,
    phase_tx: watch::Sender<Option<SimulatedPhase>>,
) {
    let started = Instant::now();

    for phase in SimulatedPhase::ALL {
        tokio::time::sleep_until(started + schedule.delay(phase)).await;

        let frame = simulated_frame(phase, &title, &config);
        if let Err(e) = channel.deliver(config.notification_id, &frame).await {
            warn!(phase = ?phase, error = %e, "Failed to deliver simulated live update");
        }
        phase_tx.send_replace(Some(phase));
    }
}

/// Running simulation.
pub struct SimulationHandle {
    task: JoinHandle<()>,
    channel: Arc<dyn DeliveryChannel>,
    id: NotificationId,
    phase_rx: watch::Receiver<Option<SimulatedPhase>>,
}

impl SimulationHandle {
    /// Last phase delivered, if any.
    pub fn current_phase(&self) -> Option<SimulatedPhase> {
        *self.phase_rx.borrow()
    }

    /// Subscribe to delivered phases.
    pub fn subscribe(&self) -> watch::Receiver<Option<SimulatedPhase>> {
        self.phase_rx.clone()
    }

    /// Drop the remaining phases and remove the notification.
    pub async fn cancel(self) -> Result<()> {
        self.task.abort();
        debug!("Cancelled simulated live update");
        self.channel
            .remove(self.id)
            .await
            .map_err(LiveUpdateError::from)
    }

    /// Wait until the last phase has been delivered.
    ///
    /// Must not be awaited again once it has returned.
    pub async fn finished(&mut self) -> Result<()> {
        (&mut self.task)
            .await
            .map_err(|e| LiveUpdateError::Task(format!("simulation task failed: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phases_progress_in_order() {
        let progress: Vec<u32> = SimulatedPhase::ALL.iter().map(|p| p.progress()).collect();
        assert_eq!(progress, vec![0, 25, 50, 75, 100]);
    }

    #[test]
    fn test_schedules_are_increasing() {
        for schedule in [Schedule::Standard, Schedule::Compressed] {
            let delays: Vec<Duration> = SimulatedPhase::ALL
                .iter()
                .map(|p| schedule.delay(*p))
                .collect();
            assert!(delays.windows(2).all(|w| w[0] < w[1]));
        }
        assert_eq!(Schedule::Standard.total(), Duration::from_secs(14));
        assert_eq!(Schedule::Compressed.total(), Duration::from_secs(8));
    }

    #[test]
    fn test_visual_accumulates_points() {
        let palette = Palette::default();

        let initializing = simulated_visual(SimulatedPhase::Initializing, &palette);
        assert!(initializing.indeterminate);
        assert_eq!(initializing.points.len(), 4);
        assert_eq!(initializing.segments.len(), 4);

        let positions = |phase| -> Vec<u32> {
            simulated_visual(phase, &palette)
                .points
                .iter()
                .map(|p| p.position)
                .collect()
        };
        assert_eq!(positions(SimulatedPhase::Transferring), vec![25]);
        assert_eq!(positions(SimulatedPhase::NearlyDone), vec![25, 50]);
        assert_eq!(positions(SimulatedPhase::Completed), vec![25, 50, 75]);
    }

    #[test]
    fn test_frames() {
        let config = LiveUpdateConfig::default();

        let transferring = simulated_frame(SimulatedPhase::Transferring, "Sync", &config);
        assert_eq!(transferring.title, "Sync: Transferring");
        assert_eq!(transferring.countdown_secs, Some(300));
        assert_eq!(transferring.visual.tracker_icon, Some(TrackerIcon::Upload));
        assert!(transferring.ongoing);

        let completed = simulated_frame(SimulatedPhase::Completed, "Sync", &config);
        assert_eq!(completed.title, "Sync: Completed");
        assert_eq!(completed.visual.progress_value, 100);
        assert!(!completed.ongoing);
        assert!(completed.auto_cancel);
        assert_eq!(completed.countdown_secs, None);
    }
}
