//! Progress state machine.
//!
//! Owns the single tracked operation and moves it through
//! `start` → `update`* → `complete` | `cancel`, handing a freshly composed
//! frame to the delivery channel on every transition.
//!
//! All four operations take the state lock for their whole duration,
//! including the delivery call, so a frame is always delivered before the
//! next operation reads `is_running` or `last_content`.
//!
//! # Auto-removal
//!
//! `complete` schedules removal of the completed frame after
//! `auto_remove_delay_ms`. The pending removal belongs to the cycle that
//! scheduled it: a later `start`, `complete` or `cancel` aborts it, so a
//! stale timer never removes the notification of a newer cycle.

use crate::channel::{ChannelSpec, DeliveryChannel, NotificationId};
use crate::config::LiveUpdateConfig;
use crate::content::{estimate_progress, preview_content};
use crate::error::{LiveUpdateError, Result};
use crate::frame::compose_frame;
use crate::phase::{Phase, ProgressValue};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;
use tokio::sync::{Mutex, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

/// Mutable record of the tracked operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgressState {
    pub phase: Phase,
    pub title: String,
    /// Most recent body text shown, already truncated for display.
    pub last_content: String,
    /// True only while `phase` is `Running`.
    pub is_running: bool,
}

impl ProgressState {
    fn new(title: &str) -> Self {
        Self {
            phase: Phase::Idle,
            title: title.to_string(),
            last_content: String::new(),
            is_running: false,
        }
    }
}

struct MachineState {
    progress: ProgressState,
    /// Removal scheduled by the last `complete`, if still pending.
    pending_removal: Option<JoinHandle<()>>,
    /// Bumped whenever a pending removal is invalidated.
    generation: u64,
    /// Whether the host channel has been registered.
    prepared: bool,
}

impl MachineState {
    fn cancel_pending_removal(&mut self) {
        self.generation = self.generation.wrapping_add(1);
        if let Some(handle) = self.pending_removal.take() {
            handle.abort();
            debug!("Cancelled pending live update removal");
        }
    }
}

struct Shared {
    channel: Arc<dyn DeliveryChannel>,
    config: LiveUpdateConfig,
    running: AtomicBool,
    state: Mutex<MachineState>,
    phase_tx: watch::Sender<Phase>,
}

impl Shared {
    fn notification_id(&self) -> NotificationId {
        self.config.notification_id
    }

    fn set_phase(&self, state: &mut MachineState, phase: Phase) {
        let running = phase.is_running();
        state.progress.phase = phase;
        state.progress.is_running = running;
        self.running.store(running, Ordering::Release);
        self.phase_tx.send_replace(phase);
        debug!(phase = %phase, "Live update phase changed");
    }

    /// Back to `Idle` with nothing shown.
    fn reset(&self, state: &mut MachineState) {
        state.progress.title = self.config.default_title.clone();
        state.progress.last_content.clear();
        self.set_phase(state, Phase::Idle);
    }

    async fn deliver_current(&self, state: &MachineState) -> Result<()> {
        let progress = &state.progress;
        let Some(frame) = compose_frame(
            &progress.phase,
            &progress.title,
            &progress.last_content,
            &self.config,
        ) else {
            return Ok(());
        };

        self.channel
            .deliver(self.notification_id(), &frame)
            .await
            .map_err(|e| {
                warn!(notification_id = self.notification_id(), error = %e, "Failed to deliver live update");
                LiveUpdateError::from(e)
            })
    }

    async fn remove_current(&self) -> Result<()> {
        self.channel
            .remove(self.notification_id())
            .await
            .map_err(|e| {
                warn!(notification_id = self.notification_id(), error = %e, "Failed to remove live update");
                LiveUpdateError::from(e)
            })
    }
}

/// State machine for the single tracked live update.
///
/// Cheap to clone; clones share the same state.
#[derive(Clone)]
pub struct ProgressStateMachine {
    shared: Arc<Shared>,
}

impl ProgressStateMachine {
    pub fn new(channel: Arc<dyn DeliveryChannel>, config: LiveUpdateConfig) -> Self {
        let progress = ProgressState::new(&config.default_title);
        let (phase_tx, _) = watch::channel(Phase::Idle);

        Self {
            shared: Arc::new(Shared {
                channel,
                config,
                running: AtomicBool::new(false),
                state: Mutex::new(MachineState {
                    progress,
                    pending_removal: None,
                    generation: 0,
                    prepared: false,
                }),
                phase_tx,
            }),
        }
    }

    pub fn config(&self) -> &LiveUpdateConfig {
        &self.shared.config
    }

    /// Whether `update` calls are currently accepted.
    pub fn is_running(&self) -> bool {
        self.shared.running.load(Ordering::Acquire)
    }

    /// Current phase.
    pub fn phase(&self) -> Phase {
        *self.shared.phase_tx.borrow()
    }

    /// Subscribe to phase transitions.
    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.shared.phase_tx.subscribe()
    }

    /// Copy of the current state.
    pub async fn snapshot(&self) -> ProgressState {
        self.shared.state.lock().await.progress.clone()
    }

    /// Begin tracking a new operation with an indeterminate frame.
    ///
    /// Legal from any phase; a removal still pending from the previous
    /// cycle is cancelled.
    pub async fn start(&self, title: impl Into<String>) -> Result<()> {
        let title = title.into();
        let mut state = self.shared.state.lock().await;
        state.cancel_pending_removal();

        let prepared = if state.prepared {
            Ok(())
        } else {
            let spec = ChannelSpec::from_config(&self.shared.config);
            match self.shared.channel.prepare(&spec).await {
                Ok(()) => {
                    state.prepared = true;
                    Ok(())
                }
                Err(e) => {
                    warn!(channel_id = %spec.id, error = %e, "Failed to register notification channel");
                    Err(LiveUpdateError::from(e))
                }
            }
        };

        debug!(title = %title, "Starting live update");
        state.progress.title = title;
        state.progress.last_content.clear();
        self.shared.set_phase(
            &mut state,
            Phase::Running {
                progress: ProgressValue::Indeterminate,
            },
        );

        let delivered = self.shared.deliver_current(&state).await;
        prepared.and(delivered)
    }

    /// Report new content for the running operation.
    ///
    /// Silently ignored unless running. Progress is estimated from the
    /// content length; the body shows a truncated preview.
    pub async fn update(&self, content: &str) -> Result<()> {
        if !self.is_running() {
            trace!("Ignoring live update content while not running");
            return Ok(());
        }

        let mut state = self.shared.state.lock().await;
        if !state.progress.phase.is_running() {
            trace!("Ignoring live update content while not running");
            return Ok(());
        }

        let config = &self.shared.config;
        let progress = estimate_progress(content, config);
        state.progress.last_content = preview_content(
            content,
            config.content_preview_limit,
            &config.working_placeholder,
        );
        self.shared.set_phase(&mut state, Phase::Running { progress });

        self.shared.deliver_current(&state).await
    }

    /// Show the completed frame now and remove it after the configured delay.
    pub async fn complete(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        state.cancel_pending_removal();

        self.shared.set_phase(&mut state, Phase::Completed);
        let delivered = self.shared.deliver_current(&state).await;

        let delay = self.shared.config.auto_remove_delay();
        let handle = tokio::spawn(remove_after(
            Arc::downgrade(&self.shared),
            Arc::clone(&self.shared.channel),
            self.shared.notification_id(),
            state.generation,
            delay,
        ));
        state.pending_removal = Some(handle);
        debug!(delay_ms = delay.as_millis() as u64, "Scheduled live update removal");

        delivered
    }

    /// Abandon the operation and remove any displayed frame immediately.
    pub async fn cancel(&self) -> Result<()> {
        let mut state = self.shared.state.lock().await;
        state.cancel_pending_removal();

        self.shared.set_phase(&mut state, Phase::Cancelled);
        self.shared.reset(&mut state);

        self.shared.remove_current().await
    }
}

async fn remove_after(
    shared: Weak<Shared>,
    channel: Arc<dyn DeliveryChannel>,
    id: NotificationId,
    generation: u64,
    delay: Duration,
) {
    tokio::time::sleep(delay).await;

    let Some(shared) = shared.upgrade() else {
        // Machine is gone; still take the completed frame down.
        if let Err(e) = channel.remove(id).await {
            warn!(notification_id = id, error = %e, "Failed to remove live update");
        }
        return;
    };

    let mut state = shared.state.lock().await;
    if state.generation != generation {
        return;
    }
    state.pending_removal = None;
    shared.reset(&mut state);

    let _ = shared.remove_current().await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DeliveryError;
    use crate::frame::NotificationFrame;
    use async_trait::async_trait;
    use std::sync::Mutex as StdMutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Prepare(String),
        Deliver(NotificationId, NotificationFrame),
        Remove(NotificationId),
    }

    #[derive(Default)]
    struct MockChannel {
        calls: StdMutex<Vec<Call>>,
        fail: AtomicBool,
    }

    impl MockChannel {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn frames(&self) -> Vec<NotificationFrame> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Deliver(_, frame) => Some(frame),
                    _ => None,
                })
                .collect()
        }

        fn removals(&self) -> usize {
            self.calls()
                .iter()
                .filter(|c| matches!(c, Call::Remove(_)))
                .count()
        }

        fn check(&self) -> std::result::Result<(), DeliveryError> {
            if self.fail.load(Ordering::SeqCst) {
                Err(DeliveryError::Unavailable("mock".to_string()))
            } else {
                Ok(())
            }
        }
    }

    #[async_trait]
    impl DeliveryChannel for MockChannel {
        async fn prepare(&self, channel: &ChannelSpec) -> std::result::Result<(), DeliveryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Prepare(channel.id.clone()));
            Ok(())
        }

        async fn deliver(
            &self,
            id: NotificationId,
            frame: &NotificationFrame,
        ) -> std::result::Result<(), DeliveryError> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Deliver(id, frame.clone()));
            self.check()
        }

        async fn remove(&self, id: NotificationId) -> std::result::Result<(), DeliveryError> {
            self.calls.lock().unwrap().push(Call::Remove(id));
            self.check()
        }
    }

    fn machine() -> (ProgressStateMachine, Arc<MockChannel>) {
        let channel = Arc::new(MockChannel::default());
        let machine = ProgressStateMachine::new(channel.clone(), LiveUpdateConfig::default());
        (machine, channel)
    }

    #[tokio::test]
    async fn test_start_delivers_indeterminate_frame() {
        let (machine, channel) = machine();

        machine.start("Build").await.unwrap();

        assert!(machine.is_running());
        assert_eq!(
            channel.calls()[0],
            Call::Prepare("live_updates_channel_id".to_string())
        );
        let frames = channel.frames();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].title, "Build");
        assert_eq!(frames[0].body, "Working...");
        assert!(frames[0].visual.indeterminate);
        assert!(frames[0].ongoing);
    }

    #[tokio::test]
    async fn test_channel_prepared_once() {
        let (machine, channel) = machine();

        machine.start("One").await.unwrap();
        machine.cancel().await.unwrap();
        machine.start("Two").await.unwrap();

        let prepares = channel
            .calls()
            .iter()
            .filter(|c| matches!(c, Call::Prepare(_)))
            .count();
        assert_eq!(prepares, 1);
    }

    #[tokio::test]
    async fn test_update_while_idle_is_noop() {
        let (machine, channel) = machine();
        let before = machine.snapshot().await;

        machine.update("ignored").await.unwrap();

        assert!(channel.calls().is_empty());
        assert_eq!(machine.snapshot().await, before);
    }

    #[tokio::test]
    async fn test_update_truncates_and_estimates() {
        let (machine, channel) = machine();
        machine.start("Build").await.unwrap();

        machine.update(&"a".repeat(200)).await.unwrap();

        let frame = channel.frames().pop().unwrap();
        assert_eq!(frame.body, format!("{}...", "a".repeat(80)));
        assert_eq!(frame.visual.progress_value, 20);
        assert!(!frame.visual.indeterminate);

        let state = machine.snapshot().await;
        assert_eq!(state.last_content, frame.body);
        assert_eq!(
            state.phase,
            Phase::Running {
                progress: ProgressValue::Determinate(20)
            }
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_complete_then_removal_after_delay() {
        let (machine, channel) = machine();
        machine.start("Build").await.unwrap();

        machine.complete().await.unwrap();

        assert!(!machine.is_running());
        assert_eq!(machine.phase(), Phase::Completed);
        let frame = channel.frames().pop().unwrap();
        assert_eq!(frame.title, "Build: Completed");
        assert_eq!(frame.visual.progress_value, 100);
        assert!(!frame.ongoing);
        assert!(frame.auto_cancel);
        assert_eq!(channel.removals(), 0);

        tokio::time::sleep(Duration::from_millis(2999)).await;
        assert_eq!(channel.removals(), 0);

        tokio::time::sleep(Duration::from_millis(2)).await;
        assert_eq!(channel.removals(), 1);
        assert_eq!(machine.phase(), Phase::Idle);

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(channel.removals(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_start_cancels_pending_removal() {
        let (machine, channel) = machine();
        machine.start("First").await.unwrap();
        machine.complete().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        machine.start("Second").await.unwrap();
        tokio::time::sleep(Duration::from_millis(5000)).await;

        assert_eq!(channel.removals(), 0);
        assert!(machine.is_running());
        assert_eq!(machine.snapshot().await.title, "Second");
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_while_completed_removes_once() {
        let (machine, channel) = machine();
        machine.start("Build").await.unwrap();
        machine.complete().await.unwrap();

        tokio::time::sleep(Duration::from_millis(1000)).await;
        machine.cancel().await.unwrap();
        assert_eq!(channel.removals(), 1);
        assert_eq!(machine.phase(), Phase::Idle);
        assert_eq!(machine.snapshot().await.title, "LumenFlow");

        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(channel.removals(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancel_removes_without_frames() {
        let (machine, channel) = machine();
        machine.start("Build").await.unwrap();
        let frames_before = channel.frames().len();

        machine.cancel().await.unwrap();

        assert_eq!(channel.frames().len(), frames_before);
        assert_eq!(channel.removals(), 1);
        assert!(!machine.is_running());
        assert_eq!(machine.phase(), Phase::Idle);

        machine.update("late").await.unwrap();
        assert_eq!(channel.frames().len(), frames_before);
    }

    #[tokio::test]
    async fn test_delivery_failure_keeps_transition() {
        let (machine, channel) = machine();
        channel.fail.store(true, Ordering::SeqCst);

        let err = machine.start("Build").await.unwrap_err();
        assert!(err.is_delivery());
        assert!(machine.is_running());

        let err = machine.update("hello").await.unwrap_err();
        assert!(err.is_delivery());
        assert_eq!(machine.snapshot().await.last_content, "hello");

        channel.fail.store(false, Ordering::SeqCst);
        machine.update("hello world").await.unwrap();
        assert_eq!(channel.frames().pop().unwrap().body, "hello world");
    }

    #[tokio::test]
    async fn test_subscribe_sees_latest_phase() {
        let (machine, _channel) = machine();
        let mut rx = machine.subscribe();

        machine.start("Build").await.unwrap();
        rx.changed().await.unwrap();
        assert!(rx.borrow_and_update().is_running());
    }
}
