//! Live update progress notifications for LumenFlow.
//!
//! Tracks a single long-running operation (typically an AI response being
//! generated) and turns its lifecycle into renderable notification frames:
//! - Progress visuals (segments, points, tracker icon, indeterminate spinner)
//! - Frame composition for running and completed phases
//! - A serialized state machine (`start` → `update` → `complete` / `cancel`)
//! - A timer-driven phase simulator kept as an alternative driver
//! - A method-call control surface for the host application
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    LiveUpdateControl                         │
//! │  startLiveUpdate / isLiveUpdateAvailable / stopLiveUpdate    │
//! └───────────────┬─────────────────────────────┬───────────────┘
//!                 │                             │
//!                 ▼                             ▼
//! ┌───────────────────────────────┐   ┌───────────────────────┐
//! │     ProgressStateMachine      │   │    CapabilityProbe    │
//! │  phase / title / lastContent  │   └───────────────────────┘
//! └───────────────┬───────────────┘
//!                 │ compose_frame → build_visual
//!                 ▼
//! ┌───────────────────────────────┐
//! │   DeliveryChannel (host)      │
//! │   deliver(id, frame) / remove │
//! └───────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use lumen_live_update::{LiveUpdateConfig, ProgressStateMachine, TracingChannel};
//!
//! let machine = ProgressStateMachine::new(Arc::new(TracingChannel), LiveUpdateConfig::default());
//!
//! machine.start("Build").await?;
//! machine.update("Compiling crates...").await?;
//! machine.complete().await?;
//! ```

pub mod capability;
pub mod channel;
pub mod config;
pub mod content;
pub mod control;
pub mod desktop;
pub mod error;
pub mod frame;
pub mod machine;
pub mod phase;
pub mod simulator;
pub mod visual;

pub use capability::{CapabilityProbe, FixedCapability, ensure_supported};
pub use channel::{ChannelSpec, DeliveryChannel, NotificationId, TracingChannel};
pub use config::{LiveUpdateConfig, Palette, Rgb};
pub use content::{estimate_progress, preview_content};
pub use control::{LiveUpdateControl, MethodCall, MethodResponse};
pub use desktop::DesktopChannel;
pub use error::{DeliveryError, LiveUpdateError, Result};
pub use frame::{NotificationFrame, compose_frame};
pub use machine::{ProgressState, ProgressStateMachine};
pub use phase::{Phase, ProgressValue};
pub use simulator::{Schedule, ScheduledPhaseSimulator, SimulatedPhase, SimulationHandle};
pub use visual::{Point, Segment, TrackerIcon, VisualLayout, build_visual};
