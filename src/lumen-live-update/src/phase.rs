//! Lifecycle phases of the tracked operation.

use serde::{Deserialize, Serialize};

/// Progress of a running operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum ProgressValue {
    /// No estimate yet; shown as a spinner.
    Indeterminate,
    /// Estimated completion percentage.
    Determinate(u32),
}

impl ProgressValue {
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, ProgressValue::Indeterminate)
    }

    /// Percentage for display (0 while indeterminate).
    pub fn percent(&self) -> u32 {
        match self {
            ProgressValue::Indeterminate => 0,
            ProgressValue::Determinate(value) => *value,
        }
    }
}

/// Lifecycle stage of the tracked operation.
///
/// Exactly one phase is active at a time. `Running → Running` is the only
/// self-transition; any phase may move to `Cancelled`/`Idle` through cancel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "phase", rename_all = "snake_case")]
pub enum Phase {
    /// Nothing tracked.
    #[default]
    Idle,

    /// Operation in progress.
    Running { progress: ProgressValue },

    /// Operation finished; the completed frame is on screen until removal.
    Completed,

    /// Operation abandoned by the caller.
    Cancelled,
}

impl Phase {
    /// Whether updates are accepted in this phase.
    pub fn is_running(&self) -> bool {
        matches!(self, Phase::Running { .. })
    }

    /// Get a human-readable description.
    pub fn description(&self) -> &'static str {
        match self {
            Phase::Idle => "idle",
            Phase::Running { .. } => "running",
            Phase::Completed => "completed",
            Phase::Cancelled => "cancelled",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Running {
                progress: ProgressValue::Determinate(value),
            } => write!(f, "Running ({}%)", value),
            Phase::Running {
                progress: ProgressValue::Indeterminate,
            } => write!(f, "Running (indeterminate)"),
            Phase::Idle => write!(f, "Idle"),
            Phase::Completed => write!(f, "Completed"),
            Phase::Cancelled => write!(f, "Cancelled"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_running() {
        assert!(!Phase::Idle.is_running());
        assert!(
            Phase::Running {
                progress: ProgressValue::Indeterminate
            }
            .is_running()
        );
        assert!(!Phase::Completed.is_running());
        assert!(!Phase::Cancelled.is_running());
    }

    #[test]
    fn test_display() {
        let phase = Phase::Running {
            progress: ProgressValue::Determinate(13),
        };
        assert_eq!(phase.to_string(), "Running (13%)");
        assert_eq!(Phase::default().to_string(), "Idle");
    }

    #[test]
    fn test_serialize_shape() {
        let phase = Phase::Running {
            progress: ProgressValue::Determinate(42),
        };
        let json = serde_json::to_value(phase).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"phase": "running", "progress": {"kind": "determinate", "value": 42}})
        );
    }
}
