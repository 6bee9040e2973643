//! Error types for live update notifications.

use thiserror::Error;

/// Failure reported by a delivery channel.
///
/// A failed delivery never rolls back a phase transition: the state machine
/// finishes its own bookkeeping first and only then reports the error.
#[derive(Error, Debug)]
pub enum DeliveryError {
    /// The notification service cannot be reached.
    #[error("Notification service unavailable: {0}")]
    Unavailable(String),

    /// The notification service refused the frame.
    #[error("Notification rejected: {0}")]
    Rejected(String),

    /// IO error while talking to the notification service.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Live update errors.
#[derive(Error, Debug)]
pub enum LiveUpdateError {
    /// Progress notifications are not supported on this host.
    #[error("Live updates are not supported: {0}")]
    Unsupported(String),

    /// The delivery channel failed to show, update or remove a frame.
    #[error("Delivery failed: {0}")]
    Delivery(#[from] DeliveryError),

    /// Invalid configuration value.
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A background task panicked or was aborted.
    #[error("Background task failed: {0}")]
    Task(String),

    /// Configuration file could not be parsed.
    #[error("Failed to parse configuration: {0}")]
    ConfigParse(#[from] toml::de::Error),
}

impl LiveUpdateError {
    /// Whether this error only affects what the user sees, not the tracked operation.
    pub fn is_delivery(&self) -> bool {
        matches!(self, LiveUpdateError::Delivery(_))
    }
}

pub type Result<T> = std::result::Result<T, LiveUpdateError>;
