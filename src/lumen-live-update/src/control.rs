//! Control surface exposed to the host application.
//!
//! Maps the host's method calls onto the state machine. Capability is checked
//! once, when a live update starts. Delivery failures stop here: they are
//! logged and never reported back to the host, because a missed visual
//! update does not affect the tracked operation.

use crate::capability::{CapabilityProbe, ensure_supported};
use crate::error::{LiveUpdateError, Result};
use crate::machine::ProgressStateMachine;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Method names understood by [`LiveUpdateControl::handle_method_call`].
pub mod methods {
    pub const START: &str = "startLiveUpdate";
    pub const IS_AVAILABLE: &str = "isLiveUpdateAvailable";
    pub const STOP: &str = "stopLiveUpdate";
    pub const UPDATE: &str = "updateLiveUpdate";
    pub const COMPLETE: &str = "completeLiveUpdate";
}

/// Error codes returned in [`MethodResponse::Error`].
pub mod codes {
    pub const UNSUPPORTED: &str = "UNSUPPORTED";
    pub const BAD_ARGS: &str = "BAD_ARGS";
    pub const FAILED: &str = "FAILED";
}

/// Method call from the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MethodCall {
    pub method: String,
    #[serde(default)]
    pub arguments: serde_json::Map<String, serde_json::Value>,
}

impl MethodCall {
    pub fn new(method: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            arguments: serde_json::Map::new(),
        }
    }

    pub fn with_argument(
        mut self,
        key: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        self.arguments.insert(key.into(), value.into());
        self
    }

    fn string_argument(&self, key: &str) -> Option<&str> {
        self.arguments.get(key).and_then(|v| v.as_str())
    }
}

/// Reply to a [`MethodCall`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum MethodResponse {
    Success { result: serde_json::Value },
    Error { code: String, message: String },
    NotImplemented,
}

impl MethodResponse {
    pub fn success(result: impl Into<serde_json::Value>) -> Self {
        MethodResponse::Success {
            result: result.into(),
        }
    }

    pub fn error(code: &str, message: impl Into<String>) -> Self {
        MethodResponse::Error {
            code: code.to_string(),
            message: message.into(),
        }
    }
}

impl From<LiveUpdateError> for MethodResponse {
    fn from(err: LiveUpdateError) -> Self {
        let code = match err {
            LiveUpdateError::Unsupported(_) => codes::UNSUPPORTED,
            _ => codes::FAILED,
        };
        MethodResponse::error(code, err.to_string())
    }
}

/// Host-facing handle on the single tracked live update.
#[derive(Clone)]
pub struct LiveUpdateControl {
    machine: ProgressStateMachine,
    capability: Arc<dyn CapabilityProbe>,
}

impl LiveUpdateControl {
    pub fn new(machine: ProgressStateMachine, capability: Arc<dyn CapabilityProbe>) -> Self {
        Self {
            machine,
            capability,
        }
    }

    pub fn machine(&self) -> &ProgressStateMachine {
        &self.machine
    }

    pub fn is_live_update_available(&self) -> bool {
        self.capability.supports_progress_notifications()
    }

    /// Start a live update. Blank or missing titles use the configured default.
    pub async fn start_live_update(&self, title: Option<&str>) -> Result<bool> {
        ensure_supported(self.capability.as_ref())?;

        let title = title
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(self.machine.config().default_title.as_str())
            .to_string();

        recover_delivery(self.machine.start(title).await)?;
        Ok(true)
    }

    pub async fn update_live_update(&self, content: &str) -> Result<()> {
        recover_delivery(self.machine.update(content).await)
    }

    pub async fn complete_live_update(&self) -> Result<()> {
        recover_delivery(self.machine.complete().await)
    }

    pub async fn stop_live_update(&self) -> Result<()> {
        recover_delivery(self.machine.cancel().await)
    }

    /// Dispatch a host method call.
    pub async fn handle_method_call(&self, call: &MethodCall) -> MethodResponse {
        debug!(method = %call.method, "Handling live update method call");

        match call.method.as_str() {
            methods::START => match self.start_live_update(call.string_argument("title")).await {
                Ok(started) => MethodResponse::success(started),
                Err(e) => e.into(),
            },
            methods::IS_AVAILABLE => MethodResponse::success(self.is_live_update_available()),
            methods::STOP => match self.stop_live_update().await {
                Ok(()) => MethodResponse::success(true),
                Err(e) => e.into(),
            },
            methods::UPDATE => {
                let Some(content) = call.string_argument("content") else {
                    return MethodResponse::error(
                        codes::BAD_ARGS,
                        "missing string argument 'content'",
                    );
                };
                match self.update_live_update(content).await {
                    Ok(()) => MethodResponse::success(self.machine.is_running()),
                    Err(e) => e.into(),
                }
            }
            methods::COMPLETE => match self.complete_live_update().await {
                Ok(()) => MethodResponse::success(true),
                Err(e) => e.into(),
            },
            _ => MethodResponse::NotImplemented,
        }
    }
}

fn recover_delivery(result: Result<()>) -> Result<()> {
    match result {
        Err(e) if e.is_delivery() => {
            warn!(error = %e, "Live update delivery failed; continuing");
            Ok(())
        }
        other => other,
    }
}
