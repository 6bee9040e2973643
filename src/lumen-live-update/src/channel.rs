//! Delivery channel boundary.
//!
//! The host owns the actual notification service. The core only hands it
//! frames for a single notification identity and asks it to remove them.

use crate::config::LiveUpdateConfig;
use crate::error::DeliveryError;
use crate::frame::NotificationFrame;
use async_trait::async_trait;
use tracing::{debug, info};

/// Identity of a notification slot on the host.
pub type NotificationId = i32;

/// Host notification channel to register before the first delivery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelSpec {
    pub id: String,
    pub name: String,
}

impl ChannelSpec {
    pub fn from_config(config: &LiveUpdateConfig) -> Self {
        Self {
            id: config.channel_id.clone(),
            name: config.channel_name.clone(),
        }
    }
}

/// Host notification service.
///
/// Implementations replace any frame previously delivered under the same
/// id. Calls are best-effort: errors are reported, never retried by the core.
#[async_trait]
pub trait DeliveryChannel: Send + Sync {
    /// Register the host channel. Called once, before the first delivery.
    async fn prepare(&self, _channel: &ChannelSpec) -> Result<(), DeliveryError> {
        Ok(())
    }

    /// Show or replace the frame for `id`.
    async fn deliver(
        &self,
        id: NotificationId,
        frame: &NotificationFrame,
    ) -> Result<(), DeliveryError>;

    /// Remove whatever is shown for `id`.
    async fn remove(&self, id: NotificationId) -> Result<(), DeliveryError>;
}

/// Channel that writes frames to the tracing log. Never fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingChannel;

#[async_trait]
impl DeliveryChannel for TracingChannel {
    async fn prepare(&self, channel: &ChannelSpec) -> Result<(), DeliveryError> {
        debug!(channel_id = %channel.id, channel_name = %channel.name, "Registered notification channel");
        Ok(())
    }

    async fn deliver(
        &self,
        id: NotificationId,
        frame: &NotificationFrame,
    ) -> Result<(), DeliveryError> {
        info!(
            notification_id = id,
            title = %frame.title,
            body = %frame.body,
            progress = frame.visual.progress_value,
            indeterminate = frame.visual.indeterminate,
            ongoing = frame.ongoing,
            "Live update"
        );
        Ok(())
    }

    async fn remove(&self, id: NotificationId) -> Result<(), DeliveryError> {
        info!(notification_id = id, "Live update removed");
        Ok(())
    }
}
