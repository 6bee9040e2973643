//! Host wiring: config, delivery channel and capability probe from CLI flags.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;

use lumen_live_update::{
    CapabilityProbe, DeliveryChannel, DesktopChannel, FixedCapability, LiveUpdateConfig,
    LiveUpdateControl, ProgressStateMachine, TracingChannel,
};

use crate::cli::ChannelKind;
use crate::terminal::TerminalChannel;

/// Everything a subcommand needs to drive notifications.
pub struct Host {
    pub config: LiveUpdateConfig,
    pub channel: Arc<dyn DeliveryChannel>,
    pub capability: Arc<dyn CapabilityProbe>,
}

impl Host {
    pub fn new(kind: ChannelKind, config_path: Option<&Path>, unsupported: bool) -> Result<Self> {
        let config = LiveUpdateConfig::load(config_path).context("Failed to load configuration")?;
        Ok(Self::with_config(kind, config, unsupported))
    }

    pub fn with_config(kind: ChannelKind, config: LiveUpdateConfig, unsupported: bool) -> Self {
        let mut capability: Arc<dyn CapabilityProbe> = Arc::new(FixedCapability(true));
        let channel: Arc<dyn DeliveryChannel> = match kind {
            ChannelKind::Terminal => Arc::new(TerminalChannel::stderr()),
            ChannelKind::Desktop => {
                let desktop = Arc::new(DesktopChannel::new(config.channel_name.clone()));
                capability = desktop.clone();
                desktop
            }
            ChannelKind::Log => Arc::new(TracingChannel),
        };

        if unsupported {
            capability = Arc::new(FixedCapability(false));
        }

        Self {
            config,
            channel,
            capability,
        }
    }

    /// Control surface over a fresh state machine.
    pub fn control(&self) -> LiveUpdateControl {
        let machine = ProgressStateMachine::new(Arc::clone(&self.channel), self.config.clone());
        LiveUpdateControl::new(machine, Arc::clone(&self.capability))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unsupported_overrides_probe() {
        let host = Host::with_config(ChannelKind::Log, LiveUpdateConfig::default(), true);
        assert!(!host.control().is_live_update_available());

        let host = Host::with_config(ChannelKind::Log, LiveUpdateConfig::default(), false);
        assert!(host.control().is_live_update_available());
    }

    #[test]
    fn test_missing_explicit_config_fails() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        assert!(Host::new(ChannelKind::Log, Some(&missing), false).is_err());
    }

    #[test]
    fn test_explicit_config_is_used() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("live_update.toml");
        std::fs::write(&path, "default_title = \"Nightly\"\n").unwrap();

        let host = Host::new(ChannelKind::Log, Some(&path), false).unwrap();
        assert_eq!(host.config.default_title, "Nightly");
    }
}
