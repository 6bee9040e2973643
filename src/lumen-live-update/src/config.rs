//! Live update configuration.
//!
//! Every display constant (titles, placeholder text, estimate parameters,
//! removal delay, colors) lives here so hosts can localize or tune them from
//! a TOML file without touching the state machine.

use crate::error::{LiveUpdateError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Configuration file name inside the `lumenflow` config directory.
pub const CONFIG_FILE_NAME: &str = "live_update.toml";

/// Live update configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LiveUpdateConfig {
    /// Identity of the single tracked notification slot.
    #[serde(default = "default_notification_id")]
    pub notification_id: i32,

    /// Host notification channel id.
    #[serde(default = "default_channel_id")]
    pub channel_id: String,

    /// Host notification channel display name.
    #[serde(default = "default_channel_name")]
    pub channel_name: String,

    /// Title used when the caller does not supply one.
    #[serde(default = "default_title")]
    pub default_title: String,

    /// Appended to the title of the completed frame (`"<title>: <suffix>"`).
    #[serde(default = "default_completion_title_suffix")]
    pub completion_title_suffix: String,

    /// Body of the completed frame.
    #[serde(default = "default_completion_body")]
    pub completion_body: String,

    /// Body shown while running with no content yet.
    #[serde(default = "default_working_placeholder")]
    pub working_placeholder: String,

    /// Maximum number of characters of content shown in the body.
    #[serde(default = "default_content_preview_limit")]
    pub content_preview_limit: usize,

    /// Characters of content per estimated progress point.
    #[serde(default = "default_progress_estimate_divisor")]
    pub progress_estimate_divisor: usize,

    /// Estimated progress of any non-empty content.
    #[serde(default = "default_progress_estimate_base")]
    pub progress_estimate_base: u32,

    /// Upper bound of estimated progress while running.
    #[serde(default = "default_progress_cap")]
    pub progress_cap: u32,

    /// Delay between the completed frame and its removal (milliseconds).
    #[serde(default = "default_auto_remove_delay_ms")]
    pub auto_remove_delay_ms: u64,

    /// Accent colors for segments and points.
    #[serde(default)]
    pub palette: Palette,
}

fn default_notification_id() -> i32 {
    9999
}

fn default_channel_id() -> String {
    "live_updates_channel_id".to_string()
}

fn default_channel_name() -> String {
    "LumenFlow Live Updates".to_string()
}

fn default_title() -> String {
    "LumenFlow".to_string()
}

fn default_completion_title_suffix() -> String {
    "Completed".to_string()
}

fn default_completion_body() -> String {
    "All operations completed successfully!".to_string()
}

fn default_working_placeholder() -> String {
    "Working...".to_string()
}

fn default_content_preview_limit() -> usize {
    80
}

fn default_progress_estimate_divisor() -> usize {
    20
}

fn default_progress_estimate_base() -> u32 {
    10
}

fn default_progress_cap() -> u32 {
    95
}

fn default_auto_remove_delay_ms() -> u64 {
    3000
}

impl Default for LiveUpdateConfig {
    fn default() -> Self {
        Self {
            notification_id: default_notification_id(),
            channel_id: default_channel_id(),
            channel_name: default_channel_name(),
            default_title: default_title(),
            completion_title_suffix: default_completion_title_suffix(),
            completion_body: default_completion_body(),
            working_placeholder: default_working_placeholder(),
            content_preview_limit: default_content_preview_limit(),
            progress_estimate_divisor: default_progress_estimate_divisor(),
            progress_estimate_base: default_progress_estimate_base(),
            progress_cap: default_progress_cap(),
            auto_remove_delay_ms: default_auto_remove_delay_ms(),
            palette: Palette::default(),
        }
    }
}

impl LiveUpdateConfig {
    /// Load from a TOML file. Missing keys fall back to their defaults.
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the explicit path if given, else the user config file if it
    /// exists, else the defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from_file(path);
        }

        match Self::default_path() {
            Some(path) if path.exists() => {
                tracing::debug!(path = %path.display(), "Loading live update config");
                Self::load_from_file(&path)
            }
            _ => Ok(Self::default()),
        }
    }

    /// `<config_dir>/lumenflow/live_update.toml`, if a config dir is known.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lumenflow").join(CONFIG_FILE_NAME))
    }

    /// Reject values the estimate and truncation rules cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.content_preview_limit == 0 {
            return Err(LiveUpdateError::Config(
                "content_preview_limit must be greater than zero".to_string(),
            ));
        }
        if self.progress_estimate_divisor == 0 {
            return Err(LiveUpdateError::Config(
                "progress_estimate_divisor must be greater than zero".to_string(),
            ));
        }
        if self.progress_cap > 99 {
            return Err(LiveUpdateError::Config(format!(
                "progress_cap must be at most 99, got {}",
                self.progress_cap
            )));
        }
        Ok(())
    }

    /// Delay before a completed notification is removed.
    pub fn auto_remove_delay(&self) -> Duration {
        Duration::from_millis(self.auto_remove_delay_ms)
    }
}

/// Accent colors used by progress visuals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Palette {
    /// Color of milestone points.
    #[serde(default = "default_point_color")]
    pub point_color: Rgb,

    /// Color of progress segments.
    #[serde(default = "default_segment_color")]
    pub segment_color: Rgb,
}

fn default_point_color() -> Rgb {
    Rgb::new(100, 181, 246)
}

fn default_segment_color() -> Rgb {
    Rgb::new(129, 212, 250)
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            point_color: default_point_color(),
            segment_color: default_segment_color(),
        }
    }
}

/// Opaque RGB color, written as `#RRGGBB` in configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse `#RRGGBB` (the leading `#` is optional).
    pub fn from_hex(s: &str) -> Option<Self> {
        let hex = s.trim().strip_prefix('#').unwrap_or(s.trim());
        if hex.len() != 6 || !hex.is_ascii() {
            return None;
        }
        let channel = |range: std::ops::Range<usize>| u8::from_str_radix(&hex[range], 16).ok();
        Some(Self::new(channel(0..2)?, channel(2..4)?, channel(4..6)?))
    }

    /// Fully opaque ARGB value, the packed form notification hosts expect.
    pub fn to_argb(self) -> u32 {
        0xFF00_0000 | (u32::from(self.r) << 16) | (u32::from(self.g) << 8) | u32::from(self.b)
    }
}

impl fmt::Display for Rgb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl TryFrom<String> for Rgb {
    type Error = String;

    fn try_from(value: String) -> std::result::Result<Self, Self::Error> {
        Rgb::from_hex(&value).ok_or_else(|| format!("invalid color '{}', expected #RRGGBB", value))
    }
}

impl From<Rgb> for String {
    fn from(value: Rgb) -> Self {
        value.to_string()
    }
}
