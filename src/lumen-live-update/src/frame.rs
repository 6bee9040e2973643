//! Notification frame composition.

use crate::config::LiveUpdateConfig;
use crate::content::preview_content;
use crate::phase::Phase;
use crate::visual::{VisualLayout, running_visual};
use serde::{Deserialize, Serialize};

/// A complete, renderable notification.
///
/// Frames are produced fresh on every transition; the delivery channel
/// replaces any previous frame with the same notification id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationFrame {
    pub title: String,
    pub body: String,
    pub visual: VisualLayout,
    pub ongoing: bool,
    pub auto_cancel: bool,
    /// Ask the host to promote the notification (status chip / lock screen).
    pub request_promoted: bool,
    /// Countdown chronometer, in seconds from when the frame is shown.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub countdown_secs: Option<u64>,
}

impl NotificationFrame {
    /// Frame for a phase that is still in progress.
    pub fn ongoing(title: impl Into<String>, body: impl Into<String>, visual: VisualLayout) -> Self {
        Self {
            title: title.into(),
            body: body.into(),
            visual,
            ongoing: true,
            auto_cancel: false,
            request_promoted: true,
            countdown_secs: None,
        }
    }

    /// Frame for a finished operation; dismissible and no longer ongoing.
    pub fn finished(title: impl Into<String>, body: impl Into<String>, visual: VisualLayout) -> Self {
        Self {
            ongoing: false,
            auto_cancel: true,
            ..Self::ongoing(title, body, visual)
        }
    }

    pub fn with_countdown(mut self, secs: u64) -> Self {
        self.countdown_secs = Some(secs);
        self
    }
}

/// Title of the completed frame: `"<title>: <suffix>"`.
pub fn completed_title(title: &str, config: &LiveUpdateConfig) -> String {
    format!("{}: {}", title, config.completion_title_suffix)
}

/// Compose the frame for `phase`.
///
/// Returns `None` for `Idle` and `Cancelled`; the caller must not deliver
/// anything in those phases.
pub fn compose_frame(
    phase: &Phase,
    title: &str,
    content: &str,
    config: &LiveUpdateConfig,
) -> Option<NotificationFrame> {
    match phase {
        Phase::Running { progress } => {
            let body = preview_content(
                content,
                config.content_preview_limit,
                &config.working_placeholder,
            );
            Some(NotificationFrame::ongoing(
                title,
                body,
                running_visual(*progress, &config.palette),
            ))
        }
        Phase::Completed => Some(NotificationFrame::finished(
            completed_title(title, config),
            config.completion_body.clone(),
            VisualLayout::complete(&config.palette),
        )),
        Phase::Idle | Phase::Cancelled => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::phase::ProgressValue;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_running_frame() {
        let config = LiveUpdateConfig::default();
        let phase = Phase::Running {
            progress: ProgressValue::Determinate(13),
        };

        let frame = compose_frame(&phase, "Build", &"x".repeat(60), &config).unwrap();
        assert_eq!(
            frame,
            NotificationFrame {
                title: "Build".to_string(),
                body: "x".repeat(60),
                visual: VisualLayout::determinate(13),
                ongoing: true,
                auto_cancel: false,
                request_promoted: true,
                countdown_secs: None,
            }
        );
    }

    #[test]
    fn test_running_frame_placeholder() {
        let config = LiveUpdateConfig::default();
        let phase = Phase::Running {
            progress: ProgressValue::Indeterminate,
        };

        let frame = compose_frame(&phase, "Build", "", &config).unwrap();
        assert_eq!(frame.body, config.working_placeholder);
        assert!(frame.visual.indeterminate);
    }

    #[test]
    fn test_completed_frame_ignores_content() {
        let config = LiveUpdateConfig::default();

        let frame = compose_frame(&Phase::Completed, "Build", "partial output", &config).unwrap();
        assert_eq!(frame.title, "Build: Completed");
        assert_eq!(frame.body, config.completion_body);
        assert_eq!(frame.visual, VisualLayout::complete(&config.palette));
        assert!(!frame.ongoing);
        assert!(frame.auto_cancel);
    }

    #[test]
    fn test_idle_and_cancelled_produce_nothing() {
        let config = LiveUpdateConfig::default();
        assert!(compose_frame(&Phase::Idle, "Build", "x", &config).is_none());
        assert!(compose_frame(&Phase::Cancelled, "Build", "x", &config).is_none());
    }
}
