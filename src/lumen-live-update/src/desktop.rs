//! Desktop notification delivery.
//!
//! Best-effort rendering of live update frames through the platform's
//! notifier:
//! - Linux: `notify-send` with a synchronous hint so each frame replaces the
//!   previous one, and a value hint for the progress bar
//! - macOS: AppleScript `display notification`
//! - Windows: PowerShell Toast notifications
//!
//! Desktop notifiers cannot retract a notification they already showed, so
//! `remove` only logs; the completed frame expires on its own.

use crate::capability::CapabilityProbe;
use crate::channel::{DeliveryChannel, NotificationId};
use crate::error::DeliveryError;
use crate::frame::NotificationFrame;
use async_trait::async_trait;
use tokio::process::Command;
use tracing::debug;

/// Delivery channel backed by the desktop notifier.
#[derive(Debug, Clone)]
pub struct DesktopChannel {
    app_name: String,
}

impl DesktopChannel {
    pub fn new(app_name: impl Into<String>) -> Self {
        Self {
            app_name: app_name.into(),
        }
    }

    /// Program used to post notifications on this platform.
    pub fn notifier_program() -> Option<&'static str> {
        if cfg!(target_os = "linux") {
            Some("notify-send")
        } else if cfg!(target_os = "macos") {
            Some("osascript")
        } else if cfg!(target_os = "windows") {
            Some("powershell")
        } else {
            None
        }
    }

    /// Whether the notifier program can be found on `PATH`.
    pub fn is_available() -> bool {
        Self::notifier_program().is_some_and(|program| which::which(program).is_ok())
    }

    fn command(&self, id: NotificationId, frame: &NotificationFrame) -> Option<Command> {
        #[cfg(target_os = "linux")]
        {
            let mut command = Command::new("notify-send");
            command.args(linux_args(&self.app_name, id, frame));
            Some(command)
        }

        #[cfg(target_os = "macos")]
        {
            let _ = id;
            let mut command = Command::new("osascript");
            command.args(["-e", applescript(&self.app_name, frame).as_str()]);
            Some(command)
        }

        #[cfg(target_os = "windows")]
        {
            let _ = id;
            let mut command = Command::new("powershell");
            command.args(["-Command", powershell_script(&self.app_name, frame).as_str()]);
            Some(command)
        }

        #[cfg(not(any(target_os = "linux", target_os = "macos", target_os = "windows")))]
        {
            let _ = (id, frame, &self.app_name);
            None
        }
    }
}

impl Default for DesktopChannel {
    fn default() -> Self {
        Self::new("LumenFlow")
    }
}

impl CapabilityProbe for DesktopChannel {
    fn supports_progress_notifications(&self) -> bool {
        Self::is_available()
    }
}

#[async_trait]
impl DeliveryChannel for DesktopChannel {
    async fn deliver(
        &self,
        id: NotificationId,
        frame: &NotificationFrame,
    ) -> Result<(), DeliveryError> {
        let mut command = self.command(id, frame).ok_or_else(|| {
            DeliveryError::Unavailable("no desktop notifier on this platform".to_string())
        })?;

        let output = command
            .output()
            .await
            .map_err(|e| DeliveryError::Unavailable(format!("failed to run notifier: {}", e)))?;

        if output.status.success() {
            Ok(())
        } else {
            Err(DeliveryError::Rejected(format!(
                "notifier exited with {}: {}",
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )))
        }
    }

    async fn remove(&self, id: NotificationId) -> Result<(), DeliveryError> {
        debug!(notification_id = id, "Desktop notifier cannot retract notifications");
        Ok(())
    }
}

/// Progress hint for notifiers that draw a bar; none while spinning.
fn progress_hint(frame: &NotificationFrame) -> Option<u32> {
    if frame.visual.indeterminate {
        None
    } else {
        Some(frame.visual.progress_value.min(100))
    }
}

#[cfg(target_os = "linux")]
fn linux_args(app_name: &str, id: NotificationId, frame: &NotificationFrame) -> Vec<String> {
    let urgency = if frame.ongoing { "low" } else { "normal" };
    let mut args = vec![
        format!("--app-name={}", app_name),
        format!("--urgency={}", urgency),
        format!("--hint=string:x-canonical-private-synchronous:lumenflow-{}", id),
    ];
    if let Some(value) = progress_hint(frame) {
        args.push(format!("--hint=int:value:{}", value));
    }
    // Title and body are caller content; keep them out of option parsing.
    args.push("--".to_string());
    args.push(frame.title.clone());
    args.push(frame.body.clone());
    args
}

#[cfg(target_os = "macos")]
fn applescript(app_name: &str, frame: &NotificationFrame) -> String {
    // Escape special characters for AppleScript
    let escape = |s: &str| s.replace('\\', "\\\\").replace('"', "\\\"");
    let subtitle = match progress_hint(frame) {
        Some(value) => format!("{}%", value),
        None => String::new(),
    };

    format!(
        r#"display notification "{}" with title "{}" subtitle "{} {}""#,
        escape(&frame.body),
        escape(&frame.title),
        escape(app_name),
        subtitle
    )
}

/// Single-quoted PowerShell literal. Nothing inside is expanded; quote
/// characters, including the typographic ones PowerShell also accepts, are
/// doubled.
#[cfg(any(target_os = "windows", test))]
fn powershell_literal(s: &str) -> String {
    let mut quoted = String::with_capacity(s.len() + 2);
    quoted.push('\'');
    for c in s.chars() {
        if matches!(c, '\'' | '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}') {
            quoted.push(c);
        }
        quoted.push(c);
    }
    quoted.push('\'');
    quoted
}

#[cfg(any(target_os = "windows", test))]
fn powershell_script(app_name: &str, frame: &NotificationFrame) -> String {
    let title = match progress_hint(frame) {
        Some(value) if frame.ongoing => format!("{} ({}%)", frame.title, value),
        _ => frame.title.clone(),
    };

    format!(
        r#"
        [Windows.UI.Notifications.ToastNotificationManager, Windows.UI.Notifications, ContentType = WindowsRuntime] | Out-Null
        $template = [Windows.UI.Notifications.ToastNotificationManager]::GetTemplateContent([Windows.UI.Notifications.ToastTemplateType]::ToastText02)
        $textNodes = $template.GetElementsByTagName('text')
        $textNodes.Item(0).AppendChild($template.CreateTextNode({})) | Out-Null
        $textNodes.Item(1).AppendChild($template.CreateTextNode({})) | Out-Null
        $toast = [Windows.UI.Notifications.ToastNotification]::new($template)
        $toast.Tag = 'lumenflow'
        [Windows.UI.Notifications.ToastNotificationManager]::CreateToastNotifier({}).Show($toast)
        "#,
        powershell_literal(&title),
        powershell_literal(&frame.body),
        powershell_literal(app_name)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visual::VisualLayout;

    #[test]
    fn test_progress_hint() {
        let spinning = NotificationFrame::ongoing("t", "b", VisualLayout::spinner());
        assert_eq!(progress_hint(&spinning), None);

        let bar = NotificationFrame::ongoing("t", "b", VisualLayout::determinate(42));
        assert_eq!(progress_hint(&bar), Some(42));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_args_replace_previous_frame() {
        let frame = NotificationFrame::ongoing("Build", "compiling", VisualLayout::determinate(13));
        let args = linux_args("LumenFlow", 9999, &frame);

        assert!(
            args.contains(
                &"--hint=string:x-canonical-private-synchronous:lumenflow-9999".to_string()
            )
        );
        assert!(args.contains(&"--hint=int:value:13".to_string()));
        assert!(args.contains(&"--urgency=low".to_string()));
        assert_eq!(&args[args.len() - 2..], ["Build", "compiling"]);
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_args_spinner_has_no_value_hint() {
        let frame = NotificationFrame::ongoing("Build", "Working...", VisualLayout::spinner());
        let args = linux_args("LumenFlow", 1, &frame);
        assert!(!args.iter().any(|a| a.starts_with("--hint=int:value")));
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn test_linux_args_dash_content_is_positional() {
        let frame = NotificationFrame::ongoing(
            "-v passed",
            "--- step 1 ---",
            VisualLayout::determinate(13),
        );
        let args = linux_args("LumenFlow", 9999, &frame);

        assert_eq!(&args[args.len() - 3..], ["--", "-v passed", "--- step 1 ---"]);
    }

    #[test]
    fn test_powershell_literal_quotes() {
        assert_eq!(powershell_literal("plain"), "'plain'");
        assert_eq!(powershell_literal("it's"), "'it''s'");
        assert_eq!(powershell_literal("\u{2019}"), "'\u{2019}\u{2019}'");
        assert_eq!(
            powershell_literal(r#"$(calc) `n "x""#),
            r#"'$(calc) `n "x"'"#
        );
    }

    #[test]
    fn test_powershell_script_never_expands_content() {
        let frame = NotificationFrame::ongoing(
            "$env:USERNAME",
            r"$(Remove-Item -Recurse ~\x)'; calc; '",
            VisualLayout::spinner(),
        );
        let script = powershell_script("LumenFlow", &frame);

        assert!(!script.contains('"'));
        assert!(script.contains("CreateTextNode('$env:USERNAME')"));
        assert!(script.contains(r"CreateTextNode('$(Remove-Item -Recurse ~\x)''; calc; ''')"));
        assert!(script.contains("CreateToastNotifier('LumenFlow')"));
    }

    #[cfg(target_os = "windows")]
    #[test]
    fn test_windows_command_quotes_content() {
        let frame = NotificationFrame::ongoing("Build", "$(calc)", VisualLayout::spinner());
        let script = powershell_script("LumenFlow", &frame);

        assert!(script.contains("CreateTextNode('$(calc)')"));
        assert!(!script.contains("\"$("));
    }

    #[tokio::test]
    async fn test_remove_is_noop() {
        assert!(DesktopChannel::default().remove(9999).await.is_ok());
    }
}
