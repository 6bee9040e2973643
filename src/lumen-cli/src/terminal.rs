//! Terminal delivery channel.
//!
//! Renders each frame as a single status line on stderr. When stderr is a
//! terminal the line is redrawn in place; otherwise every frame gets its own
//! line so the output stays readable in logs and pipes.

use async_trait::async_trait;
use std::io::{IsTerminal, Write};

use lumen_live_update::{
    DeliveryChannel, DeliveryError, NotificationFrame, NotificationId, TrackerIcon,
};

/// Width of the progress bar, in cells.
pub const BAR_WIDTH: usize = 20;

const CLEAR_LINE: &str = "\r\x1b[2K";

/// Channel that draws frames on stderr.
#[derive(Debug, Clone, Copy)]
pub struct TerminalChannel {
    redraw: bool,
}

impl TerminalChannel {
    pub fn stderr() -> Self {
        Self {
            redraw: std::io::stderr().is_terminal(),
        }
    }

    fn write_frame(&self, out: &mut impl Write, frame: &NotificationFrame) -> std::io::Result<()> {
        let line = render_line(frame, BAR_WIDTH);
        if self.redraw {
            write!(out, "{}{}", CLEAR_LINE, line)?;
            if !frame.ongoing {
                writeln!(out)?;
            }
        } else {
            writeln!(out, "{}", line)?;
        }
        out.flush()
    }
}

#[async_trait]
impl DeliveryChannel for TerminalChannel {
    async fn deliver(
        &self,
        _id: NotificationId,
        frame: &NotificationFrame,
    ) -> Result<(), DeliveryError> {
        let mut err = std::io::stderr().lock();
        self.write_frame(&mut err, frame)?;
        Ok(())
    }

    async fn remove(&self, _id: NotificationId) -> Result<(), DeliveryError> {
        if self.redraw {
            let mut err = std::io::stderr().lock();
            write!(err, "{}", CLEAR_LINE)?;
            err.flush()?;
        }
        Ok(())
    }
}

/// One status line: title, bar, percentage, body and countdown.
pub fn render_line(frame: &NotificationFrame, width: usize) -> String {
    let visual = &frame.visual;
    let percent = if visual.indeterminate {
        "...".to_string()
    } else {
        format!("{}%", visual.progress_value)
    };

    let mut line = format!(
        "{} [{}] {:>4}",
        frame.title,
        render_bar(frame, width),
        percent
    );
    if let Some(icon) = visual.tracker_icon {
        line.push(' ');
        line.push_str(icon_glyph(icon));
    }
    line.push_str("  ");
    line.push_str(&frame.body);
    if let Some(secs) = frame.countdown_secs {
        line.push_str(&format!(" ({}:{:02} left)", secs / 60, secs % 60));
    }
    line
}

/// Progress bar with milestone markers. Indeterminate bars are hatched.
pub fn render_bar(frame: &NotificationFrame, width: usize) -> String {
    let visual = &frame.visual;
    if visual.indeterminate {
        return "~".repeat(width);
    }

    let width = width.max(1);
    (1..=width)
        .map(|cell| {
            let cell_end = (cell * 100 / width) as u32;
            let milestone = visual.points.iter().any(|p| p.position == cell_end);
            match (cell_end <= visual.progress_value, milestone) {
                (true, true) => '*',
                (true, false) => '#',
                (false, true) => '|',
                (false, false) => '-',
            }
        })
        .collect()
}

fn icon_glyph(icon: TrackerIcon) -> &'static str {
    match icon {
        TrackerIcon::Upload => "^",
        TrackerIcon::View => "o",
        TrackerIcon::Check => "v",
    }
}
