//! Progress visuals: segments, milestone points, tracker icon.
//!
//! A [`VisualLayout`] is recomputed for every frame and never stored.

use crate::config::{Palette, Rgb};
use crate::phase::ProgressValue;
use serde::{Deserialize, Serialize};

/// Number of equal segments (and milestone points) in the complete layout.
pub const MILESTONE_COUNT: u32 = 4;

/// Length of each segment, in progress units.
pub const SEGMENT_LENGTH: u32 = 25;

/// A colored stretch of the progress track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Segment {
    pub length: u32,
    pub color: Rgb,
}

/// A colored milestone on the progress track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Point {
    pub position: u32,
    pub color: Rgb,
}

/// Icon riding the progress tracker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerIcon {
    Upload,
    View,
    Check,
}

/// Renderable progress layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisualLayout {
    pub segments: Vec<Segment>,
    pub points: Vec<Point>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tracker_icon: Option<TrackerIcon>,
    pub indeterminate: bool,
    pub progress_value: u32,
}

impl VisualLayout {
    /// Four 25-unit segments with milestones at 25/50/75/100.
    pub fn complete(palette: &Palette) -> Self {
        Self {
            segments: milestone_segments(palette),
            points: milestone_points(palette),
            tracker_icon: Some(TrackerIcon::Check),
            indeterminate: false,
            progress_value: 100,
        }
    }

    /// Pure spinner.
    pub fn spinner() -> Self {
        Self {
            segments: Vec::new(),
            points: Vec::new(),
            tracker_icon: None,
            indeterminate: true,
            progress_value: 0,
        }
    }

    /// Plain bar at `value`, never reporting 100.
    pub fn determinate(value: u32) -> Self {
        Self {
            segments: Vec::new(),
            points: Vec::new(),
            tracker_icon: None,
            indeterminate: false,
            progress_value: value.min(99),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.progress_value >= 100
    }
}

/// Equal-length segments covering the whole track.
pub fn milestone_segments(palette: &Palette) -> Vec<Segment> {
    (0..MILESTONE_COUNT)
        .map(|_| Segment {
            length: SEGMENT_LENGTH,
            color: palette.segment_color,
        })
        .collect()
}

/// Points at each segment boundary (25, 50, 75, 100).
pub fn milestone_points(palette: &Palette) -> Vec<Point> {
    (1..=MILESTONE_COUNT)
        .map(|i| Point {
            position: i * SEGMENT_LENGTH,
            color: palette.point_color,
        })
        .collect()
}

/// Build the layout for a progress value.
///
/// Out-of-range values are clamped, never rejected: `>= 100` yields the
/// complete layout regardless of `indeterminate`; otherwise an indeterminate
/// request yields a spinner and a determinate one a bar clamped to `0..=99`.
pub fn build_visual(progress_value: u32, indeterminate: bool, palette: &Palette) -> VisualLayout {
    if progress_value >= 100 {
        VisualLayout::complete(palette)
    } else if indeterminate {
        VisualLayout::spinner()
    } else {
        VisualLayout::determinate(progress_value)
    }
}

/// Layout for a running operation's progress.
pub fn running_visual(progress: ProgressValue, palette: &Palette) -> VisualLayout {
    match progress {
        ProgressValue::Indeterminate => build_visual(0, true, palette),
        ProgressValue::Determinate(value) => build_visual(value, false, palette),
    }
}
