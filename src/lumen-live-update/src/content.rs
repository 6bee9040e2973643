//! Content preview and progress estimation.
//!
//! Progress is estimated from how much content has been produced so far:
//! `min(cap, base + chars / divisor)`. This is a monotone approximation, not
//! a measured completion percentage. Empty content has no estimate.

use crate::config::LiveUpdateConfig;
use crate::phase::ProgressValue;

/// Marker appended to truncated previews.
pub const ELLIPSIS: &str = "...";

/// Body text for `content`: the first `limit` characters followed by
/// [`ELLIPSIS`] when longer, or `placeholder` when empty.
pub fn preview_content(content: &str, limit: usize, placeholder: &str) -> String {
    if content.is_empty() {
        return placeholder.to_string();
    }

    match content.char_indices().nth(limit) {
        Some((end, _)) => format!("{}{}", &content[..end], ELLIPSIS),
        None => content.to_string(),
    }
}

/// Estimated progress for `content` under `config`.
pub fn estimate_progress(content: &str, config: &LiveUpdateConfig) -> ProgressValue {
    let length = content.chars().count();
    if length == 0 {
        return ProgressValue::Indeterminate;
    }

    let steps = (length / config.progress_estimate_divisor.max(1)) as u64;
    let estimate = (u64::from(config.progress_estimate_base) + steps)
        .min(u64::from(config.progress_cap)) as u32;

    if estimate == 0 {
        ProgressValue::Indeterminate
    } else {
        ProgressValue::Determinate(estimate)
    }
}
