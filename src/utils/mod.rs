//! Utility functions and helpers.

pub mod log;

use chrono::{DateTime, Utc};
use unicode_segmentation::UnicodeSegmentation;

use crate::error::TransportError;
use crate::services::QueryView;

/// Shorten `text` to at most `max` graphemes, ending with `…` when cut.
pub fn truncate(text: &str, max: usize) -> String {
    let graphemes: Vec<&str> = text.graphemes(true).collect();
    if graphemes.len() <= max {
        return text.to_string();
    }
    let keep = max.saturating_sub(1);
    format!("{}…", graphemes[..keep].concat())
}

/// Human-readable age of a timestamp relative to `now`.
pub fn format_age(at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - at).num_seconds().max(0);
    match secs {
        0..=59 => format!("{secs}s ago"),
        60..=3599 => format!("{}m ago", secs / 60),
        3600..=86_399 => format!("{}h ago", secs / 3600),
        _ => format!("{}d ago", secs / 86_400),
    }
}

/// Report the state of `view` and return its data, or the error when there
/// is nothing to show.
pub fn settle<T>(label: &str, view: QueryView<T>) -> Result<std::sync::Arc<T>, TransportError> {
    log::view(label, &view);
    view.into_result()
}
