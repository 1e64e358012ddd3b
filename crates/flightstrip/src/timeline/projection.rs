//! Mapping instants onto the window's normalized axis.

use chrono::{DateTime, Utc};

use super::window::TimeWindow;

/// Position of `instant` within `window` as a ratio in `[0, 1]`.
///
/// Instants before the start clip to `0.0` and instants after the end clip
/// to `1.0`; nothing is dropped here. Range filtering happens when flights
/// are fetched.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn position_of(instant: DateTime<Utc>, window: &TimeWindow) -> f64 {
    let offset = (instant - window.start()).num_milliseconds() as f64;
    let length = (window.end() - window.start()).num_milliseconds() as f64;
    (offset / length).clamp(0.0, 1.0)
}
