//! The visible time range of the timeline.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

/// Allowed window lengths, ordered from shortest to longest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum WindowSpan {
    /// 10 minutes.
    TenMinutes,
    /// 15 minutes.
    FifteenMinutes,
    /// 30 minutes.
    ThirtyMinutes,
    /// 60 minutes.
    OneHour,
    /// 120 minutes.
    TwoHours,
}

impl WindowSpan {
    /// Every span in zoom order.
    pub const ALL: [Self; 5] = [
        Self::TenMinutes,
        Self::FifteenMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::TwoHours,
    ];

    /// Span used for a fresh session.
    pub const DEFAULT: Self = Self::FifteenMinutes;

    /// Length in minutes.
    #[must_use]
    pub const fn minutes(self) -> u32 {
        match self {
            Self::TenMinutes => 10,
            Self::FifteenMinutes => 15,
            Self::ThirtyMinutes => 30,
            Self::OneHour => 60,
            Self::TwoHours => 120,
        }
    }

    /// Length in seconds.
    #[must_use]
    pub const fn seconds(self) -> i64 {
        self.minutes() as i64 * 60
    }

    /// Length as a chrono duration.
    #[must_use]
    pub fn duration(self) -> Duration {
        Duration::seconds(self.seconds())
    }

    /// The span with exactly this many minutes, if it is an allowed step.
    #[must_use]
    pub fn from_minutes(minutes: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|span| span.minutes() == minutes)
    }

    /// The allowed step closest to `minutes`; ties go to the shorter span.
    #[must_use]
    pub fn nearest(minutes: u32) -> Self {
        Self::ALL
            .into_iter()
            .min_by_key(|span| span.minutes().abs_diff(minutes))
            .unwrap_or(Self::DEFAULT)
    }

    fn index(self) -> usize {
        self as usize
    }

    /// Next shorter span, or `None` at the minimum.
    #[must_use]
    pub fn shorter(self) -> Option<Self> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    /// Next longer span, or `None` at the maximum.
    #[must_use]
    pub fn longer(self) -> Option<Self> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// Spacing between tick marks for a window of this span.
    #[must_use]
    pub const fn tick_granularity_minutes(self) -> u32 {
        match self.minutes() {
            m if m <= 15 => 5,
            m if m <= 30 => 10,
            m if m <= 60 => 15,
            _ => 30,
        }
    }
}

impl Default for WindowSpan {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for WindowSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} min", self.minutes())
    }
}

/// A fixed start instant plus a step-quantized span.
///
/// Zooming changes only the span; the start stays where the session put it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimeWindow {
    start: DateTime<Utc>,
    span: WindowSpan,
}

impl TimeWindow {
    /// A window starting at `start` with the default 15 minute span.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_span(start, WindowSpan::DEFAULT)
    }

    /// A window with an explicit span.
    #[must_use]
    pub fn with_span(start: DateTime<Utc>, span: WindowSpan) -> Self {
        Self { start, span }
    }

    /// Inclusive start of the window.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// End of the window (`start + span`).
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.start + self.span.duration()
    }

    /// Current span.
    #[must_use]
    pub fn span(&self) -> WindowSpan {
        self.span
    }

    /// The window one step shorter; unchanged at the minimum.
    #[must_use]
    pub fn zoom_in(&self) -> Self {
        Self {
            span: self.span.shorter().unwrap_or(self.span),
            ..*self
        }
    }

    /// The window one step longer; unchanged at the maximum.
    #[must_use]
    pub fn zoom_out(&self) -> Self {
        Self {
            span: self.span.longer().unwrap_or(self.span),
            ..*self
        }
    }

    /// Whether [`zoom_in`](Self::zoom_in) would change anything.
    #[must_use]
    pub fn can_zoom_in(&self) -> bool {
        self.span.shorter().is_some()
    }

    /// Whether [`zoom_out`](Self::zoom_out) would change anything.
    #[must_use]
    pub fn can_zoom_out(&self) -> bool {
        self.span.longer().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::from_unix_seconds;

    fn window(span: WindowSpan) -> TimeWindow {
        TimeWindow::with_span(from_unix_seconds(1_000).unwrap(), span)
    }

    #[test]
    fn test_new_uses_fifteen_minutes() {
        let w = TimeWindow::new(from_unix_seconds(1_000).unwrap());
        assert_eq!(w.span(), WindowSpan::FifteenMinutes);
        assert_eq!(w.end().timestamp(), 1_900);
    }

    #[test]
    fn test_zoom_steps_one_at_a_time() {
        let w = window(WindowSpan::FifteenMinutes);
        assert_eq!(w.zoom_in().span(), WindowSpan::TenMinutes);
        assert_eq!(w.zoom_out().span(), WindowSpan::ThirtyMinutes);
        assert_eq!(w.zoom_out().zoom_out().span(), WindowSpan::OneHour);
    }

    #[test]
    fn test_zoom_clamps_at_boundaries() {
        let min = window(WindowSpan::TenMinutes);
        assert_eq!(min.zoom_in(), min);
        assert!(!min.can_zoom_in());
        assert!(min.can_zoom_out());

        let max = window(WindowSpan::TwoHours);
        assert_eq!(max.zoom_out(), max);
        assert!(!max.can_zoom_out());
        assert!(max.can_zoom_in());
    }

    #[test]
    fn test_zoom_in_then_out_round_trips_off_boundary() {
        for span in WindowSpan::ALL {
            let w = window(span);
            let back = w.zoom_in().zoom_out();
            if span == WindowSpan::TenMinutes {
                assert_eq!(back.span(), WindowSpan::FifteenMinutes);
            } else {
                assert_eq!(back.span(), span);
            }

            let back = w.zoom_out().zoom_in();
            if span == WindowSpan::TwoHours {
                assert_eq!(back.span(), WindowSpan::OneHour);
            } else {
                assert_eq!(back.span(), span);
            }
        }
    }

    #[test]
    fn test_zoom_keeps_start() {
        let w = window(WindowSpan::ThirtyMinutes);
        assert_eq!(w.zoom_in().start(), w.start());
        assert_eq!(w.zoom_out().start(), w.start());
    }

    #[test]
    fn test_from_minutes() {
        assert_eq!(WindowSpan::from_minutes(60), Some(WindowSpan::OneHour));
        assert_eq!(WindowSpan::from_minutes(45), None);
    }

    #[test]
    fn test_nearest() {
        assert_eq!(WindowSpan::nearest(0), WindowSpan::TenMinutes);
        assert_eq!(WindowSpan::nearest(20), WindowSpan::FifteenMinutes);
        assert_eq!(WindowSpan::nearest(50), WindowSpan::OneHour);
        assert_eq!(WindowSpan::nearest(1_000), WindowSpan::TwoHours);
    }

    #[test]
    fn test_tick_granularity() {
        assert_eq!(WindowSpan::TenMinutes.tick_granularity_minutes(), 5);
        assert_eq!(WindowSpan::FifteenMinutes.tick_granularity_minutes(), 5);
        assert_eq!(WindowSpan::ThirtyMinutes.tick_granularity_minutes(), 10);
        assert_eq!(WindowSpan::OneHour.tick_granularity_minutes(), 15);
        assert_eq!(WindowSpan::TwoHours.tick_granularity_minutes(), 30);
    }

    #[test]
    fn test_span_display() {
        assert_eq!(WindowSpan::OneHour.to_string(), "60 min");
    }
}
