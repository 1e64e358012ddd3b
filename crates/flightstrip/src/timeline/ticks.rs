//! Evenly spaced time markers for a window.

use std::iter::FusedIterator;

use chrono::{DateTime, Utc};

use super::window::TimeWindow;

/// Iterator over the tick instants of a window.
///
/// Ticks are aligned to multiples of the granularity since the unix epoch.
/// A clone continues independently from the position it was cloned at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticks {
    next: i64,
    last: i64,
    step: i64,
}

impl Ticks {
    /// Spacing between consecutive ticks, in seconds.
    #[must_use]
    pub fn step_seconds(&self) -> i64 {
        self.step
    }
}

impl Iterator for Ticks {
    type Item = DateTime<Utc>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.next > self.last {
            return None;
        }
        let current = self.next;
        self.next = current.saturating_add(self.step);
        DateTime::from_timestamp(current, 0)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = if self.next > self.last {
            0
        } else {
            usize::try_from((self.last - self.next) / self.step + 1).unwrap_or(usize::MAX)
        };
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for Ticks {}

impl FusedIterator for Ticks {}

/// Tick marks for `window`, ascending, within `[start, end]`.
///
/// The sequence is computed lazily from the window alone, so calling this
/// again yields the same ticks.
#[must_use]
pub fn ticks(window: &TimeWindow) -> Ticks {
    let step = i64::from(window.span().tick_granularity_minutes()) * 60;
    let start = window.start().timestamp();
    let mut first = start.div_euclid(step) * step;
    if first < start {
        first += step;
    }
    Ticks {
        next: first,
        last: window.end().timestamp(),
        step,
    }
}
