//! Timeline geometry: the visible window, its tick marks, projection of
//! events onto the axis, runway selection and the composed view.
//!
//! Everything here is synchronous and free of I/O. The polling controller
//! in [`crate::poll`] owns the mutable session state and calls into these
//! functions whenever an input changes.
//!
//! # Example
//!
//! ```
//! use flightstrip::model::from_unix_seconds;
//! use flightstrip::timeline::{position_of, ticks, TimeWindow};
//!
//! let window = TimeWindow::new(from_unix_seconds(1_000).unwrap());
//! let marks: Vec<i64> = ticks(&window).map(|t| t.timestamp()).collect();
//! assert_eq!(marks, vec![1_200, 1_500, 1_800]);
//! assert_eq!(position_of(window.end(), &window), 1.0);
//! ```

mod projection;
mod selection;
mod ticks;
mod view;
mod window;

pub use projection::position_of;
pub use selection::RunwaySelection;
pub use ticks::{ticks, Ticks};
pub use view::{Lane, PlacedFlight, TickMark, TimelineView};
pub use window::{TimeWindow, WindowSpan};
