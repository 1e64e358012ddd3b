//! `flightstrip` - A live flight strip timeline board
//!
//! This library provides the timeline geometry (window, ticks, projection,
//! runway selection), a polling session that keeps the board's flights fresh
//! with "last request wins" semantics, and the `SQLite` storage that backs
//! the demo data source.

#![warn(missing_docs)]
#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

pub mod board;
pub mod cli;
pub mod config;
pub mod demo;
pub mod error;
pub mod logging;
pub mod model;
pub mod news;
pub mod poll;
pub mod source;
pub mod storage;
pub mod timeline;

pub use config::Config;
pub use error::{Error, Result};
pub use logging::init_logging;
pub use model::{Flight, FlightId, FlightKind, NewsArticle, Runway, RunwayId};
pub use poll::{PollHandle, PollOptions, SessionSnapshot};
pub use source::{FlightQuery, FlightSource, SourceError, SqliteSource};
pub use storage::{Storage, TableCounts};
pub use timeline::{TimeWindow, TimelineView, WindowSpan};
