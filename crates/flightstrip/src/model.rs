//! Core data types for flightstrip.
//!
//! Runways, flights and news articles as loaded from the data source. All
//! instants are UTC with whole-second precision, and serialize as unix
//! seconds.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identifier of a runway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunwayId(pub i64);

impl fmt::Display for RunwayId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Identifier of a flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FlightId(pub i64);

impl fmt::Display for FlightId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

/// Whether a flight lands or takes off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlightKind {
    /// An arriving flight.
    Arrival,
    /// A departing flight.
    Departure,
}

impl FlightKind {
    /// The value stored in the `type` column.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Arrival => "arrival",
            Self::Departure => "departure",
        }
    }

    /// Parse the stored column value.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "arrival" => Some(Self::Arrival),
            "departure" => Some(Self::Departure),
            _ => None,
        }
    }

    /// Single-letter label used on strips (`A` or `D`).
    #[must_use]
    pub const fn shorthand(self) -> char {
        match self {
            Self::Arrival => 'A',
            Self::Departure => 'D',
        }
    }
}

impl fmt::Display for FlightKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A runway, i.e. one lane of the timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Runway {
    /// Runway identifier.
    pub id: RunwayId,
    /// Unique display name, e.g. `09L`.
    pub name: String,
}

/// A scheduled flight as returned by the data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Flight {
    /// Flight identifier.
    pub id: FlightId,
    /// Free-text callsign, e.g. `LH123`.
    pub callsign: String,
    /// Arrival or departure.
    #[serde(rename = "type")]
    pub kind: FlightKind,
    /// Scheduled time on the runway.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub scheduled_time: DateTime<Utc>,
    /// The runway this flight is assigned to.
    pub runway_id: RunwayId,
    /// Origin airport (arrivals).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub origin: Option<String>,
    /// Destination airport (departures).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub destination: Option<String>,
    /// ICAO aircraft type designator.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aircraft_type: Option<String>,
}

/// A flight that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewFlight {
    /// Free-text callsign.
    pub callsign: String,
    /// Arrival or departure.
    pub kind: FlightKind,
    /// Scheduled time on the runway.
    pub scheduled_time: DateTime<Utc>,
    /// Assigned runway; must exist.
    pub runway_id: RunwayId,
    /// Origin airport.
    pub origin: Option<String>,
    /// Destination airport.
    pub destination: Option<String>,
    /// Aircraft type designator.
    pub aircraft_type: Option<String>,
}

/// A Markdown news article with a validity period.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewsArticle {
    /// Article identifier.
    pub id: i64,
    /// Headline.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Start of the validity period.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub valid_from: DateTime<Utc>,
    /// End of the validity period (exclusive), if any.
    #[serde(default, with = "chrono::serde::ts_seconds_option")]
    pub valid_to: Option<DateTime<Utc>>,
}

impl NewsArticle {
    /// Whether the article should be shown at `now`.
    #[must_use]
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.valid_from <= now && self.valid_to.map_or(true, |to| now < to)
    }
}

/// A news article that has not been stored yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewNewsArticle {
    /// Headline.
    pub title: String,
    /// Markdown body.
    pub content: String,
    /// Start of the validity period.
    pub valid_from: DateTime<Utc>,
    /// End of the validity period, if any.
    pub valid_to: Option<DateTime<Utc>>,
}

/// Convert unix seconds to a UTC instant.
#[must_use]
pub fn from_unix_seconds(seconds: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(seconds, 0)
}

/// Drop sub-second precision from an instant.
#[must_use]
pub fn truncate_to_seconds(instant: DateTime<Utc>) -> DateTime<Utc> {
    from_unix_seconds(instant.timestamp()).unwrap_or(instant)
}
