//! The data source the timeline polls.
//!
//! [`FlightSource`] is the contract the polling controller depends on;
//! [`SqliteSource`] implements it over [`Storage`]. Other transports (an
//! HTTP client, a test double) plug in behind the same trait.

use std::collections::BTreeSet;
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::debug;

use crate::model::{from_unix_seconds, Flight, Runway, RunwayId};
use crate::storage::Storage;
use crate::timeline::TimeWindow;

/// Errors that can occur when querying a data source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    /// The request was malformed; retrying will not help.
    #[error("invalid request: {0}")]
    Validation(String),

    /// The source could not be reached or failed to answer.
    #[error("{0}")]
    Transport(String),
}

/// Result type for data-source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

impl SourceError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create a transport error.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Check if this error was caused by the request itself.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<crate::error::Error> for SourceError {
    fn from(err: crate::error::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// A validated flight query: runway ids plus the half-open range
/// `[start, end)`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlightQuery {
    runway_ids: BTreeSet<RunwayId>,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
}

impl FlightQuery {
    /// Build a query.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Validation`] if `end <= start`.
    pub fn new(
        runway_ids: impl IntoIterator<Item = RunwayId>,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Self> {
        if end <= start {
            return Err(SourceError::validation(
                "invalid range: 'end' must be after 'start'",
            ));
        }
        Ok(Self {
            runway_ids: runway_ids.into_iter().collect(),
            start,
            end,
        })
    }

    /// Query covering a whole timeline window.
    pub fn for_window(runway_ids: impl IntoIterator<Item = RunwayId>, window: &TimeWindow) -> Self {
        Self {
            runway_ids: runway_ids.into_iter().collect(),
            start: window.start(),
            end: window.end(),
        }
    }

    /// Parse textual parameters: comma-separated runway ids and unix seconds.
    ///
    /// Fractional seconds are truncated; ids that are not integers are
    /// skipped.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Validation`] for a missing or non-numeric time,
    /// or an empty/inverted range.
    pub fn parse(runway_ids: Option<&str>, start: Option<&str>, end: Option<&str>) -> Result<Self> {
        let (Some(start), Some(end)) = (parse_unix_seconds(start), parse_unix_seconds(end)) else {
            return Err(SourceError::validation(
                "missing or invalid 'start'/'end' (unix seconds)",
            ));
        };
        let ids = runway_ids
            .unwrap_or_default()
            .split(',')
            .filter_map(|part| part.trim().parse::<i64>().ok())
            .map(RunwayId);
        Self::new(ids, start, end)
    }

    /// Requested runway ids.
    pub fn runway_ids(&self) -> impl Iterator<Item = RunwayId> + '_ {
        self.runway_ids.iter().copied()
    }

    /// Whether no runway was requested (the query matches nothing).
    #[must_use]
    pub fn has_no_runways(&self) -> bool {
        self.runway_ids.is_empty()
    }

    /// Inclusive start.
    #[must_use]
    pub fn start(&self) -> DateTime<Utc> {
        self.start
    }

    /// Exclusive end.
    #[must_use]
    pub fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Whether `flight` falls inside this query.
    #[must_use]
    pub fn matches(&self, flight: &Flight) -> bool {
        self.runway_ids.contains(&flight.runway_id)
            && self.start <= flight.scheduled_time
            && flight.scheduled_time < self.end
    }
}

#[allow(clippy::cast_possible_truncation)]
fn parse_unix_seconds(value: Option<&str>) -> Option<DateTime<Utc>> {
    let value = value?.trim();
    if value.is_empty() {
        return None;
    }
    let seconds = match value.parse::<i64>() {
        Ok(seconds) => seconds,
        Err(_) => {
            let parsed = value.parse::<f64>().ok().filter(|v| v.is_finite())?;
            parsed.floor() as i64
        }
    };
    from_unix_seconds(seconds)
}

/// Where the board gets its runways and flights from.
#[async_trait::async_trait]
pub trait FlightSource: Send + Sync {
    /// All runways, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Transport`] if the source fails.
    async fn list_runways(&self) -> Result<Vec<Runway>>;

    /// Flights on the requested runways with `start <= scheduled_time < end`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError::Transport`] if the source fails.
    async fn list_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>>;
}

/// [`FlightSource`] backed by the local `SQLite` database.
///
/// Queries run on the blocking thread pool.
#[derive(Debug, Clone)]
pub struct SqliteSource {
    storage: Arc<Mutex<Storage>>,
}

impl SqliteSource {
    /// Wrap an open storage handle.
    #[must_use]
    pub fn new(storage: Storage) -> Self {
        Self {
            storage: Arc::new(Mutex::new(storage)),
        }
    }

    async fn with_storage<T, F>(&self, op: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&Storage) -> crate::error::Result<T> + Send + 'static,
    {
        let storage = Arc::clone(&self.storage);
        tokio::task::spawn_blocking(move || {
            let guard = storage
                .lock()
                .map_err(|_| SourceError::transport("storage lock poisoned"))?;
            op(&guard).map_err(SourceError::from)
        })
        .await
        .map_err(|e| SourceError::transport(format!("storage task failed: {e}")))?
    }
}

#[async_trait::async_trait]
impl FlightSource for SqliteSource {
    async fn list_runways(&self) -> Result<Vec<Runway>> {
        self.with_storage(Storage::list_runways).await
    }

    async fn list_flights(&self, query: &FlightQuery) -> Result<Vec<Flight>> {
        debug!(
            runways = query.runway_ids.len(),
            start = query.start.timestamp(),
            end = query.end.timestamp(),
            "Querying flights"
        );
        let query = query.clone();
        self.with_storage(move |storage| storage.flights_in_range(&query))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{FlightKind, NewFlight};

    fn at(seconds: i64) -> DateTime<Utc> {
        from_unix_seconds(seconds).unwrap()
    }

    #[test]
    fn test_new_rejects_inverted_range() {
        let err = FlightQuery::new([RunwayId(1)], at(100), at(100)).unwrap_err();
        assert!(err.is_validation());

        let err = FlightQuery::new([RunwayId(1)], at(200), at(100)).unwrap_err();
        assert!(err.to_string().contains("'end' must be after 'start'"));
    }

    #[test]
    fn test_parse_valid() {
        let query = FlightQuery::parse(Some("3, 1,x"), Some("1000"), Some("1900.7")).unwrap();
        let ids: Vec<i64> = query.runway_ids().map(|id| id.0).collect();
        assert_eq!(ids, vec![1, 3]);
        assert_eq!(query.start().timestamp(), 1_000);
        assert_eq!(query.end().timestamp(), 1_900);
    }

    #[test]
    fn test_parse_missing_or_invalid_time() {
        for (start, end) in [
            (None, Some("10")),
            (Some("10"), None),
            (Some(""), Some("10")),
            (Some("soon"), Some("10")),
            (Some("NaN"), Some("10")),
        ] {
            let err = FlightQuery::parse(Some("1"), start, end).unwrap_err();
            assert!(err.is_validation(), "{start:?}..{end:?} should be rejected");
        }
    }

    #[test]
    fn test_parse_without_runways_matches_nothing() {
        let query = FlightQuery::parse(None, Some("0"), Some("60")).unwrap();
        assert!(query.has_no_runways());
    }

    #[test]
    fn test_matches_is_half_open() {
        let query = FlightQuery::new([RunwayId(1)], at(100), at(200)).unwrap();
        let mut flight = Flight {
            id: crate::model::FlightId(1),
            callsign: "BA1".to_string(),
            kind: FlightKind::Arrival,
            scheduled_time: at(100),
            runway_id: RunwayId(1),
            origin: None,
            destination: None,
            aircraft_type: None,
        };
        assert!(query.matches(&flight));
        flight.scheduled_time = at(200);
        assert!(!query.matches(&flight));
        flight.scheduled_time = at(150);
        flight.runway_id = RunwayId(2);
        assert!(!query.matches(&flight));
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            SourceError::transport("connection refused").to_string(),
            "connection refused"
        );
        assert!(SourceError::validation("bad")
            .to_string()
            .starts_with("invalid request"));
    }

    #[tokio::test]
    async fn test_sqlite_source_round_trip() {
        let storage = Storage::open_in_memory().unwrap();
        let rwy_27 = storage.insert_runway("27").unwrap();
        let rwy_09 = storage.insert_runway("09").unwrap();
        storage
            .insert_flight(&NewFlight {
                callsign: "LX12".to_string(),
                kind: FlightKind::Departure,
                scheduled_time: at(1_500),
                runway_id: rwy_27,
                origin: None,
                destination: Some("LSZH".to_string()),
                aircraft_type: None,
            })
            .unwrap();

        let source = SqliteSource::new(storage);
        let runways = source.list_runways().await.unwrap();
        let names: Vec<&str> = runways.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["09", "27"]);

        let query = FlightQuery::new([rwy_27, rwy_09], at(1_000), at(1_900)).unwrap();
        let flights = source.list_flights(&query).await.unwrap();
        assert_eq!(flights.len(), 1);
        assert_eq!(flights[0].callsign, "LX12");
    }
}
