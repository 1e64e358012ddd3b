//! Renderable state derived from the window, selection and flights.

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::projection::position_of;
use super::selection::RunwaySelection;
use super::ticks::ticks;
use super::window::{TimeWindow, WindowSpan};
use crate::model::{Flight, Runway};

/// A tick mark and where it sits on the axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TickMark {
    /// The tick instant.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub at: DateTime<Utc>,
    /// Position in `[0, 1]`.
    pub ratio: f64,
}

/// A flight placed on its lane.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PlacedFlight {
    /// The flight itself.
    pub flight: Flight,
    /// Position in `[0, 1]`.
    pub ratio: f64,
}

/// One runway column with its flights in time order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Lane {
    /// The runway.
    pub runway: Runway,
    /// Flights assigned to this runway, ascending by scheduled time.
    pub flights: Vec<PlacedFlight>,
}

/// Everything a presentation layer needs to draw the board.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimelineView {
    /// Window start.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub start: DateTime<Utc>,
    /// Window end.
    #[serde(with = "chrono::serde::ts_seconds")]
    pub end: DateTime<Utc>,
    /// Window span.
    pub span: WindowSpan,
    /// Tick marks for the window.
    pub ticks: Vec<TickMark>,
    /// Selected runways, in the order the runways were listed.
    pub lanes: Vec<Lane>,
    /// Whether the window can get shorter.
    pub can_zoom_in: bool,
    /// Whether the window can get longer.
    pub can_zoom_out: bool,
}

impl TimelineView {
    /// Derive the view. Pure; call again whenever an input changes.
    #[must_use]
    pub fn build(
        runways: &[Runway],
        selection: &RunwaySelection,
        window: &TimeWindow,
        flights: &[Flight],
    ) -> Self {
        let lanes = runways
            .iter()
            .filter(|runway| selection.contains(runway.id))
            .map(|runway| {
                let mut placed: Vec<PlacedFlight> = flights
                    .iter()
                    .filter(|flight| flight.runway_id == runway.id)
                    .map(|flight| PlacedFlight {
                        ratio: position_of(flight.scheduled_time, window),
                        flight: flight.clone(),
                    })
                    .collect();
                placed.sort_by_key(|p| (p.flight.scheduled_time, p.flight.id));
                Lane {
                    runway: runway.clone(),
                    flights: placed,
                }
            })
            .collect();

        let ticks = ticks(window)
            .map(|at| TickMark {
                at,
                ratio: position_of(at, window),
            })
            .collect();

        Self {
            start: window.start(),
            end: window.end(),
            span: window.span(),
            ticks,
            lanes,
            can_zoom_in: window.can_zoom_in(),
            can_zoom_out: window.can_zoom_out(),
        }
    }

    /// Total number of flights across all lanes.
    #[must_use]
    pub fn flight_count(&self) -> usize {
        self.lanes.iter().map(|lane| lane.flights.len()).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{from_unix_seconds, FlightId, FlightKind, RunwayId};

    fn runway(id: i64, name: &str) -> Runway {
        Runway {
            id: RunwayId(id),
            name: name.to_string(),
        }
    }

    fn flight(id: i64, runway: i64, at: i64) -> Flight {
        Flight {
            id: FlightId(id),
            callsign: format!("LH{id}"),
            kind: FlightKind::Departure,
            scheduled_time: from_unix_seconds(at).unwrap(),
            runway_id: RunwayId(runway),
            origin: None,
            destination: Some("LOWW".to_string()),
            aircraft_type: None,
        }
    }

    fn runways() -> Vec<Runway> {
        vec![runway(1, "09L"), runway(2, "09R"), runway(3, "27")]
    }

    #[test]
    fn test_lanes_follow_selection_and_runway_order() {
        let runways = runways();
        let mut selection = RunwaySelection::initialize(runways.iter().map(|r| r.id));
        selection.toggle(RunwayId(2));
        let window = TimeWindow::new(from_unix_seconds(1_000).unwrap());

        let view = TimelineView::build(&runways, &selection, &window, &[]);
        let names: Vec<&str> = view.lanes.iter().map(|l| l.runway.name.as_str()).collect();
        assert_eq!(names, vec!["09L", "27"]);
    }

    #[test]
    fn test_flights_sorted_and_projected() {
        let runways = runways();
        let selection = RunwaySelection::initialize(runways.iter().map(|r| r.id));
        let window = TimeWindow::new(from_unix_seconds(1_000).unwrap());
        let flights = vec![flight(1, 1, 1_900), flight(2, 1, 1_000), flight(3, 3, 1_450)];

        let view = TimelineView::build(&runways, &selection, &window, &flights);
        let first_lane: Vec<(i64, f64)> = view.lanes[0]
            .flights
            .iter()
            .map(|p| (p.flight.id.0, p.ratio))
            .collect();
        assert_eq!(first_lane.len(), 2);
        assert_eq!(first_lane[0].0, 2);
        assert!(first_lane[0].1.abs() < f64::EPSILON);
        assert_eq!(first_lane[1].0, 1);
        assert!((first_lane[1].1 - 1.0).abs() < f64::EPSILON);

        assert!(view.lanes[1].flights.is_empty());
        assert!((view.lanes[2].flights[0].ratio - 0.5).abs() < 1e-12);
        assert_eq!(view.flight_count(), 3);
    }

    #[test]
    fn test_ticks_and_zoom_flags() {
        let runways = runways();
        let selection = RunwaySelection::initialize(runways.iter().map(|r| r.id));
        let window = TimeWindow::with_span(from_unix_seconds(1_000).unwrap(), WindowSpan::TenMinutes);

        let view = TimelineView::build(&runways, &selection, &window, &[]);
        assert!(!view.can_zoom_in);
        assert!(view.can_zoom_out);
        let tick_seconds: Vec<i64> = view.ticks.iter().map(|t| t.at.timestamp()).collect();
        assert_eq!(tick_seconds, vec![1_200, 1_500]);
        assert!(view.ticks.iter().all(|t| (0.0..=1.0).contains(&t.ratio)));
    }

    #[test]
    fn test_flights_on_unselected_runways_are_hidden() {
        let runways = runways();
        let mut selection = RunwaySelection::initialize(runways.iter().map(|r| r.id));
        selection.toggle(RunwayId(1));
        let window = TimeWindow::new(from_unix_seconds(1_000).unwrap());
        let flights = vec![flight(1, 1, 1_100)];

        let view = TimelineView::build(&runways, &selection, &window, &flights);
        assert_eq!(view.flight_count(), 0);
    }
}
