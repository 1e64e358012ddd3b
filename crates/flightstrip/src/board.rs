//! Plain-text rendering of the timeline board.

use std::fmt;
use std::io;

use chrono::{DateTime, Utc};

use crate::model::Runway;
use crate::poll::SessionSnapshot;
use crate::timeline::{Lane, RunwaySelection, TimelineView};

/// Format an instant as `HH:MMZ` in UTC.
#[must_use]
pub fn format_hhmm_z(instant: DateTime<Utc>) -> String {
    instant.format("%H:%MZ").to_string()
}

/// Label shown next to a flight: callsign, `A`/`D` and time.
#[must_use]
pub fn flight_label(callsign: &str, shorthand: char, at: DateTime<Utc>) -> String {
    format!("{callsign} {shorthand} {}", format_hhmm_z(at))
}

/// One full board frame.
///
/// Renders the runway picker, the window header, status lines and one block
/// per selected runway in which tick marks and flights are interleaved in
/// time order.
#[derive(Debug, Clone, Copy)]
pub struct BoardFrame<'a> {
    /// Every known runway.
    pub runways: &'a [Runway],
    /// Which runways are shown.
    pub selection: &'a RunwaySelection,
    /// The derived timeline.
    pub view: &'a TimelineView,
    /// Last error, if any.
    pub error: Option<&'a str>,
    /// Whether a request is outstanding.
    pub loading: bool,
}

impl<'a> BoardFrame<'a> {
    /// Frame for a session snapshot and its derived view.
    #[must_use]
    pub fn new(snapshot: &'a SessionSnapshot, view: &'a TimelineView) -> Self {
        Self {
            runways: &snapshot.runways,
            selection: &snapshot.selection,
            view,
            error: snapshot.fetch.error.as_deref(),
            loading: snapshot.fetch.loading || snapshot.runways_loading,
        }
    }
}

/// Render `snapshot` as one frame to `out` and flush it.
///
/// # Errors
///
/// Returns the writer's error, e.g. `BrokenPipe` once the reader has gone.
pub fn write_frame<W: io::Write>(out: &mut W, snapshot: &SessionSnapshot) -> io::Result<()> {
    let view = snapshot.view();
    writeln!(out, "{}", BoardFrame::new(snapshot, &view))?;
    out.flush()
}

impl fmt::Display for BoardFrame<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.runways.is_empty() && !self.loading {
            writeln!(f, "No runways configured.")?;
            if let Some(error) = self.error {
                writeln!(f, "Error: {error}")?;
            }
            return Ok(());
        }

        let picker: Vec<String> = self
            .runways
            .iter()
            .map(|runway| {
                let mark = if self.selection.contains(runway.id) { 'x' } else { ' ' };
                format!("[{mark}] {} {}", runway.id, runway.name)
            })
            .collect();
        writeln!(f, "Runways: {}", picker.join("  "))?;

        writeln!(
            f,
            "Window (UTC): {} - {} ({} min){}{}",
            format_hhmm_z(self.view.start),
            format_hhmm_z(self.view.end),
            self.view.span.minutes(),
            if self.view.can_zoom_in { "  [+]" } else { "" },
            if self.view.can_zoom_out { "  [-]" } else { "" },
        )?;

        if let Some(error) = self.error {
            writeln!(f, "Error: {error}")?;
        }
        if self.loading {
            writeln!(f, "Loading...")?;
        }

        for lane in &self.view.lanes {
            writeln!(f)?;
            write_lane(f, self.view, lane)?;
        }
        Ok(())
    }
}

fn write_lane(f: &mut fmt::Formatter<'_>, view: &TimelineView, lane: &Lane) -> fmt::Result {
    writeln!(
        f,
        "Runway {} ({} flights)",
        lane.runway.name,
        lane.flights.len()
    )?;

    let mut ticks = view.ticks.iter().peekable();
    for placed in &lane.flights {
        while let Some(tick) = ticks.next_if(|tick| tick.at <= placed.flight.scheduled_time) {
            writeln!(f, "  {:>4.0}%  --- {}", tick.ratio * 100.0, format_hhmm_z(tick.at))?;
        }
        writeln!(
            f,
            "  {:>4.0}%  {}",
            placed.ratio * 100.0,
            flight_label(
                &placed.flight.callsign,
                placed.flight.kind.shorthand(),
                placed.flight.scheduled_time
            )
        )?;
    }
    for tick in ticks {
        writeln!(f, "  {:>4.0}%  --- {}", tick.ratio * 100.0, format_hhmm_z(tick.at))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{from_unix_seconds, Flight, FlightId, FlightKind, RunwayId};
    use crate::timeline::{TimeWindow, WindowSpan};

    fn at(seconds: i64) -> DateTime<Utc> {
        from_unix_seconds(seconds).unwrap()
    }

    fn runways() -> Vec<Runway> {
        vec![
            Runway {
                id: RunwayId(1),
                name: "09L".to_string(),
            },
            Runway {
                id: RunwayId(2),
                name: "27".to_string(),
            },
        ]
    }

    fn flight(id: i64, callsign: &str, kind: FlightKind, seconds: i64, runway: i64) -> Flight {
        Flight {
            id: FlightId(id),
            callsign: callsign.to_string(),
            kind,
            scheduled_time: at(seconds),
            runway_id: RunwayId(runway),
            origin: None,
            destination: None,
            aircraft_type: None,
        }
    }

    #[test]
    fn test_format_hhmm_z() {
        assert_eq!(format_hhmm_z(at(0)), "00:00Z");
        assert_eq!(format_hhmm_z(at(14 * 3600 + 5 * 60 + 59)), "14:05Z");
    }

    #[test]
    fn test_flight_label() {
        assert_eq!(flight_label("BA123", 'A', at(3_600)), "BA123 A 01:00Z");
    }

    #[test]
    fn test_render_board() {
        let runways = runways();
        let selection = RunwaySelection::initialize([RunwayId(1), RunwayId(2)]);
        let window = TimeWindow::with_span(at(0), WindowSpan::TenMinutes);
        let flights = vec![
            flight(1, "BA123", FlightKind::Arrival, 120, 1),
            flight(2, "LH400", FlightKind::Departure, 420, 1),
        ];
        let view = TimelineView::build(&runways, &selection, &window, &flights);
        let frame = BoardFrame {
            runways: &runways,
            selection: &selection,
            view: &view,
            error: Some("connection refused"),
            loading: false,
        };

        let text = frame.to_string();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "Runways: [x] 1 09L  [x] 2 27");
        assert_eq!(lines[1], "Window (UTC): 00:00Z - 00:10Z (10 min)  [-]");
        assert_eq!(lines[2], "Error: connection refused");
        assert!(text.contains("Runway 09L (2 flights)"));
        assert!(text.contains("Runway 27 (0 flights)"));
        assert!(text.contains("    20%  BA123 A 00:02Z"));
        assert!(text.contains("    70%  LH400 D 00:07Z"));

        let lane: Vec<&str> = lines
            .iter()
            .skip_while(|line| !line.starts_with("Runway 09L"))
            .skip(1)
            .take(5)
            .copied()
            .collect();
        assert_eq!(
            lane,
            vec![
                "     0%  --- 00:00Z",
                "    20%  BA123 A 00:02Z",
                "    50%  --- 00:05Z",
                "    70%  LH400 D 00:07Z",
                "   100%  --- 00:10Z",
            ]
        );
    }

    #[test]
    fn test_render_without_runways() {
        let selection = RunwaySelection::default();
        let window = TimeWindow::new(at(0));
        let view = TimelineView::build(&[], &selection, &window, &[]);
        let frame = BoardFrame {
            runways: &[],
            selection: &selection,
            view: &view,
            error: None,
            loading: false,
        };
        assert_eq!(frame.to_string(), "No runways configured.\n");
    }

    #[test]
    fn test_render_loading() {
        let runways = runways();
        let selection = RunwaySelection::initialize([RunwayId(1), RunwayId(2)]);
        let window = TimeWindow::new(at(0));
        let view = TimelineView::build(&runways, &selection, &window, &[]);
        let frame = BoardFrame {
            runways: &runways,
            selection: &selection,
            view: &view,
            error: None,
            loading: true,
        };
        let text = frame.to_string();
        assert!(text.contains("Loading..."));
        assert!(text.contains("(15 min)  [+]  [-]"));
    }

    /// Accepts nothing, like stdout after the reader has closed the pipe.
    struct ClosedPipe;

    impl io::Write for ClosedPipe {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::ErrorKind::BrokenPipe.into())
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::ErrorKind::BrokenPipe.into())
        }
    }

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            runways: runways(),
            runways_loading: false,
            selection: RunwaySelection::initialize([RunwayId(1), RunwayId(2)]),
            window: TimeWindow::with_span(at(0), WindowSpan::TenMinutes),
            fetch: crate::poll::FetchSnapshot::default(),
        }
    }

    #[test]
    fn test_write_frame() {
        let mut out = Vec::new();
        write_frame(&mut out, &snapshot()).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Runways: [x] 1 09L  [x] 2 27\n"));
        assert!(text.contains("Runway 09L (0 flights)"));
    }

    #[test]
    fn test_write_frame_reports_closed_pipe() {
        let err = write_frame(&mut ClosedPipe, &snapshot()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
    }
}
