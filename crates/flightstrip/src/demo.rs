//! Sample data for the board.
//!
//! Generates a plausible mix of arrivals and departures spread over the
//! next hour, plus a handful of news articles. The RNG is passed in so
//! tests can use a seeded generator.

use chrono::{DateTime, Duration, Utc};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::DemoConfig;
use crate::model::{FlightKind, NewFlight, NewNewsArticle, RunwayId};

/// Airline designators used for generated callsigns.
pub const AIRLINES: [&str; 10] = ["LH", "OS", "BA", "AF", "KL", "EW", "U2", "FR", "W6", "LX"];

/// ICAO airports used as origins and destinations.
pub const AIRPORTS: [&str; 10] = [
    "EDDF", "LOWW", "EGLL", "LFPG", "EHAM", "LSZH", "EDDM", "LIRF", "LEMD", "LFPO",
];

/// Aircraft type designators.
pub const AIRCRAFT_TYPES: [&str; 10] = [
    "A320", "A321", "B737", "B738", "E190", "A319", "B789", "A359", "E195", "DH8D",
];

/// What to generate when populating the database.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DemoPlan {
    /// Runways to create, in insertion order.
    pub runway_names: Vec<String>,
    /// Number of flights; the first half are arrivals.
    pub flight_count: usize,
    /// Flights are scheduled within `[now, now + horizon)`.
    pub horizon: Duration,
}

impl From<&DemoConfig> for DemoPlan {
    fn from(config: &DemoConfig) -> Self {
        Self {
            runway_names: config.runway_names.clone(),
            flight_count: config.flight_count,
            horizon: Duration::minutes(i64::from(config.horizon_minutes)),
        }
    }
}

impl Default for DemoPlan {
    fn default() -> Self {
        Self::from(&DemoConfig::default())
    }
}

fn pick<'a, R: Rng + ?Sized>(rng: &mut R, values: &[&'a str]) -> &'a str {
    values.choose(rng).copied().unwrap_or_default()
}

/// Generate flights for `runway_ids`, sorted by scheduled time.
///
/// Arrivals carry an origin, departures a destination. Returns nothing when
/// there is no runway to assign flights to.
pub fn generate_flights<R: Rng + ?Sized>(
    rng: &mut R,
    plan: &DemoPlan,
    runway_ids: &[RunwayId],
    now: DateTime<Utc>,
) -> Vec<NewFlight> {
    if runway_ids.is_empty() {
        return Vec::new();
    }

    let arrivals = plan.flight_count - plan.flight_count / 2;
    let horizon_secs = plan.horizon.num_seconds().max(1);

    let mut flights: Vec<NewFlight> = (0..plan.flight_count)
        .map(|i| {
            let kind = if i < arrivals {
                FlightKind::Arrival
            } else {
                FlightKind::Departure
            };
            let callsign = format!("{}{}", pick(rng, &AIRLINES), rng.gen_range(100..1000));
            let aircraft_type = pick(rng, &AIRCRAFT_TYPES).to_string();
            let airport = pick(rng, &AIRPORTS).to_string();
            let runway_id = runway_ids[rng.gen_range(0..runway_ids.len())];
            let scheduled_time = now + Duration::seconds(rng.gen_range(0..horizon_secs));

            let (origin, destination) = match kind {
                FlightKind::Arrival => (Some(airport), None),
                FlightKind::Departure => (None, Some(airport)),
            };

            NewFlight {
                callsign,
                kind,
                scheduled_time,
                runway_id,
                origin,
                destination,
                aircraft_type: Some(aircraft_type),
            }
        })
        .collect();

    flights.sort_by_key(|f| f.scheduled_time);
    flights
}

/// The five sample news articles, with validity relative to `now`.
#[must_use]
pub fn sample_news(now: DateTime<Utc>) -> Vec<NewNewsArticle> {
    let article = |title: &str, content: &str, from: Duration, to: Option<Duration>| NewNewsArticle {
        title: title.to_string(),
        content: content.to_string(),
        valid_from: now - from,
        valid_to: to.map(|d| now + d),
    };

    vec![
        article(
            "New: Flight Strip Demo is live",
            "Welcome to the **Air Tower Flight Strip Demo**.\n\n\
             - Populate sample data with `fstrip populate`\n\
             - Watch arrivals and departures appear across runways\n\n\
             This article supports Markdown.",
            Duration::days(2),
            None,
        ),
        article(
            "Tip: Use the timeline to spot conflicts",
            "When the timeline gets busy, look for clusters of **similar scheduled times**.\n\n\
             You can regenerate data at any time to get new combinations.",
            Duration::hours(6),
            None,
        ),
        article(
            "Maintenance window (demo)",
            "We will perform database maintenance later today.\n\n\
             If you see issues, try repopulating the demo data.",
            Duration::minutes(30),
            Some(Duration::hours(6)),
        ),
        article(
            "Markdown example",
            "# Heading\n\nHere is a list:\n\n- Item 1\n- Item 2\n\n\
             And a link: [Rust](https://www.rust-lang.org).",
            Duration::minutes(10),
            None,
        ),
        article(
            "Runway update (demo)",
            "Runway **09R** is preferred for departures in this demo dataset.\n\n\
             _(This is sample content.)_",
            Duration::minutes(1),
            None,
        ),
    ]
}
