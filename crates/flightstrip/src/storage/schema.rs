//! `SQLite` schema definitions for flightstrip.
//!
//! Times are stored as integer unix seconds (UTC).

/// SQL statement to create the runways table.
pub const CREATE_RUNWAYS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS runways (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT NOT NULL
)
";

/// Unique index on runway names.
pub const CREATE_RUNWAY_NAME_INDEX: &str = r"
CREATE UNIQUE INDEX IF NOT EXISTS name_unique_idx ON runways(name)
";

/// SQL statement to create the flights table.
pub const CREATE_FLIGHTS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS flights (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    callsign TEXT NOT NULL,
    type TEXT NOT NULL CHECK (type IN ('arrival', 'departure')),
    scheduled_time INTEGER NOT NULL,
    runway_id INTEGER NOT NULL REFERENCES runways(id),
    origin TEXT,
    destination TEXT,
    aircraft_type TEXT
)
";

/// Index serving the timeline range query.
pub const CREATE_FLIGHT_RUNWAY_TIME_INDEX: &str = r"
CREATE INDEX IF NOT EXISTS idx_flights_runway_time ON flights(runway_id, scheduled_time)
";

/// SQL statement to create the news table.
pub const CREATE_NEWS_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS news (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    title TEXT NOT NULL,
    content TEXT NOT NULL,
    valid_from INTEGER NOT NULL DEFAULT (strftime('%s', 'now')),
    valid_to INTEGER
)
";

/// SQL statement to create the metadata table for storing key-value pairs.
pub const CREATE_METADATA_TABLE: &str = r"
CREATE TABLE IF NOT EXISTS metadata (
    key TEXT PRIMARY KEY,
    value TEXT NOT NULL
)
";

/// All schema creation statements in order.
pub const SCHEMA_STATEMENTS: &[&str] = &[
    CREATE_RUNWAYS_TABLE,
    CREATE_RUNWAY_NAME_INDEX,
    CREATE_FLIGHTS_TABLE,
    CREATE_FLIGHT_RUNWAY_TIME_INDEX,
    CREATE_NEWS_TABLE,
    CREATE_METADATA_TABLE,
];
