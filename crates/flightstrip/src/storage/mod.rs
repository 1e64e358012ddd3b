//! Storage layer for flightstrip.
//!
//! This module provides `SQLite`-based persistent storage for runways,
//! flights and news articles, including the timeline range query and the
//! single-transaction demo data reset.

pub mod migrations;
pub mod schema;

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use rand::Rng;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use serde::Serialize;
use tracing::{debug, info};

use crate::demo::{self, DemoPlan};
use crate::error::{Error, Result};
use crate::model::{
    from_unix_seconds, Flight, FlightId, FlightKind, NewFlight, NewNewsArticle, NewsArticle,
    Runway, RunwayId,
};
use crate::source::FlightQuery;

const FLIGHT_COLUMNS: &str =
    "id, callsign, type, scheduled_time, runway_id, origin, destination, aircraft_type";

const NEWS_COLUMNS: &str = "id, title, content, valid_from, valid_to";

/// Storage engine for the flight strip board.
#[derive(Debug)]
pub struct Storage {
    /// Path to the database file.
    path: PathBuf,
    /// Database connection.
    conn: Connection,
}

/// Row counts per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TableCounts {
    /// Number of runways.
    pub runways: i64,
    /// Number of flights.
    pub flights: i64,
    /// Number of news articles.
    pub news: i64,
}

impl Storage {
    /// Open or create a storage database at the given path.
    ///
    /// Creates the parent directories and database file if they don't exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or schema initialization fails.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent).map_err(|source| Error::DirectoryCreate {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        debug!("Opening database at {}", path.display());
        let conn = Connection::open(&path).map_err(|source| Error::DatabaseOpen {
            path: path.clone(),
            source,
        })?;

        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        Self::prepare(&conn)?;

        info!("Database opened successfully at {}", path.display());
        Ok(Self { path, conn })
    }

    /// Create an in-memory storage instance for testing.
    ///
    /// # Errors
    ///
    /// Returns an error if the in-memory database cannot be created.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().map_err(|source| Error::DatabaseOpen {
            path: PathBuf::from(":memory:"),
            source,
        })?;

        Self::prepare(&conn)?;

        Ok(Self {
            path: PathBuf::from(":memory:"),
            conn,
        })
    }

    fn prepare(conn: &Connection) -> Result<()> {
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        migrations::initialize_schema(conn)
    }

    /// Get the path to the database file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    // === Runways ===

    /// All runways, ordered by name.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn list_runways(&self) -> Result<Vec<Runway>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name FROM runways ORDER BY name ASC")?;
        let runways = stmt
            .query_map([], |row| {
                Ok(Runway {
                    id: RunwayId(row.get(0)?),
                    name: row.get(1)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(runways)
    }

    /// Insert a runway.
    ///
    /// # Errors
    ///
    /// Returns an error if the name is already taken or the database
    /// operation fails.
    pub fn insert_runway(&self, name: &str) -> Result<RunwayId> {
        insert_runway_row(&self.conn, name)
    }

    /// Insert every name in `names` that does not exist yet.
    ///
    /// Returns the names that were added.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn ensure_runways(&self, names: &[String]) -> Result<Vec<String>> {
        let mut added = Vec::new();
        for name in names {
            let inserted = self.conn.execute(
                "INSERT OR IGNORE INTO runways (name) VALUES (?1)",
                [name],
            )?;
            if inserted > 0 {
                info!("Added missing runway: {}", name);
                added.push(name.clone());
            }
        }
        if added.is_empty() {
            debug!("All required runways already exist");
        }
        Ok(added)
    }

    fn runway_exists(&self, id: RunwayId) -> Result<bool> {
        let found = self
            .conn
            .query_row("SELECT 1 FROM runways WHERE id = ?1", [id.0], |_| Ok(()))
            .optional()?;
        Ok(found.is_some())
    }

    // === Flights ===

    /// Insert a flight.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownRunway`] if the runway does not exist, or an
    /// error if the database operation fails.
    pub fn insert_flight(&self, flight: &NewFlight) -> Result<FlightId> {
        if !self.runway_exists(flight.runway_id)? {
            return Err(Error::UnknownRunway {
                id: flight.runway_id,
            });
        }
        insert_flight_row(&self.conn, flight)
    }

    /// Get a flight by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row is corrupt.
    pub fn flight(&self, id: FlightId) -> Result<Option<Flight>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {FLIGHT_COLUMNS} FROM flights WHERE id = ?1"),
                [id.0],
                FlightRow::from_row,
            )
            .optional()?;
        row.map(Flight::try_from).transpose()
    }

    /// Flights matching `query`, ascending by scheduled time.
    ///
    /// A query without runways matches nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row is corrupt.
    pub fn flights_in_range(&self, query: &FlightQuery) -> Result<Vec<Flight>> {
        if query.has_no_runways() {
            return Ok(Vec::new());
        }

        let mut values: Vec<i64> = query.runway_ids().map(|id| id.0).collect();
        let placeholders = vec!["?"; values.len()].join(", ");
        values.push(query.start().timestamp());
        values.push(query.end().timestamp());

        let mut stmt = self.conn.prepare(&format!(
            "SELECT {FLIGHT_COLUMNS} FROM flights \
             WHERE runway_id IN ({placeholders}) AND scheduled_time >= ? AND scheduled_time < ? \
             ORDER BY scheduled_time ASC, id ASC"
        ))?;

        let rows = stmt
            .query_map(params_from_iter(values), FlightRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(Flight::try_from).collect()
    }

    // === News ===

    /// Insert a news article.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn insert_news(&self, article: &NewNewsArticle) -> Result<i64> {
        insert_news_row(&self.conn, article)
    }

    /// Get a news article by its ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or the row is corrupt.
    pub fn news_article(&self, id: i64) -> Result<Option<NewsArticle>> {
        let row = self
            .conn
            .query_row(
                &format!("SELECT {NEWS_COLUMNS} FROM news WHERE id = ?1"),
                [id],
                NewsRow::from_row,
            )
            .optional()?;
        row.map(NewsArticle::try_from).transpose()
    }

    /// Articles valid at `now`, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row is corrupt.
    pub fn active_news(&self, now: DateTime<Utc>) -> Result<Vec<NewsArticle>> {
        self.query_news(
            &format!(
                "SELECT {NEWS_COLUMNS} FROM news \
                 WHERE valid_from <= ?1 AND (valid_to IS NULL OR valid_to > ?1) \
                 ORDER BY valid_from DESC, id DESC"
            ),
            &[now.timestamp()],
        )
    }

    /// Every article, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails or a row is corrupt.
    pub fn all_news(&self) -> Result<Vec<NewsArticle>> {
        self.query_news(
            &format!("SELECT {NEWS_COLUMNS} FROM news ORDER BY valid_from DESC, id DESC"),
            &[],
        )
    }

    fn query_news(&self, sql: &str, values: &[i64]) -> Result<Vec<NewsArticle>> {
        let mut stmt = self.conn.prepare(sql)?;
        let rows = stmt
            .query_map(params_from_iter(values), NewsRow::from_row)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        rows.into_iter().map(NewsArticle::try_from).collect()
    }

    // === Maintenance ===

    /// Row counts for every table.
    ///
    /// # Errors
    ///
    /// Returns an error if the database operation fails.
    pub fn counts(&self) -> Result<TableCounts> {
        let count = |table: &str| -> Result<i64> {
            Ok(self
                .conn
                .query_row(&format!("SELECT COUNT(*) FROM {table}"), [], |row| {
                    row.get(0)
                })?)
        };
        Ok(TableCounts {
            runways: count("runways")?,
            flights: count("flights")?,
            news: count("news")?,
        })
    }

    /// Replace all data with freshly generated demo data.
    ///
    /// Runs in a single transaction: flights, runways and news are deleted,
    /// then the planned runways, generated flights and sample news are
    /// inserted. Either everything is replaced or nothing is.
    ///
    /// # Errors
    ///
    /// Returns an error if any statement fails; the transaction is rolled back.
    pub fn populate_demo<R: Rng + ?Sized>(
        &mut self,
        plan: &DemoPlan,
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> Result<TableCounts> {
        let tx = self.conn.transaction()?;

        tx.execute("DELETE FROM flights", [])?;
        tx.execute("DELETE FROM runways", [])?;
        tx.execute("DELETE FROM news", [])?;

        let runway_ids = plan
            .runway_names
            .iter()
            .map(|name| insert_runway_row(&tx, name))
            .collect::<Result<Vec<_>>>()?;

        for flight in demo::generate_flights(rng, plan, &runway_ids, now) {
            insert_flight_row(&tx, &flight)?;
        }
        for article in demo::sample_news(now) {
            insert_news_row(&tx, &article)?;
        }

        tx.commit()?;

        let counts = self.counts()?;
        info!(
            runways = counts.runways,
            flights = counts.flights,
            news = counts.news,
            "Populated demo data"
        );
        Ok(counts)
    }
}

fn insert_runway_row(conn: &Connection, name: &str) -> Result<RunwayId> {
    conn.execute("INSERT INTO runways (name) VALUES (?1)", [name])?;
    let id = RunwayId(conn.last_insert_rowid());
    debug!("Inserted runway {} with id {}", name, id);
    Ok(id)
}

fn insert_flight_row(conn: &Connection, flight: &NewFlight) -> Result<FlightId> {
    conn.execute(
        r"
        INSERT INTO flights
            (callsign, type, scheduled_time, runway_id, origin, destination, aircraft_type)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
        ",
        params![
            flight.callsign,
            flight.kind.as_str(),
            flight.scheduled_time.timestamp(),
            flight.runway_id.0,
            flight.origin,
            flight.destination,
            flight.aircraft_type,
        ],
    )?;
    Ok(FlightId(conn.last_insert_rowid()))
}

fn insert_news_row(conn: &Connection, article: &NewNewsArticle) -> Result<i64> {
    conn.execute(
        "INSERT INTO news (title, content, valid_from, valid_to) VALUES (?1, ?2, ?3, ?4)",
        params![
            article.title,
            article.content,
            article.valid_from.timestamp(),
            article.valid_to.map(|t| t.timestamp()),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Raw flight columns before validation.
struct FlightRow {
    id: i64,
    callsign: String,
    kind: String,
    scheduled_time: i64,
    runway_id: i64,
    origin: Option<String>,
    destination: Option<String>,
    aircraft_type: Option<String>,
}

impl FlightRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            callsign: row.get(1)?,
            kind: row.get(2)?,
            scheduled_time: row.get(3)?,
            runway_id: row.get(4)?,
            origin: row.get(5)?,
            destination: row.get(6)?,
            aircraft_type: row.get(7)?,
        })
    }
}

impl TryFrom<FlightRow> for Flight {
    type Error = Error;

    fn try_from(row: FlightRow) -> Result<Self> {
        let corrupt = |message: String| Error::CorruptRow {
            table: "flights",
            id: row.id,
            message,
        };
        let kind = FlightKind::parse(&row.kind)
            .ok_or_else(|| corrupt(format!("unknown flight type '{}'", row.kind)))?;
        let scheduled_time = from_unix_seconds(row.scheduled_time)
            .ok_or_else(|| corrupt(format!("scheduled_time out of range: {}", row.scheduled_time)))?;

        Ok(Flight {
            id: FlightId(row.id),
            callsign: row.callsign,
            kind,
            scheduled_time,
            runway_id: RunwayId(row.runway_id),
            origin: row.origin,
            destination: row.destination,
            aircraft_type: row.aircraft_type,
        })
    }
}

/// Raw news columns before validation.
struct NewsRow {
    id: i64,
    title: String,
    content: String,
    valid_from: i64,
    valid_to: Option<i64>,
}

impl NewsRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            content: row.get(2)?,
            valid_from: row.get(3)?,
            valid_to: row.get(4)?,
        })
    }
}

impl TryFrom<NewsRow> for NewsArticle {
    type Error = Error;

    fn try_from(row: NewsRow) -> Result<Self> {
        let out_of_range = |column: &str, value: i64| Error::CorruptRow {
            table: "news",
            id: row.id,
            message: format!("{column} out of range: {value}"),
        };
        let valid_from =
            from_unix_seconds(row.valid_from).ok_or_else(|| out_of_range("valid_from", row.valid_from))?;
        let valid_to = row
            .valid_to
            .map(|to| from_unix_seconds(to).ok_or_else(|| out_of_range("valid_to", to)))
            .transpose()?;

        Ok(NewsArticle {
            id: row.id,
            title: row.title,
            content: row.content,
            valid_from,
            valid_to,
        })
    }
}
