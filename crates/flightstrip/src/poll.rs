//! Periodic flight polling for a live board session.
//!
//! A session is a single tokio task that owns the runway list, the runway
//! selection, the time window and the fetched flights. It re-queries the
//! [`FlightSource`] on a fixed interval and whenever the window or the
//! selection changes, and publishes a [`SessionSnapshot`] through a watch
//! channel after every state change.
//!
//! Requests may overlap. Each one is tagged with a [`Generation`] and only a
//! response for the most recently issued generation is applied; anything
//! older is counted and dropped. The bookkeeping lives in [`RequestLedger`],
//! which is synchronous so the ordering rules can be tested directly.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::{mpsc, oneshot, watch};
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::model::{truncate_to_seconds, Flight, Runway, RunwayId};
use crate::source::{self, FlightQuery, FlightSource};
use crate::timeline::{RunwaySelection, TimeWindow, TimelineView};

/// Default time between automatic refreshes.
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(10);

/// Identifies one issued flight request. Later requests have larger values.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Generation(u64);

impl Generation {
    /// The raw counter value.
    #[must_use]
    pub fn get(self) -> u64 {
        self.0
    }
}

/// What happened to a completed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The flights replaced the previous ones.
    Applied,
    /// The error was recorded; previous flights are kept.
    Failed,
    /// A newer request was issued meanwhile; the response was dropped.
    Superseded,
    /// The session is gone; the response was dropped.
    TornDown,
}

/// Fetch-related part of the session state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FetchSnapshot {
    /// Flights from the last successful request.
    pub flights: Vec<Flight>,
    /// Message of the last failure, cleared by the next success.
    pub error: Option<String>,
    /// Whether the latest request is still outstanding.
    pub loading: bool,
    /// The most recently issued generation.
    pub latest: Generation,
    /// Responses dropped because a newer request had been issued.
    pub superseded: u64,
}

/// Synchronous "last request wins" bookkeeping.
#[derive(Debug, Default)]
pub struct RequestLedger {
    state: FetchSnapshot,
    torn_down: bool,
}

impl RequestLedger {
    /// Create an empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new request. Returns `None` once torn down.
    pub fn begin(&mut self) -> Option<Generation> {
        if self.torn_down {
            return None;
        }
        self.state.latest = Generation(self.state.latest.0 + 1);
        self.state.loading = true;
        Some(self.state.latest)
    }

    /// Record the response for `generation`.
    pub fn complete(
        &mut self,
        generation: Generation,
        result: source::Result<Vec<Flight>>,
    ) -> Outcome {
        if self.torn_down {
            return Outcome::TornDown;
        }
        if generation != self.state.latest {
            self.state.superseded += 1;
            return Outcome::Superseded;
        }

        self.state.loading = false;
        match result {
            Ok(flights) => {
                self.state.flights = flights;
                self.state.error = None;
                Outcome::Applied
            }
            Err(err) => {
                self.state.error = Some(err.to_string());
                Outcome::Failed
            }
        }
    }

    /// Resolve a trigger without asking the source: no runway is selected.
    ///
    /// Advances the generation so any outstanding response is dropped.
    pub fn clear(&mut self) {
        if self.torn_down {
            return;
        }
        self.state.latest = Generation(self.state.latest.0 + 1);
        self.state.flights.clear();
        self.state.error = None;
        self.state.loading = false;
    }

    /// Record a failure that did not come from a flight request.
    pub fn report(&mut self, message: impl Into<String>) {
        if !self.torn_down {
            self.state.error = Some(message.into());
        }
    }

    /// Stop accepting anything. Idempotent.
    pub fn teardown(&mut self) {
        self.torn_down = true;
        self.state.loading = false;
    }

    /// Whether [`teardown`](Self::teardown) has been called.
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    /// Current fetch state.
    #[must_use]
    pub fn snapshot(&self) -> &FetchSnapshot {
        &self.state
    }
}

/// Everything a reader needs to render the board.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    /// Known runways, ordered by name.
    pub runways: Vec<Runway>,
    /// Whether the runway list is being (re)loaded.
    pub runways_loading: bool,
    /// Visible runways.
    pub selection: RunwaySelection,
    /// Current window.
    pub window: TimeWindow,
    /// Fetch state.
    pub fetch: FetchSnapshot,
}

impl SessionSnapshot {
    fn new(window: TimeWindow) -> Self {
        Self {
            runways: Vec::new(),
            runways_loading: true,
            selection: RunwaySelection::default(),
            window,
            fetch: FetchSnapshot::default(),
        }
    }

    /// Derive the renderable timeline.
    #[must_use]
    pub fn view(&self) -> TimelineView {
        TimelineView::build(
            &self.runways,
            &self.selection,
            &self.window,
            &self.fetch.flights,
        )
    }
}

/// How a session polls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollOptions {
    /// Time between automatic refreshes.
    pub interval: Duration,
    /// Initial window.
    pub window: TimeWindow,
}

impl PollOptions {
    /// Default interval with a 15 minute window starting at `start`.
    #[must_use]
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            interval: DEFAULT_INTERVAL,
            window: TimeWindow::new(truncate_to_seconds(start)),
        }
    }

    /// Interval and window span from the configuration.
    #[must_use]
    pub fn from_config(config: &Config, start: DateTime<Utc>) -> Self {
        Self {
            interval: config.refresh_interval(),
            window: TimeWindow::with_span(truncate_to_seconds(start), config.default_window()),
        }
    }

    /// Override the refresh interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }
}

/// The session task has exited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("polling session has shut down")]
pub struct SessionClosed;

#[derive(Debug)]
enum Command {
    Toggle(RunwayId),
    ZoomIn,
    ZoomOut,
    Refresh,
    Shutdown(oneshot::Sender<()>),
}

enum Completion {
    Runways(source::Result<Vec<Runway>>),
    Flights(Generation, source::Result<Vec<Flight>>),
}

/// Control handle for a running session.
///
/// Dropping the handle shuts the session down.
#[derive(Debug)]
pub struct PollHandle {
    commands: mpsc::UnboundedSender<Command>,
    state: watch::Receiver<SessionSnapshot>,
    task: JoinHandle<()>,
}

impl PollHandle {
    /// Toggle a runway in or out of the selection.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has exited.
    pub fn toggle_runway(&self, id: RunwayId) -> Result<(), SessionClosed> {
        self.send(Command::Toggle(id))
    }

    /// Shorten the window by one step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has exited.
    pub fn zoom_in(&self) -> Result<(), SessionClosed> {
        self.send(Command::ZoomIn)
    }

    /// Lengthen the window by one step.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has exited.
    pub fn zoom_out(&self) -> Result<(), SessionClosed> {
        self.send(Command::ZoomOut)
    }

    /// Fetch now instead of waiting for the next tick.
    ///
    /// # Errors
    ///
    /// Returns [`SessionClosed`] if the session has exited.
    pub fn refresh(&self) -> Result<(), SessionClosed> {
        self.send(Command::Refresh)
    }

    /// A new receiver for state updates.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionSnapshot> {
        self.state.clone()
    }

    /// The latest published state.
    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot::clone(&self.state.borrow())
    }

    /// Stop the session and wait for the task to exit.
    ///
    /// No state is published after this returns.
    pub async fn shutdown(self) {
        let (ack_tx, ack_rx) = oneshot::channel();
        if self.commands.send(Command::Shutdown(ack_tx)).is_ok() {
            let _ = ack_rx.await;
        }
        if let Err(e) = self.task.await {
            warn!("Polling session task failed: {}", e);
        }
    }

    fn send(&self, command: Command) -> Result<(), SessionClosed> {
        self.commands.send(command).map_err(|_| SessionClosed)
    }
}

/// Start a polling session on the current tokio runtime.
pub fn spawn<S>(source: Arc<S>, options: PollOptions) -> PollHandle
where
    S: FlightSource + ?Sized + 'static,
{
    let (commands_tx, commands_rx) = mpsc::unbounded_channel();
    let (state_tx, state_rx) = watch::channel(SessionSnapshot::new(options.window));
    let (completions_tx, completions_rx) = mpsc::unbounded_channel();

    let session = Session {
        source,
        state: SessionSnapshot::new(options.window),
        ledger: RequestLedger::new(),
        runway_request_pending: false,
        completions: completions_tx,
        in_flight: JoinSet::new(),
        published: state_tx,
    };
    let task = tokio::spawn(session.run(commands_rx, completions_rx, options.interval));

    PollHandle {
        commands: commands_tx,
        state: state_rx,
        task,
    }
}

struct Session<S: ?Sized> {
    source: Arc<S>,
    state: SessionSnapshot,
    ledger: RequestLedger,
    runway_request_pending: bool,
    completions: mpsc::UnboundedSender<Completion>,
    in_flight: JoinSet<()>,
    published: watch::Sender<SessionSnapshot>,
}

impl<S> Session<S>
where
    S: FlightSource + ?Sized + 'static,
{
    async fn run(
        mut self,
        mut commands: mpsc::UnboundedReceiver<Command>,
        mut completions: mpsc::UnboundedReceiver<Completion>,
        interval: Duration,
    ) {
        info!(
            interval_secs = interval.as_secs_f64(),
            span = %self.state.window.span(),
            "Polling session started"
        );

        let mut ticker = tokio::time::interval_at(Instant::now() + interval, interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        self.load_runways();
        self.publish();

        let ack = loop {
            tokio::select! {
                biased;

                command = commands.recv() => match command {
                    None => break None,
                    Some(Command::Shutdown(ack)) => break Some(ack),
                    Some(command) => {
                        if self.handle_command(command) {
                            ticker.reset();
                        }
                    }
                },

                Some(completion) = completions.recv() => self.handle_completion(completion),

                _ = ticker.tick() => {
                    if self.state.runways.is_empty() {
                        self.load_runways();
                    } else {
                        self.fetch_flights();
                    }
                    self.publish();
                }

                Some(joined) = self.in_flight.join_next() => {
                    if let Err(e) = joined {
                        if e.is_panic() {
                            warn!("Fetch task panicked: {}", e);
                        }
                    }
                }
            }
        };

        self.ledger.teardown();
        self.in_flight.abort_all();
        info!(
            superseded = self.ledger.snapshot().superseded,
            "Polling session stopped"
        );
        if let Some(ack) = ack {
            let _ = ack.send(());
        }
    }

    /// Apply a command. Returns whether a fetch was triggered.
    fn handle_command(&mut self, command: Command) -> bool {
        let triggered = match command {
            Command::Toggle(id) => {
                let changed = self.state.selection.toggle(id);
                debug!(runway = %id, changed, "Toggled runway");
                changed
            }
            Command::ZoomIn => self.set_window(self.state.window.zoom_in()),
            Command::ZoomOut => self.set_window(self.state.window.zoom_out()),
            Command::Refresh => {
                if self.state.runways.is_empty() {
                    // Flights follow once the runways arrive; a fetch now would
                    // clear a pending runway error.
                    self.load_runways();
                    self.publish();
                    return false;
                }
                true
            }
            Command::Shutdown(_) => false,
        };

        if triggered {
            self.fetch_flights();
            self.publish();
        }
        triggered
    }

    fn set_window(&mut self, window: TimeWindow) -> bool {
        if window == self.state.window {
            return false;
        }
        debug!(span = %window.span(), "Window changed");
        self.state.window = window;
        true
    }

    fn handle_completion(&mut self, completion: Completion) {
        match completion {
            Completion::Runways(result) => {
                self.runway_request_pending = false;
                self.state.runways_loading = false;
                match result {
                    Ok(runways) => {
                        info!(count = runways.len(), "Loaded runways");
                        self.state
                            .selection
                            .refresh(runways.iter().map(|runway| runway.id));
                        self.state.runways = runways;
                        self.fetch_flights();
                    }
                    Err(e) => {
                        warn!(error = %e, "Failed to load runways");
                        self.ledger.report(e.to_string());
                    }
                }
            }
            Completion::Flights(generation, result) => {
                let count = result.as_ref().map(Vec::len).ok();
                match self.ledger.complete(generation, result) {
                    Outcome::Applied => {
                        debug!(generation = generation.get(), flights = count, "Applied flights");
                    }
                    Outcome::Failed => {
                        warn!(
                            generation = generation.get(),
                            error = self.ledger.snapshot().error.as_deref(),
                            "Flight poll failed"
                        );
                    }
                    Outcome::Superseded => {
                        debug!(generation = generation.get(), "Dropped superseded response");
                    }
                    Outcome::TornDown => return,
                }
            }
        }
        self.publish();
    }

    fn load_runways(&mut self) {
        if self.runway_request_pending {
            return;
        }
        self.runway_request_pending = true;
        self.state.runways_loading = true;

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        self.in_flight.spawn(async move {
            let result = source.list_runways().await;
            let _ = completions.send(Completion::Runways(result));
        });
    }

    fn fetch_flights(&mut self) {
        if self.state.selection.is_empty() {
            debug!("No runway selected; clearing flights");
            self.ledger.clear();
            return;
        }
        let Some(generation) = self.ledger.begin() else {
            return;
        };

        let query = FlightQuery::for_window(self.state.selection.ids(), &self.state.window);
        debug!(
            generation = generation.get(),
            runways = self.state.selection.len(),
            start = query.start().timestamp(),
            end = query.end().timestamp(),
            "Issuing flight request"
        );

        let source = Arc::clone(&self.source);
        let completions = self.completions.clone();
        self.in_flight.spawn(async move {
            let result = source.list_flights(&query).await;
            let _ = completions.send(Completion::Flights(generation, result));
        });
    }

    fn publish(&mut self) {
        if self.ledger.is_torn_down() {
            return;
        }
        self.state.fetch = self.ledger.snapshot().clone();
        self.published.send_replace(self.state.clone());
    }
}
