//! `fstrip` - CLI for flightstrip
//!
//! This binary provides the command-line interface for populating the demo
//! database, querying runways, flights and news, and running the live board.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::Utc;
use clap::Parser;
use rand::rngs::StdRng;
use rand::SeedableRng;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;

use flightstrip::board::{format_hhmm_z, write_frame};
use flightstrip::cli::{
    BoardCommand, BoardInput, Cli, Command, ConfigCommand, FlightsCommand, NewsCommand,
    OutputFormat, PopulateCommand, RunwaysCommand, StatsCommand,
};
use flightstrip::demo::DemoPlan;
use flightstrip::news::render_article;
use flightstrip::poll::{self, PollHandle, PollOptions, SessionSnapshot};
use flightstrip::source::{FlightQuery, SqliteSource};
use flightstrip::timeline::TimeWindow;
use flightstrip::{init_logging, Config, Storage};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone()).context("failed to load configuration")?;

    match cli.command {
        Command::Populate(cmd) => handle_populate(&config, &cmd),
        Command::Runways(cmd) => handle_runways(&config, &cmd),
        Command::Flights(cmd) => handle_flights(&config, &cmd),
        Command::Board(cmd) => handle_board(&config, &cmd).await,
        Command::News(cmd) => handle_news(&config, &cmd),
        Command::Stats(cmd) => handle_stats(&config, &cmd),
        Command::Config(cmd) => handle_config(&config, cmd),
    }
}

fn open_storage(config: &Config) -> Result<Storage> {
    let path = config.database_path();
    Storage::open(&path).with_context(|| format!("cannot open database {}", path.display()))
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn handle_populate(config: &Config, cmd: &PopulateCommand) -> Result<()> {
    let mut storage = open_storage(config)?;
    let plan = DemoPlan::from(&config.demo);
    let now = Utc::now();

    let counts = match cmd.seed {
        Some(seed) => storage.populate_demo(&plan, &mut StdRng::seed_from_u64(seed), now)?,
        None => storage.populate_demo(&plan, &mut rand::thread_rng(), now)?,
    };

    match cmd.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "ok": true, "counts": counts })),
        OutputFormat::Plain => {
            println!("Populated {}", storage.path().display());
            println!("  Runways: {}", counts.runways);
            println!("  Flights: {}", counts.flights);
            println!("  News:    {}", counts.news);
            Ok(())
        }
    }
}

fn handle_runways(config: &Config, cmd: &RunwaysCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        RunwaysCommand::List { format } => {
            let runways = storage.list_runways()?;
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "runways": runways }))?,
                OutputFormat::Plain if runways.is_empty() => println!("No runways configured."),
                OutputFormat::Plain => {
                    for runway in &runways {
                        println!("{:>4}  {}", runway.id, runway.name);
                    }
                }
            }
        }
        RunwaysCommand::Ensure => {
            let added = storage.ensure_runways(&config.demo.runway_names)?;
            if added.is_empty() {
                println!("All runways already exist.");
            } else {
                println!("Added runways: {}", added.join(", "));
            }
        }
    }
    Ok(())
}

fn handle_flights(config: &Config, cmd: &FlightsCommand) -> Result<()> {
    let storage = open_storage(config)?;

    let runway_ids = match &cmd.runways {
        Some(ids) => ids.clone(),
        None => storage
            .list_runways()?
            .iter()
            .map(|runway| runway.id.to_string())
            .collect::<Vec<_>>()
            .join(","),
    };
    let query = FlightQuery::parse(Some(&runway_ids), Some(&cmd.start), Some(&cmd.end))?;
    let flights = storage.flights_in_range(&query)?;

    match cmd.format {
        OutputFormat::Json => print_json(&serde_json::json!({ "flights": flights }))?,
        OutputFormat::Plain => {
            for flight in &flights {
                println!(
                    "{:>5}  {:<8} {}  {}  rwy {}  {}",
                    flight.id,
                    flight.callsign,
                    flight.kind.shorthand(),
                    format_hhmm_z(flight.scheduled_time),
                    flight.runway_id,
                    flight
                        .origin
                        .as_deref()
                        .or(flight.destination.as_deref())
                        .unwrap_or("-"),
                );
            }
            println!("{} flight(s)", flights.len());
        }
    }
    Ok(())
}

async fn handle_board(config: &Config, cmd: &BoardCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let source = Arc::new(SqliteSource::new(storage));

    let mut options = PollOptions::from_config(config, Utc::now());
    if let Some(span) = cmd.window {
        options.window = TimeWindow::with_span(options.window.start(), span);
    }
    if let Some(secs) = cmd.interval {
        options = options.with_interval(Duration::from_secs(secs));
    }

    let handle = poll::spawn(source, options);
    let result = if cmd.once {
        print_settled_frame(&handle).await
    } else {
        run_live_board(&handle).await
    };
    handle.shutdown().await;
    result
}

fn print_frame(snapshot: &SessionSnapshot) -> std::io::Result<()> {
    write_frame(&mut std::io::stdout().lock(), snapshot)
}

async fn print_settled_frame(handle: &PollHandle) -> Result<()> {
    let mut updates = handle.subscribe();
    let snapshot = updates
        .wait_for(|s| !s.runways_loading && !s.fetch.loading)
        .await
        .context("board session ended early")?;
    print_frame(&snapshot).context("failed to write board")
}

async fn run_live_board(handle: &PollHandle) -> Result<()> {
    let mut updates = handle.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    eprintln!("{}", BoardInput::HELP);

    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = SessionSnapshot::clone(&updates.borrow_and_update());
                match print_frame(&snapshot) {
                    Ok(()) => {}
                    Err(e) if e.kind() == ErrorKind::BrokenPipe => {
                        info!("Output closed; stopping board");
                        break;
                    }
                    Err(e) => return Err(e).context("failed to write board"),
                }
            }

            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                match BoardInput::parse(&line) {
                    Some(BoardInput::Quit) => break,
                    Some(BoardInput::ZoomIn) => handle.zoom_in()?,
                    Some(BoardInput::ZoomOut) => handle.zoom_out()?,
                    Some(BoardInput::Toggle(id)) => handle.toggle_runway(id)?,
                    Some(BoardInput::Refresh) => handle.refresh()?,
                    Some(BoardInput::Help) => eprintln!("{}", BoardInput::HELP),
                    None if line.trim().is_empty() => {}
                    None => eprintln!("unknown command '{}'; {}", line.trim(), BoardInput::HELP),
                }
            }

            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }
    Ok(())
}

fn handle_news(config: &Config, cmd: &NewsCommand) -> Result<()> {
    let storage = open_storage(config)?;
    match cmd {
        NewsCommand::List { all, format } => {
            let articles = if *all {
                storage.all_news()?
            } else {
                storage.active_news(Utc::now())?
            };
            match format {
                OutputFormat::Json => print_json(&serde_json::json!({ "news": articles }))?,
                OutputFormat::Plain if articles.is_empty() => println!("No news."),
                OutputFormat::Plain => {
                    for article in &articles {
                        let until = article
                            .valid_to
                            .map(|to| format!(" until {}", to.format("%Y-%m-%d %H:%MZ")))
                            .unwrap_or_default();
                        println!(
                            "{:>4}  {}  (from {}{})",
                            article.id,
                            article.title,
                            article.valid_from.format("%Y-%m-%d %H:%MZ"),
                            until
                        );
                    }
                }
            }
        }
        NewsCommand::Show { id } => {
            let Some(article) = storage.news_article(*id)? else {
                bail!("news article {id} not found");
            };
            print!("{}", render_article(&article));
        }
    }
    Ok(())
}

fn handle_stats(config: &Config, cmd: &StatsCommand) -> Result<()> {
    let storage = open_storage(config)?;
    let counts = storage.counts()?;
    match cmd.format {
        OutputFormat::Json => print_json(&serde_json::json!({
            "database_path": storage.path(),
            "counts": counts,
        })),
        OutputFormat::Plain => {
            println!("fstrip stats");
            println!("------------");
            println!("Database:  {}", storage.path().display());
            println!("Runways:   {}", counts.runways);
            println!("Flights:   {}", counts.flights);
            println!("News:      {}", counts.news);
            Ok(())
        }
    }
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                print_json(config)?;
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!();
                println!("[Timeline]");
                println!(
                    "  Default window:     {} min",
                    config.timeline.default_window_minutes
                );
                println!(
                    "  Refresh interval:   {} s",
                    config.timeline.refresh_interval_secs
                );
                println!();
                println!("[Demo]");
                println!("  Runways:            {}", config.demo.runway_names.join(", "));
                println!("  Flights:            {}", config.demo.flight_count);
                println!("  Horizon:            {} min", config.demo.horizon_minutes);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => bail!("configuration error: {e}"),
            }
        }
    }
    Ok(())
}
