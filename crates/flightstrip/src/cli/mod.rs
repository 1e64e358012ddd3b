//! Command-line interface for flightstrip.
//!
//! This module provides the CLI structure for the `fstrip` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    BoardCommand, BoardInput, ConfigCommand, FlightsCommand, NewsCommand, OutputFormat,
    PopulateCommand, RunwaysCommand, StatsCommand,
};

/// fstrip - Flight strip timeline board
///
/// Shows arrivals and departures per runway on a time axis that refreshes
/// itself, backed by a local `SQLite` database.
#[derive(Debug, Parser)]
#[command(name = "fstrip")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Replace all data with generated demo runways, flights and news
    Populate(PopulateCommand),

    /// List or bootstrap runways
    #[command(subcommand)]
    Runways(RunwaysCommand),

    /// Query flights in a time range
    Flights(FlightsCommand),

    /// Live timeline board
    Board(BoardCommand),

    /// Read news articles
    #[command(subcommand)]
    News(NewsCommand),

    /// Show database statistics
    Stats(StatsCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        crate::logging::Verbosity::from_flags(self.verbose, self.quiet)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::Verbosity;
    use crate::timeline::WindowSpan;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "fstrip");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity() {
        assert_eq!(parse(&["fstrip", "stats"]).verbosity(), Verbosity::Normal);
        assert_eq!(parse(&["fstrip", "-v", "stats"]).verbosity(), Verbosity::Verbose);
        assert_eq!(parse(&["fstrip", "-vv", "stats"]).verbosity(), Verbosity::Trace);
        assert_eq!(parse(&["fstrip", "-q", "stats"]).verbosity(), Verbosity::Quiet);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["fstrip", "-c", "/custom/config.toml", "stats"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_populate() {
        let cli = parse(&["fstrip", "populate", "--seed", "7", "-f", "json"]);
        match cli.command {
            Command::Populate(cmd) => {
                assert_eq!(cmd.seed, Some(7));
                assert_eq!(cmd.format, OutputFormat::Json);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_runways() {
        assert!(matches!(
            parse(&["fstrip", "runways", "list"]).command,
            Command::Runways(RunwaysCommand::List { .. })
        ));
        assert!(matches!(
            parse(&["fstrip", "runways", "ensure"]).command,
            Command::Runways(RunwaysCommand::Ensure)
        ));
    }

    #[test]
    fn test_parse_flights() {
        let cli = parse(&[
            "fstrip", "flights", "--start", "1000", "--end", "1900", "-r", "1,2",
        ]);
        match cli.command {
            Command::Flights(cmd) => {
                assert_eq!(cmd.start, "1000");
                assert_eq!(cmd.end, "1900");
                assert_eq!(cmd.runways.as_deref(), Some("1,2"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_flights_requires_range() {
        assert!(Cli::try_parse_from(["fstrip", "flights", "--start", "1"]).is_err());
    }

    #[test]
    fn test_parse_board() {
        let cli = parse(&["fstrip", "board", "-w", "60", "-i", "5", "--once"]);
        match cli.command {
            Command::Board(cmd) => {
                assert_eq!(cmd.window, Some(WindowSpan::OneHour));
                assert_eq!(cmd.interval, Some(5));
                assert!(cmd.once);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_board_rejects_bad_values() {
        assert!(Cli::try_parse_from(["fstrip", "board", "-w", "45"]).is_err());
        assert!(Cli::try_parse_from(["fstrip", "board", "-i", "0"]).is_err());
    }

    #[test]
    fn test_parse_news() {
        assert!(matches!(
            parse(&["fstrip", "news", "list", "--all"]).command,
            Command::News(NewsCommand::List { all: true, .. })
        ));
        assert!(matches!(
            parse(&["fstrip", "news", "show", "3"]).command,
            Command::News(NewsCommand::Show { id: 3 })
        ));
    }

    #[test]
    fn test_parse_config() {
        assert!(matches!(
            parse(&["fstrip", "config", "path"]).command,
            Command::Config(ConfigCommand::Path)
        ));
    }
}
