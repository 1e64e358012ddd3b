//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands, plus the
//! line commands understood by the live board.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::RunwayId;
use crate::timeline::WindowSpan;

/// Populate command arguments.
#[derive(Debug, Args)]
pub struct PopulateCommand {
    /// Seed the generator for reproducible data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Runway commands.
#[derive(Debug, Subcommand)]
pub enum RunwaysCommand {
    /// List runways
    List {
        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Create the configured runways that are missing
    Ensure,
}

/// Flights command arguments.
#[derive(Debug, Args)]
pub struct FlightsCommand {
    /// Range start, unix seconds (inclusive)
    #[arg(long)]
    pub start: String,

    /// Range end, unix seconds (exclusive)
    #[arg(long)]
    pub end: String,

    /// Comma-separated runway ids (default: all runways)
    #[arg(short, long, value_name = "IDS")]
    pub runways: Option<String>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Board command arguments.
#[derive(Debug, Args)]
pub struct BoardCommand {
    /// Initial window length in minutes (10, 15, 30, 60 or 120)
    #[arg(short, long, value_name = "MINUTES", value_parser = parse_window_span)]
    pub window: Option<WindowSpan>,

    /// Seconds between refreshes
    #[arg(short, long, value_name = "SECS", value_parser = clap::value_parser!(u64).range(1..))]
    pub interval: Option<u64>,

    /// Print a single frame and exit
    #[arg(long)]
    pub once: bool,
}

/// News commands.
#[derive(Debug, Subcommand)]
pub enum NewsCommand {
    /// List news articles (active ones by default)
    List {
        /// Include expired and scheduled articles
        #[arg(short, long)]
        all: bool,

        /// Output format
        #[arg(short, long, value_enum, default_value = "plain")]
        format: OutputFormat,
    },

    /// Show one article rendered as HTML
    Show {
        /// Article id
        id: i64,
    },
}

/// Stats command arguments.
#[derive(Debug, Args)]
pub struct StatsCommand {
    /// Output format
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: OutputFormat,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Output format for commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// JSON output
    Json,
}

fn parse_window_span(value: &str) -> Result<WindowSpan, String> {
    value
        .parse::<u32>()
        .ok()
        .and_then(WindowSpan::from_minutes)
        .ok_or_else(|| format!("'{value}' is not one of 10, 15, 30, 60, 120"))
}

/// A line typed into the live board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoardInput {
    /// `+`: shorter window.
    ZoomIn,
    /// `-`: longer window.
    ZoomOut,
    /// `t <id>`: toggle a runway.
    Toggle(RunwayId),
    /// `r`: refresh now.
    Refresh,
    /// `q`: quit.
    Quit,
    /// `?` or `h`: show help.
    Help,
}

impl BoardInput {
    /// Help text listing every command.
    pub const HELP: &'static str =
        "commands: + zoom in, - zoom out, t <id> toggle runway, r refresh, q quit";

    /// Parse one input line. Returns `None` for anything unrecognized.
    #[must_use]
    pub fn parse(line: &str) -> Option<Self> {
        let mut parts = line.split_whitespace();
        let input = match (parts.next()?, parts.next()) {
            ("+", None) => Self::ZoomIn,
            ("-", None) => Self::ZoomOut,
            ("r", None) => Self::Refresh,
            ("q", None) => Self::Quit,
            ("?" | "h", None) => Self::Help,
            ("t", Some(id)) => Self::Toggle(RunwayId(id.parse().ok()?)),
            _ => return None,
        };
        parts.next().is_none().then_some(input)
    }
}
