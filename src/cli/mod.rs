//! CLI module - command-line interface definitions and handlers.
//!
//! Uses clap v4 with derive macros for argument parsing. The CLI is the
//! external collaborator of the engine: it owns the wall clock, renders
//! results, and never contains compliance rules itself.

use std::path::PathBuf;

use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};

use crate::error::{RecertError, Result};

pub mod commands;
pub mod seed;

/// Competency validity and continuous-training compliance engine
#[derive(Parser, Debug)]
#[command(name = "recert")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Enable machine-readable JSON output
    #[arg(long, global = true)]
    pub json: bool,

    /// Database path (overrides config)
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Config file path (default: ./recert.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Evaluate at this instant instead of now (RFC 3339 or YYYY-MM-DD)
    #[arg(long, global = true, value_name = "WHEN")]
    pub as_of: Option<String>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create the database and run migrations
    Init,

    /// Populate the database with demo data
    Seed,

    /// Continuous-training compliance snapshot for a user
    Snapshot {
        /// User id
        #[arg(long)]
        user: i64,
    },

    /// Recycling report: one user's competencies, or global counts by context
    Recycling {
        /// User id; omit for the global per-context counts
        #[arg(long)]
        user: Option<i64>,
    },

    /// Full training record of a user (competencies + compliance)
    Record {
        /// User id
        #[arg(long)]
        user: i64,
    },

    /// Counts of evidence awaiting validation
    Pending,

    /// Skills without any tutor
    Tutorless,

    /// Dashboard headline counts
    Summary,

    /// Generate shell completions
    Completions {
        /// Shell to generate for
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

impl Cli {
    /// Resolve the evaluation instant: `--as-of` when given, else now.
    pub fn resolve_as_of(&self) -> Result<DateTime<Utc>> {
        match &self.as_of {
            None => Ok(Utc::now()),
            Some(raw) => parse_as_of(raw),
        }
    }
}

fn parse_as_of(raw: &str) -> Result<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Ok(ts.with_timezone(&Utc));
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        let midnight = date.and_hms_opt(0, 0, 0).expect("midnight is valid");
        return Ok(DateTime::from_naive_utc_and_offset(midnight, Utc));
    }
    Err(RecertError::Config(format!(
        "cannot parse --as-of '{raw}': expected RFC 3339 or YYYY-MM-DD"
    )))
}
