//! Command-line interface for airtrack.
//!
//! This module provides the CLI structure and command handlers for the
//! `airtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    parse_key_value, CheckCommand, ConfigCommand, OutputFormat, RunCommand, StatsCommand,
};

/// airtrack - Query engine for flight analytics
///
/// Loads a flight dataset into memory and answers a catalog of canned
/// analytical queries over flights, aircraft, airports, and airlines.
#[derive(Debug, Parser)]
#[command(name = "airtrack")]
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
    /// Run a catalog query against the dataset
    Run(RunCommand),

    /// List the available catalog queries and their parameters
    Queries,

    /// Show dataset statistics
    Stats(StatsCommand),

    /// Load the dataset and report integrity problems
    Check(CheckCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
