//! CLI definitions for zerolock
//!
//! This module contains all CLI argument parsing structures using clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "zerolock",
    version,
    about = "Zero-downtime migration guard",
    long_about = "Replays recorded migration plans through the safety rules and refuses\noperations that would lock or break a live database."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Check migration plans for unsafe operations
    Check {
        /// Plan files (YAML) to replay, in order
        #[arg(required = true)]
        plans: Vec<PathBuf>,

        /// Gate configuration file (defaults to ./zerolock.yaml when present)
        #[arg(long)]
        config: Option<PathBuf>,

        /// Skip every check for this run (also enabled by SAFETY_ASSURED=1)
        #[arg(long)]
        safety_assured: bool,

        /// Treat the run as a full schema load
        #[arg(long)]
        schema_load: bool,

        /// Keep going after the first unsafe operation and report them all
        #[arg(long)]
        report_all: bool,

        /// Emit structured JSON events on stdout
        #[arg(long)]
        events: bool,
    },

    /// List the safety rules and the operations they inspect
    Rules,
}
