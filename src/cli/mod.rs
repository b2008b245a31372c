//! CLI command definitions for taskdeck.
//!
//! This module defines the CLI structure using clap's derive macros.
//! The main entry point is the `Cli` struct which contains subcommands.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Personal task manager with a web UI
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the SQLite database (overrides DATABASE_URL)
    #[arg(short, long, global = true)]
    pub database: Option<PathBuf>,

    /// Port for the web UI (overrides PORT)
    #[arg(short, long, global = true)]
    pub port: Option<u16>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Start the web UI server (default if no subcommand given)
    Serve,

    /// Apply pending schema migrations and exit
    Migrate,
}
