// src/cli.rs

//! CLI argument parsing using `clap`.
//!
//! Each subcommand maps to one handler in `lib.rs`; the mapping is the
//! `Command` enum itself.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::config::default_config_path;
use crate::types::JobId;

/// Command-line arguments for `simrun`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "simrun",
    version,
    about = "Run batches of simulations as supervised subprocesses.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Relative paths inside it are resolved against its directory.
    #[arg(long, global = true, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SIMRUN_LOG` or a default level will be used.
    #[arg(long, global = true, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// List all simulations in the job store.
    List,

    /// Run every simulation waiting to start.
    #[command(name = "run-all")]
    RunAll {
        /// Also run NOT STARTED simulations. By default only AUTO START ones run.
        #[arg(short, long)]
        all: bool,

        /// Print the command each selected simulation would run, then exit.
        #[arg(long)]
        dry_run: bool,
    },

    /// Run a single simulation.
    Run {
        /// Id of the simulation to run.
        #[arg(value_name = "ID", value_parser = clap::value_parser!(u64).range(1..))]
        id: JobId,

        /// Print the command the simulation would run, then exit.
        #[arg(long)]
        dry_run: bool,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
