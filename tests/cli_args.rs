// tests/cli_args.rs

use std::path::PathBuf;

use clap::Parser;
use simrun::cli::{CliArgs, Command, LogLevel};

#[test]
fn test_run_all_defaults() {
    let args = CliArgs::try_parse_from(["simrun", "run-all"]).unwrap();

    assert_eq!(args.config, PathBuf::from("Simrun.toml"));
    assert!(args.log_level.is_none());
    assert!(matches!(
        args.command,
        Command::RunAll {
            all: false,
            dry_run: false
        }
    ));
}

#[test]
fn test_global_flags_after_subcommand() {
    let args = CliArgs::try_parse_from([
        "simrun",
        "run-all",
        "-a",
        "--config",
        "sims/Simrun.toml",
        "--log-level",
        "debug",
    ])
    .unwrap();

    assert_eq!(args.config, PathBuf::from("sims/Simrun.toml"));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(matches!(args.command, Command::RunAll { all: true, .. }));
}

#[test]
fn test_run_takes_a_job_id() {
    let args = CliArgs::try_parse_from(["simrun", "run", "42", "--dry-run"]).unwrap();

    assert!(matches!(
        args.command,
        Command::Run {
            id: 42,
            dry_run: true
        }
    ));
}

#[test]
fn test_run_rejects_reserved_and_invalid_ids() {
    assert!(CliArgs::try_parse_from(["simrun", "run", "0"]).is_err());
    assert!(CliArgs::try_parse_from(["simrun", "run", "-3"]).is_err());
    assert!(CliArgs::try_parse_from(["simrun", "run", "abc"]).is_err());
}

#[test]
fn test_subcommand_is_required() {
    assert!(CliArgs::try_parse_from(["simrun"]).is_err());
}
