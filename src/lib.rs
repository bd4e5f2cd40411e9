// src/lib.rs

pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod store;
pub mod types;

use std::future::{Future, pending};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Result, bail};
use tracing::{info, warn};

use crate::cli::{CliArgs, Command};
use crate::config::{ConfigFile, load_and_validate, resolve_relative_to};
use crate::engine::Dispatcher;
use crate::errors::SimrunError;
use crate::exec::{ProcessSpecBuilder, Supervisor, SupervisorOptions, TemplateSpecBuilder};
use crate::store::{FileJobStore, JobStore, format_job_table, select_runnable};
use crate::types::{JobId, JobOutcome, SENTINEL};

/// High-level entry point used by `main.rs`.
///
/// Loads the config and job store, then runs the selected subcommand.
pub async fn run(args: CliArgs) -> Result<()> {
    let cfg = load_and_validate(&args.config)?;
    let cfg = resolve_relative_to(cfg, &config_root_dir(&args.config));

    let store = FileJobStore::load(&cfg.store.path)?;

    match args.command {
        Command::List => {
            print!("{}", format_job_table(&store));
            Ok(())
        }
        Command::RunAll { all, dry_run } => {
            let jobs = select_runnable(&store, all);
            info!(count = jobs.len(), include_not_started = all, "selected simulations");
            execute(&cfg, jobs, dry_run).await
        }
        Command::Run { id, dry_run } => {
            if store.get_job(id).is_none() {
                return Err(SimrunError::JobNotFound(id).into());
            }
            execute(&cfg, vec![id], dry_run).await
        }
    }
}

/// Result of one batch: what was submitted and what became of it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub submitted: Vec<JobId>,
    /// Reaped jobs, in reap order.
    pub outcomes: Vec<JobOutcome>,
    /// Jobs that were never launched (fast-fail, launch error or interrupt).
    pub abandoned: Vec<JobId>,
    /// The batch was halted from outside before every job was offered.
    pub interrupted: bool,
}

impl BatchReport {
    pub fn failed(&self) -> impl Iterator<Item = &JobOutcome> {
        self.outcomes.iter().filter(|o| !o.success())
    }

    pub fn is_success(&self) -> bool {
        !self.interrupted && self.abandoned.is_empty() && self.failed().next().is_none()
    }
}

/// Run `jobs` to completion under the scheduler settings of `cfg`.
///
/// Submits every id followed by the end-of-input marker, waits for the
/// dispatch loop to finish, then for every launched process to exit and for
/// its captured output to be fully written.
pub async fn run_batch(
    cfg: &ConfigFile,
    specs: Arc<dyn ProcessSpecBuilder>,
    jobs: &[JobId],
) -> BatchReport {
    run_batch_until(cfg, specs, jobs, pending()).await
}

/// Like [`run_batch`], but stops launching once `interrupt` resolves.
///
/// Jobs not yet launched are abandoned. Jobs already running are never
/// killed: the batch still waits for them and for their output.
pub async fn run_batch_until(
    cfg: &ConfigFile,
    specs: Arc<dyn ProcessSpecBuilder>,
    jobs: &[JobId],
    interrupt: impl Future<Output = ()>,
) -> BatchReport {
    let supervisor = Arc::new(Supervisor::new(specs, SupervisorOptions::from_config(cfg)));
    let dispatcher = Dispatcher::new(Arc::clone(&supervisor), cfg.scheduler.retry_interval());

    for &job in jobs {
        dispatcher.submit(job);
    }
    dispatcher.submit(SENTINEL);
    dispatcher.start();

    let finished = async {
        dispatcher.join().await;
        supervisor.wait_idle().await;
        supervisor.wait_drained().await;
    };
    tokio::pin!(finished);

    let interrupted = tokio::select! {
        () = &mut finished => false,
        () = interrupt => true,
    };
    if interrupted {
        warn!(
            running = supervisor.running_count(),
            "interrupted; waiting for running simulations to finish"
        );
        supervisor.halt();
        finished.await;
    }

    BatchReport {
        submitted: jobs.to_vec(),
        outcomes: supervisor.outcomes(),
        abandoned: dispatcher.abandoned(),
        interrupted,
    }
}

async fn execute(cfg: &ConfigFile, jobs: Vec<JobId>, dry_run: bool) -> Result<()> {
    let specs = TemplateSpecBuilder::from_config(&cfg.process);

    if dry_run {
        print_dry_run(&specs, &jobs);
        return Ok(());
    }

    if jobs.is_empty() {
        info!("no simulations to run");
        return Ok(());
    }

    // First Ctrl-C: stop launching and wait for running jobs. Second: leave.
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for Ctrl+C");
            pending::<()>().await;
        }
    };
    let force_quit = async {
        let first = tokio::signal::ctrl_c().await;
        let second = tokio::signal::ctrl_c().await;
        first.and(second)
    };

    let report = tokio::select! {
        report = run_batch_until(cfg, Arc::new(specs), &jobs, interrupt) => report,
        Ok(()) = force_quit => {
            bail!("interrupted twice; exiting without waiting for running simulations");
        }
    };

    print_summary(&report);

    if report.interrupted {
        bail!("interrupted; {} simulation(s) not started", report.abandoned.len());
    }
    if !report.is_success() {
        let failed = report.failed().count();
        bail!(
            "{} simulation(s) failed, {} not started",
            failed,
            report.abandoned.len()
        );
    }
    Ok(())
}

/// Figure out the directory relative config paths are resolved against.
///
/// - If the config path has a non-empty parent (e.g. "configs/Simrun.toml"),
///   we use that directory.
/// - If it's just a bare filename like "Simrun.toml" (parent = ""),
///   we fall back to the current working directory "."
fn config_root_dir(config_path: &Path) -> PathBuf {
    match config_path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
    }
}

fn print_dry_run(specs: &TemplateSpecBuilder, jobs: &[JobId]) {
    println!("simrun dry-run ({} simulation(s))", jobs.len());
    for &job in jobs {
        match specs.build_command(job) {
            Ok(spec) => {
                println!("  - {job}: {spec}");
                if let Some(cwd) = &spec.cwd {
                    println!("      cwd: {}", cwd.display());
                }
                for (k, v) in &spec.env {
                    println!("      env: {k}={v}");
                }
            }
            Err(e) => println!("  - {job}: <unavailable: {e}>"),
        }
    }
}

fn print_summary(report: &BatchReport) {
    println!(
        "{} submitted, {} completed, {} failed, {} not started",
        report.submitted.len(),
        report.outcomes.len(),
        report.failed().count(),
        report.abandoned.len()
    );
    for outcome in report.failed() {
        println!("  failed: {outcome}");
    }
    for job in &report.abandoned {
        println!("  not started: job {job}");
    }
}
