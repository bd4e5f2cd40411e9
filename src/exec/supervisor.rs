// src/exec/supervisor.rs

//! Bounded set of running simulation processes.
//!
//! The [`Supervisor`] launches one process per accepted job, never more than
//! the concurrency ceiling at launch time, and runs a periodic reaper that
//! frees slots as processes exit. A job exiting non-zero trips fast-fail:
//! the ceiling drops to zero and stays there, while jobs already running are
//! left to finish.

use std::io;
use std::process::Stdio;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};
use std::thread::JoinHandle as ThreadHandle;
use std::time::Duration;

use tokio::process::Child;
use tokio::sync::Notify;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, trace, warn};

use crate::config::{ConfigFile, LogConfig};
use crate::errors::{Result, SimrunError};
use crate::exec::drain::{open_log_sink, spawn_drain};
use crate::exec::slots::{ExitProbe, SlotTable};
use crate::exec::spec::ProcessSpecBuilder;
use crate::types::{Admission, JobId, JobOutcome};

/// Construction parameters of a [`Supervisor`].
#[derive(Debug, Clone)]
pub struct SupervisorOptions {
    pub max_concurrent: usize,
    pub reap_interval: Duration,
    pub logs: LogConfig,
}

impl SupervisorOptions {
    pub fn from_config(cfg: &ConfigFile) -> Self {
        Self {
            max_concurrent: cfg.scheduler.max_concurrent,
            reap_interval: cfg.scheduler.reap_interval(),
            logs: cfg.logs.clone(),
        }
    }
}

/// A launched child occupying a running slot.
#[derive(Debug)]
pub struct RunningProcess {
    child: Child,
}

impl ExitProbe for RunningProcess {
    fn try_exit(&mut self) -> io::Result<Option<i32>> {
        Ok(self
            .child
            .try_wait()?
            .map(|status| status.code().unwrap_or(-1)))
    }
}

struct Shared {
    table: Mutex<SlotTable<RunningProcess>>,
    // Outlive their slots: a reaped child may still have output in the pipe,
    // and background processes it left behind keep the pipe open.
    drains: Mutex<Vec<(JobId, ThreadHandle<u64>)>>,
    specs: Arc<dyn ProcessSpecBuilder>,
    logs: LogConfig,
    idle: Notify,
}

impl Shared {
    fn table(&self) -> MutexGuard<'_, SlotTable<RunningProcess>> {
        self.table.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn drains(&self) -> MutexGuard<'_, Vec<(JobId, ThreadHandle<u64>)>> {
        self.drains.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn reap(&self) -> Vec<JobOutcome> {
        let (finished, idle) = {
            let mut table = self.table();
            let finished = table.reap();
            (finished, table.is_idle())
        };

        if !finished.is_empty() && idle {
            self.idle.notify_waiters();
        }
        finished
    }

    /// Build, spawn and attach a drain. Called with the table lock held.
    fn launch(&self, job: JobId) -> Result<RunningProcess> {
        let spec = self.specs.build_command(job)?;

        info!(job, "starting simulation");
        debug!(job, command = %spec, "process command");

        // One pipe for both streams keeps stdout and stderr in write order.
        let (reader, writer) = io::pipe()?;

        let mut cmd = spec.to_command();
        cmd.stdin(Stdio::null())
            .stdout(writer.try_clone()?)
            .stderr(writer);

        let child = cmd
            .spawn()
            .map_err(|source| SimrunError::Spawn { job, source })?;

        // The command still owns our copies of the write end; the drain only
        // sees EOF once they are closed.
        drop(cmd);

        let sink = open_log_sink(&self.logs, job);
        match spawn_drain(job, reader, sink) {
            Ok(handle) => {
                let mut drains = self.drains();
                drains.retain(|(_, drain)| !drain.is_finished());
                drains.push((job, handle));
            }
            Err(e) => warn!(job, error = %e, "failed to start output drain"),
        }

        Ok(RunningProcess { child })
    }
}

/// Owns the running slots and the reaper task.
///
/// Must be created inside a Tokio runtime. Share it with `Arc`; the reaper
/// stops when the supervisor is dropped. Dropping it does not kill children.
pub struct Supervisor {
    shared: Arc<Shared>,
    reaper: JoinHandle<()>,
}

impl std::fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let table = self.shared.table();
        f.debug_struct("Supervisor")
            .field("capacity", &table.capacity())
            .field("running", &table.running_jobs())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    pub fn new(specs: Arc<dyn ProcessSpecBuilder>, options: SupervisorOptions) -> Self {
        let shared = Arc::new(Shared {
            table: Mutex::new(SlotTable::new(options.max_concurrent)),
            drains: Mutex::new(Vec::new()),
            specs,
            logs: options.logs,
            idle: Notify::new(),
        });

        let reaper = tokio::spawn(reaper_loop(Arc::downgrade(&shared), options.reap_interval));

        info!(
            capacity = options.max_concurrent,
            reap_interval_ms = options.reap_interval.as_millis() as u64,
            "supervisor started"
        );

        Self { shared, reaper }
    }

    /// Try to launch one process for `job`.
    ///
    /// Returns `AtCapacity` or `Halted` without side effects when no slot is
    /// free. Errors mean the launch itself failed (spec builder or spawn);
    /// no slot is consumed in that case.
    pub fn start(&self, job: JobId) -> Result<Admission> {
        let mut table = self.shared.table();

        if let Some(rejection) = table.rejection() {
            trace!(
                job,
                ?rejection,
                running = table.running_count(),
                capacity = table.capacity(),
                "launch rejected"
            );
            return Ok(rejection);
        }

        let process = self.shared.launch(job)?;
        table.occupy(job, process);

        debug!(
            job,
            running = table.running_count(),
            capacity = table.capacity(),
            "running slot occupied"
        );
        Ok(Admission::Launched)
    }

    pub fn running_count(&self) -> usize {
        self.shared.table().running_count()
    }

    pub fn capacity(&self) -> usize {
        self.shared.table().capacity()
    }

    /// Ids of the jobs currently running, in launch order.
    pub fn running_jobs(&self) -> Vec<JobId> {
        self.shared.table().running_jobs()
    }

    /// Operator override of the ceiling; the only way to undo fast-fail.
    pub fn set_capacity(&self, capacity: usize) {
        let previous = self.shared.table().set_capacity(capacity);
        if previous == 0 && capacity > 0 {
            warn!(capacity, "re-opening supervisor after fast-fail");
        } else {
            info!(previous, capacity, "supervisor capacity changed");
        }
    }

    /// Stop accepting launches, as fast-fail would. Running jobs are left alone.
    pub fn halt(&self) {
        let previous = self.shared.table().set_capacity(0);
        if previous != 0 {
            warn!(previous, "supervisor halted; no further simulations will be started");
        }
    }

    /// Outcomes of every reaped job so far, in reap order.
    pub fn outcomes(&self) -> Vec<JobOutcome> {
        self.shared.table().outcomes().to_vec()
    }

    /// Run one reaper pass now, in addition to the periodic ones.
    pub fn reap(&self) -> Vec<JobOutcome> {
        self.shared.reap()
    }

    /// Wait until no process is running.
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.shared.idle.notified();
            tokio::pin!(notified);
            // Register before checking so a reap in between is not missed.
            notified.as_mut().enable();

            if self.shared.table().is_idle() {
                return;
            }
            notified.await;
        }
    }

    /// Wait until every output drain started so far has reached end of stream.
    ///
    /// A drain ends once no process holds the write end of its pipe any more,
    /// which includes background processes a job left behind. After this
    /// returns, captured log files are complete.
    pub async fn wait_drained(&self) {
        let drains = std::mem::take(&mut *self.shared.drains());
        if drains.is_empty() {
            return;
        }
        debug!(count = drains.len(), "waiting for output drains");

        let joined = tokio::task::spawn_blocking(move || {
            for (job, drain) in drains {
                if drain.join().is_err() {
                    warn!(job, "output drain thread panicked");
                }
            }
        })
        .await;

        if let Err(e) = joined {
            warn!(error = %e, "failed to wait for output drains");
        }
    }
}

impl Drop for Supervisor {
    fn drop(&mut self) {
        self.reaper.abort();
    }
}

async fn reaper_loop(shared: Weak<Shared>, period: Duration) {
    let mut ticker = tokio::time::interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        ticker.tick().await;

        let Some(strong) = shared.upgrade() else {
            debug!("supervisor dropped; reaper exiting");
            return;
        };
        strong.reap();
    }
}
