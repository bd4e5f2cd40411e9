// src/exec/slots.rs

//! Bookkeeping for running simulation processes.
//!
//! [`SlotTable`] holds the running slots, the concurrency ceiling and the
//! recorded outcomes together, so a single lock around it makes admission,
//! reaping and the fast-fail write mutually exclusive. It performs no IO of
//! its own: processes are anything implementing [`ExitProbe`], which keeps
//! the ceiling invariant testable without spawning children.

use std::io;

use tracing::{info, warn};

use crate::types::{Admission, JobId, JobOutcome};

/// Non-blocking termination check for a running process.
pub trait ExitProbe {
    /// `Ok(None)` while running, `Ok(Some(code))` once terminated.
    ///
    /// Must never block waiting for the process.
    fn try_exit(&mut self) -> io::Result<Option<i32>>;
}

#[derive(Debug)]
struct Slot<P> {
    job: JobId,
    process: P,
}

/// Running slots plus the ceiling that bounds them.
#[derive(Debug)]
pub struct SlotTable<P> {
    ceiling: usize,
    slots: Vec<Slot<P>>,
    outcomes: Vec<JobOutcome>,
}

impl<P> SlotTable<P> {
    pub fn new(ceiling: usize) -> Self {
        Self {
            ceiling,
            slots: Vec::with_capacity(ceiling),
            outcomes: Vec::new(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.ceiling
    }

    pub fn running_count(&self) -> usize {
        self.slots.len()
    }

    pub fn is_idle(&self) -> bool {
        self.slots.is_empty()
    }

    /// Ids of the running jobs, in launch order.
    pub fn running_jobs(&self) -> Vec<JobId> {
        self.slots.iter().map(|s| s.job).collect()
    }

    /// Outcomes of every reaped job, in reap order.
    pub fn outcomes(&self) -> &[JobOutcome] {
        &self.outcomes
    }

    /// Why a launch cannot happen right now, or `None` if a slot is free.
    pub fn rejection(&self) -> Option<Admission> {
        if self.ceiling == 0 {
            Some(Admission::Halted)
        } else if self.slots.len() >= self.ceiling {
            Some(Admission::AtCapacity)
        } else {
            None
        }
    }

    /// Record a freshly launched process. Callers check [`Self::rejection`]
    /// under the same lock first.
    pub fn occupy(&mut self, job: JobId, process: P) {
        debug_assert!(self.rejection().is_none(), "occupy called without a free slot");
        self.slots.push(Slot { job, process });
    }

    /// Replace the ceiling, returning the previous value. Running slots are
    /// never touched, so the count may exceed a lowered ceiling for a while.
    pub fn set_capacity(&mut self, ceiling: usize) -> usize {
        std::mem::replace(&mut self.ceiling, ceiling)
    }
}

impl<P: ExitProbe> SlotTable<P> {
    /// Probe every slot once, drop the terminated ones and apply fast-fail.
    ///
    /// Any non-zero exit forces the ceiling to zero. A probe error counts as
    /// a failed exit with code `-1`, otherwise the slot could never be freed.
    pub fn reap(&mut self) -> Vec<JobOutcome> {
        let mut finished = Vec::new();

        self.slots.retain_mut(|slot| match slot.process.try_exit() {
            Ok(None) => true,
            Ok(Some(exit_code)) => {
                finished.push(JobOutcome {
                    job: slot.job,
                    exit_code,
                });
                false
            }
            Err(e) => {
                warn!(job = slot.job, error = %e, "could not read process status; treating as failed");
                finished.push(JobOutcome {
                    job: slot.job,
                    exit_code: -1,
                });
                false
            }
        });

        for outcome in &finished {
            info!(
                job = outcome.job,
                exit_code = outcome.exit_code,
                "simulation completed"
            );

            if !outcome.success() && self.ceiling != 0 {
                warn!(
                    job = outcome.job,
                    exit_code = outcome.exit_code,
                    running = self.slots.len(),
                    "non-zero exit code; no further simulations will be started"
                );
                self.ceiling = 0;
            }
        }

        self.outcomes.extend_from_slice(&finished);
        finished
    }
}
