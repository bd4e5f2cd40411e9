// src/engine/dispatcher.rs

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, error, info, trace, warn};

use crate::engine::queue::{PendingJobs, RunQueue, run_queue};
use crate::exec::Supervisor;
use crate::types::{Admission, DispatcherState, JobId, SENTINEL};

/// Feeds queued job ids to a [`Supervisor`], one at a time, in order.
///
/// A job rejected for lack of capacity is retried after `retry_interval`
/// before anything behind it is attempted, so launches keep submission
/// order. The loop ends when it dequeues [`SENTINEL`]; jobs it already
/// launched keep running (see [`Supervisor::wait_idle`]).
pub struct Dispatcher {
    queue: RunQueue,
    pending: Mutex<Option<PendingJobs>>,
    state: Arc<watch::Sender<DispatcherState>>,
    abandoned: Arc<Mutex<Vec<JobId>>>,
    supervisor: Arc<Supervisor>,
    retry_interval: Duration,
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dispatcher")
            .field("state", &*self.state.borrow())
            .field("retry_interval", &self.retry_interval)
            .finish_non_exhaustive()
    }
}

impl Dispatcher {
    pub fn new(supervisor: Arc<Supervisor>, retry_interval: Duration) -> Self {
        let (queue, pending) = run_queue();
        let (state, _) = watch::channel(DispatcherState::Idle);

        Self {
            queue,
            pending: Mutex::new(Some(pending)),
            state: Arc::new(state),
            abandoned: Arc::new(Mutex::new(Vec::new())),
            supervisor,
            retry_interval,
        }
    }

    /// Queue a job id; [`SENTINEL`] ends the input.
    ///
    /// Returns `false` if the dispatch loop has already stopped and the id
    /// was dropped.
    pub fn submit(&self, job: JobId) -> bool {
        self.queue.submit(job)
    }

    /// A cloneable submission handle for concurrent producers.
    pub fn submitter(&self) -> RunQueue {
        self.queue.clone()
    }

    pub fn state(&self) -> DispatcherState {
        *self.state.borrow()
    }

    /// Jobs that were dequeued but never launched: the supervisor was halted
    /// by fast-fail, or the launch itself failed.
    pub fn abandoned(&self) -> Vec<JobId> {
        lock(&self.abandoned).clone()
    }

    /// Spawn the dispatch loop. Returns `false` (and does nothing) if it was
    /// already started.
    pub fn start(&self) -> bool {
        let Some(pending) = lock(&self.pending).take() else {
            debug!("dispatch loop already started; ignoring start");
            return false;
        };

        self.state.send_replace(DispatcherState::Running);

        let dispatch = DispatchLoop {
            supervisor: Arc::clone(&self.supervisor),
            retry_interval: self.retry_interval,
            abandoned: Arc::clone(&self.abandoned),
            _stopped: StopOnExit(Arc::clone(&self.state)),
        };
        tokio::spawn(dispatch.run(pending));

        true
    }

    /// Wait until the dispatch loop has exited.
    ///
    /// Returns immediately if the loop was never started.
    pub async fn join(&self) {
        let mut rx = self.state.subscribe();
        if *rx.borrow_and_update() == DispatcherState::Idle {
            debug!("join called before start; nothing to wait for");
            return;
        }
        // The sender lives in `self`, so this only ends by reaching Stopped.
        let _ = rx.wait_for(|s| *s == DispatcherState::Stopped).await;
    }
}

/// Marks the dispatcher stopped when the loop ends, however it ends.
struct StopOnExit(Arc<watch::Sender<DispatcherState>>);

impl Drop for StopOnExit {
    fn drop(&mut self) {
        self.0.send_replace(DispatcherState::Stopped);
    }
}

struct DispatchLoop {
    supervisor: Arc<Supervisor>,
    retry_interval: Duration,
    abandoned: Arc<Mutex<Vec<JobId>>>,
    _stopped: StopOnExit,
}

impl DispatchLoop {
    async fn run(self, mut pending: PendingJobs) {
        info!("dispatch loop started");

        loop {
            match pending.next().await {
                Some(SENTINEL) => {
                    info!("end of input reached; dispatch loop stopping");
                    break;
                }
                Some(job) => self.dispatch(job).await,
                None => {
                    warn!("job queue closed without end-of-input marker; dispatch loop stopping");
                    break;
                }
            }
        }

        // Refuse late submissions before `Stopped` becomes visible.
        drop(pending);
    }

    /// Offer `job` until it is launched or can never be.
    async fn dispatch(&self, job: JobId) {
        loop {
            match self.supervisor.start(job) {
                Ok(Admission::Launched) => return,
                Ok(Admission::AtCapacity) => {
                    trace!(job, "at capacity; retrying");
                    tokio::time::sleep(self.retry_interval).await;
                }
                Ok(Admission::Halted) => {
                    warn!(job, "supervisor halted after a failed simulation; job not started");
                    lock(&self.abandoned).push(job);
                    return;
                }
                Err(e) => {
                    error!(job, error = %e, "simulation could not be launched; it will not be retried");
                    lock(&self.abandoned).push(job);
                    return;
                }
            }
        }
    }
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}
