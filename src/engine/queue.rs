// src/engine/queue.rs

use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::types::{JobId, SENTINEL};

/// Producer side of the pending queue.
///
/// Unbounded and order-preserving. Clone it to feed the queue from several
/// places; submissions never block.
#[derive(Debug, Clone)]
pub struct RunQueue {
    tx: mpsc::UnboundedSender<JobId>,
}

/// Consumer side of the pending queue, owned by the dispatch loop.
#[derive(Debug)]
pub struct PendingJobs {
    rx: mpsc::UnboundedReceiver<JobId>,
}

/// Create a connected queue pair.
pub fn run_queue() -> (RunQueue, PendingJobs) {
    let (tx, rx) = mpsc::unbounded_channel();
    (RunQueue { tx }, PendingJobs { rx })
}

impl RunQueue {
    /// Append `job` to the queue. [`SENTINEL`] marks the end of input.
    ///
    /// Returns `false` if the dispatch loop is gone and the id was dropped.
    pub fn submit(&self, job: JobId) -> bool {
        if job == SENTINEL {
            debug!("end of input submitted");
        } else {
            debug!(job, "job submitted");
        }

        match self.tx.send(job) {
            Ok(()) => true,
            Err(_) => {
                warn!(job, "dispatch loop has exited; submission dropped");
                false
            }
        }
    }
}

impl PendingJobs {
    /// Next id in submission order, waiting while the queue is empty.
    ///
    /// `None` once every producer is gone and the queue is drained.
    pub async fn next(&mut self) -> Option<JobId> {
        self.rx.recv().await
    }
}
