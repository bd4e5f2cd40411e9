// src/engine/mod.rs

//! Dispatch engine for simrun.
//!
//! This module ties together:
//! - the pending queue of job ids ([`queue`]), fed by callers at any time
//! - the single dispatch loop ([`dispatcher`]) that offers each id to the
//!   supervisor, retrying on backpressure, until the end-of-input marker

pub mod dispatcher;
pub mod queue;

pub use dispatcher::Dispatcher;
pub use queue::{PendingJobs, RunQueue, run_queue};
pub use crate::types::DispatcherState;
