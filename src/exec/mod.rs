// src/exec/mod.rs

//! Process execution layer.
//!
//! This module is responsible for actually running simulation processes
//! using `tokio::process::Command` and watching them until they exit.
//!
//! - [`spec`] turns a job id into a command (`ProcessSpecBuilder`).
//! - [`drain`] keeps each child's merged output pipe empty, optionally
//!   appending it to a per-job log file.
//! - [`slots`] is the IO-free bookkeeping: running slots, ceiling,
//!   fast-fail.
//! - [`supervisor`] ties them together behind one lock and runs the reaper.

pub mod drain;
pub mod slots;
pub mod spec;
pub mod supervisor;

pub use slots::{ExitProbe, SlotTable};
pub use spec::{ProcessSpec, ProcessSpecBuilder, TemplateSpecBuilder};
pub use supervisor::{Supervisor, SupervisorOptions};
