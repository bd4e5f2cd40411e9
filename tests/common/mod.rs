#![allow(dead_code)]

use std::sync::Arc;

pub use simrun_test_utils::builders;
pub use simrun_test_utils::scripted_specs::ScriptedSpecs;
pub use simrun_test_utils::{init_tracing, wait_until, with_timeout};

use simrun::config::LogConfig;
use simrun::exec::{ProcessSpecBuilder, Supervisor, SupervisorOptions};

pub type TestResult = Result<(), Box<dyn std::error::Error>>;

/// Supervisor with a fast reaper and no log capture.
pub fn fast_supervisor(specs: Arc<dyn ProcessSpecBuilder>, capacity: usize) -> Arc<Supervisor> {
    fast_supervisor_with_logs(specs, capacity, LogConfig::disabled())
}

pub fn fast_supervisor_with_logs(
    specs: Arc<dyn ProcessSpecBuilder>,
    capacity: usize,
    logs: LogConfig,
) -> Arc<Supervisor> {
    Arc::new(Supervisor::new(
        specs,
        SupervisorOptions {
            max_concurrent: capacity,
            reap_interval: std::time::Duration::from_millis(20),
            logs,
        },
    ))
}
