// src/config/model.rs

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

/// Placeholder substituted with the job id in process arguments and env.
pub const JOB_PLACEHOLDER: &str = "{job}";

/// Top-level configuration as read from a TOML file, before validation.
///
/// ```toml
/// [scheduler]
/// max_concurrent = 4
///
/// [logs]
/// enabled = true
/// dir = "logs"
///
/// [process]
/// program = "java"
/// args = ["-cp", "sim.jar", "RunSim", "{job}"]
///
/// [store]
/// path = "jobs.toml"
/// ```
///
/// Only `[process]` is required; every other section has defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub scheduler: SchedulerSection,

    #[serde(default)]
    pub logs: LogConfig,

    pub process: ProcessSection,

    #[serde(default)]
    pub store: StoreSection,
}

/// Validated configuration. Obtain one through `ConfigFile::try_from` or
/// [`crate::config::load_and_validate`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    pub scheduler: SchedulerSection,
    pub logs: LogConfig,
    pub process: ProcessSection,
    pub store: StoreSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(
        scheduler: SchedulerSection,
        logs: LogConfig,
        process: ProcessSection,
        store: StoreSection,
    ) -> Self {
        Self {
            scheduler,
            logs,
            process,
            store,
        }
    }
}

/// `[scheduler]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSection {
    /// Maximum number of simulation processes running at once.
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,

    /// Period of the reaper that polls running processes for exit.
    #[serde(default = "default_reap_interval_ms")]
    pub reap_interval_ms: u64,

    /// How long the dispatcher waits before re-offering a job that was
    /// rejected for lack of capacity.
    #[serde(default = "default_retry_interval_ms")]
    pub retry_interval_ms: u64,
}

fn default_max_concurrent() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
}

fn default_reap_interval_ms() -> u64 {
    1000
}

fn default_retry_interval_ms() -> u64 {
    250
}

impl SchedulerSection {
    pub fn reap_interval(&self) -> Duration {
        Duration::from_millis(self.reap_interval_ms)
    }

    pub fn retry_interval(&self) -> Duration {
        Duration::from_millis(self.retry_interval_ms)
    }
}

impl Default for SchedulerSection {
    fn default() -> Self {
        Self {
            max_concurrent: default_max_concurrent(),
            reap_interval_ms: default_reap_interval_ms(),
            retry_interval_ms: default_retry_interval_ms(),
        }
    }
}

/// `[logs]` section: per-job output capture.
///
/// When enabled, each job's combined stdout/stderr is appended to
/// `<dir>/<job>.log`.
#[derive(Debug, Clone, Deserialize)]
pub struct LogConfig {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_log_dir")]
    pub dir: PathBuf,
}

fn default_log_dir() -> PathBuf {
    PathBuf::from("logs")
}

impl LogConfig {
    /// Capture disabled; output is drained and discarded.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            dir: default_log_dir(),
        }
    }

    /// Capture enabled into `dir`.
    pub fn capture_to(dir: impl Into<PathBuf>) -> Self {
        Self {
            enabled: true,
            dir: dir.into(),
        }
    }
}

impl Default for LogConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

/// `[process]` section: template for the command run per job.
#[derive(Debug, Clone, Deserialize)]
pub struct ProcessSection {
    /// Executable path or bare name resolved against `PATH`.
    pub program: String,

    /// Program arguments. `{job}` is replaced by the job id.
    #[serde(default)]
    pub args: Vec<String>,

    /// Runtime flags (memory limits, GC tuning, ...) inserted before `args`.
    /// Forwarded as-is; the scheduler does not interpret them.
    #[serde(default)]
    pub runtime_args: Vec<String>,

    /// Working directory of the child. Inherited when unset.
    #[serde(default)]
    pub cwd: Option<PathBuf>,

    /// Extra environment variables for the child.
    #[serde(default)]
    pub env: BTreeMap<String, String>,
}

/// `[store]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StoreSection {
    /// TOML file holding the job records.
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("jobs.toml")
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}
