#![allow(dead_code)]

use std::collections::BTreeMap;
use std::path::Path;

use simrun::config::{
    ConfigFile, LogConfig, ProcessSection, RawConfigFile, SchedulerSection, StoreSection,
};
use simrun::store::JobRecord;
use simrun::types::JobId;

/// Builder for `ConfigFile` to simplify test setup.
///
/// Defaults to `sh` as the program, two slots, and short reaper/retry
/// periods so tests do not wait on production timings.
pub struct ConfigFileBuilder {
    config: RawConfigFile,
}

impl ConfigFileBuilder {
    pub fn new() -> Self {
        Self {
            config: RawConfigFile {
                scheduler: SchedulerSection {
                    max_concurrent: 2,
                    reap_interval_ms: 20,
                    retry_interval_ms: 10,
                },
                logs: LogConfig::disabled(),
                process: ProcessSection {
                    program: "sh".to_string(),
                    args: vec![],
                    runtime_args: vec![],
                    cwd: None,
                    env: BTreeMap::new(),
                },
                store: StoreSection::default(),
            },
        }
    }

    pub fn max_concurrent(mut self, n: usize) -> Self {
        self.config.scheduler.max_concurrent = n;
        self
    }

    pub fn reap_interval_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.reap_interval_ms = ms;
        self
    }

    pub fn retry_interval_ms(mut self, ms: u64) -> Self {
        self.config.scheduler.retry_interval_ms = ms;
        self
    }

    pub fn capture_logs(mut self, dir: &Path) -> Self {
        self.config.logs = LogConfig::capture_to(dir);
        self
    }

    pub fn program(mut self, program: &str) -> Self {
        self.config.process.program = program.to_string();
        self
    }

    pub fn arg(mut self, arg: &str) -> Self {
        self.config.process.args.push(arg.to_string());
        self
    }

    pub fn runtime_arg(mut self, arg: &str) -> Self {
        self.config.process.runtime_args.push(arg.to_string());
        self
    }

    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.config.process.env.insert(key.to_string(), value.to_string());
        self
    }

    pub fn cwd(mut self, dir: &Path) -> Self {
        self.config.process.cwd = Some(dir.to_path_buf());
        self
    }

    pub fn raw(self) -> RawConfigFile {
        self.config
    }

    pub fn build(self) -> ConfigFile {
        ConfigFile::try_from(self.config).expect("Failed to build valid config from builder")
    }
}

impl Default for ConfigFileBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for `JobRecord`.
pub struct JobRecordBuilder {
    job: JobRecord,
}

impl JobRecordBuilder {
    pub fn new(name: &str) -> Self {
        Self {
            job: JobRecord {
                name: name.to_string(),
                class_name: "sims.Test".to_string(),
                state: "NOT STARTED".to_string(),
                finish_cycle: 10,
                parameters: BTreeMap::new(),
                parent: None,
            },
        }
    }

    pub fn state(mut self, state: &str) -> Self {
        self.job.state = state.to_string();
        self
    }

    pub fn parent(mut self, parent: JobId) -> Self {
        self.job.parent = Some(parent);
        self
    }

    pub fn param(mut self, key: &str, value: &str) -> Self {
        self.job.parameters.insert(key.to_string(), value.to_string());
        self
    }

    pub fn build(self) -> JobRecord {
        self.job
    }
}
