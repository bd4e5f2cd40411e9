// src/config/validate.rs

use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::{Result, SimrunError};

impl TryFrom<RawConfigFile> for ConfigFile {
    type Error = crate::errors::SimrunError;

    fn try_from(raw: RawConfigFile) -> std::result::Result<Self, Self::Error> {
        validate_raw_config(&raw)?;
        Ok(ConfigFile::new_unchecked(
            raw.scheduler,
            raw.logs,
            raw.process,
            raw.store,
        ))
    }
}

fn validate_raw_config(cfg: &RawConfigFile) -> Result<()> {
    validate_scheduler(cfg)?;
    validate_process(cfg)?;
    validate_logs(cfg)?;
    Ok(())
}

fn validate_scheduler(cfg: &RawConfigFile) -> Result<()> {
    let sched = &cfg.scheduler;

    if sched.max_concurrent == 0 {
        return Err(SimrunError::ConfigError(
            "[scheduler].max_concurrent must be >= 1 (got 0)".to_string(),
        ));
    }
    if sched.reap_interval_ms == 0 {
        return Err(SimrunError::ConfigError(
            "[scheduler].reap_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }
    if sched.retry_interval_ms == 0 {
        return Err(SimrunError::ConfigError(
            "[scheduler].retry_interval_ms must be >= 1 (got 0)".to_string(),
        ));
    }

    Ok(())
}

fn validate_process(cfg: &RawConfigFile) -> Result<()> {
    if cfg.process.program.trim().is_empty() {
        return Err(SimrunError::ConfigError(
            "[process].program must not be empty".to_string(),
        ));
    }

    for key in cfg.process.env.keys() {
        if key.is_empty() || key.contains('=') {
            return Err(SimrunError::ConfigError(format!(
                "[process].env has invalid variable name '{}'",
                key
            )));
        }
    }

    Ok(())
}

fn validate_logs(cfg: &RawConfigFile) -> Result<()> {
    if cfg.logs.enabled && cfg.logs.dir.as_os_str().is_empty() {
        return Err(SimrunError::ConfigError(
            "[logs].dir must be set when [logs].enabled = true".to_string(),
        ));
    }
    Ok(())
}
