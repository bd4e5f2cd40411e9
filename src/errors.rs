// src/errors.rs

//! Crate-wide error aliases and helpers.

use thiserror::Error;

use crate::types::JobId;

#[derive(Error, Debug)]
pub enum SimrunError {
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Job not found: {0}")]
    JobNotFound(JobId),

    #[error("Cycle detected in job parents: {0}")]
    ParentCycle(String),

    /// The process-spec collaborator could not produce a command for a job
    /// (e.g. the executable cannot be resolved).
    #[error("Resource unavailable: {0}")]
    ResourceUnavailable(String),

    /// The OS refused to create the child process.
    #[error("failed to spawn process for job {job}: {source}")]
    Spawn {
        job: JobId,
        #[source]
        source: std::io::Error,
    },

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

pub use anyhow::Error;
pub type Result<T> = std::result::Result<T, SimrunError>;
