// src/store/file.rs

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::errors::{Result, SimrunError};
use crate::store::validate::validate_jobs;
use crate::store::{JobRecord, JobStore};
use crate::types::JobId;

/// Job file layout: one `[job.<id>]` table per simulation.
///
/// ```toml
/// [job.1]
/// name = "baseline"
/// class_name = "sims.Baseline"
/// state = "AUTO START"
/// finish_cycle = 100
/// parameters = { agents = 20, topology = "ring" }
/// ```
#[derive(Debug, Deserialize)]
struct RawJobFile {
    #[serde(default)]
    job: BTreeMap<String, JobRecord>,
}

/// In-memory job store loaded from a TOML file.
#[derive(Debug, Clone, Default)]
pub struct FileJobStore {
    jobs: BTreeMap<JobId, JobRecord>,
}

impl FileJobStore {
    /// Load and validate the job file at `path`.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)?;
        let store = Self::parse(&contents)?;
        debug!(path = %path.display(), jobs = store.jobs.len(), "loaded job store");
        Ok(store)
    }

    /// Parse and validate job file contents.
    pub fn parse(contents: &str) -> Result<Self> {
        let raw: RawJobFile = toml::from_str(contents)?;

        let mut jobs = BTreeMap::new();
        for (key, record) in raw.job {
            let id: JobId = key.trim().parse().map_err(|_| {
                SimrunError::ConfigError(format!(
                    "job id '{}' is not a non-negative integer",
                    key
                ))
            })?;
            jobs.insert(id, record);
        }

        Self::from_records(jobs)
    }

    /// Build a store from records already in memory.
    pub fn from_records(jobs: impl IntoIterator<Item = (JobId, JobRecord)>) -> Result<Self> {
        let jobs: BTreeMap<JobId, JobRecord> = jobs.into_iter().collect();
        validate_jobs(&jobs)?;
        Ok(Self { jobs })
    }

    pub fn len(&self) -> usize {
        self.jobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.jobs.is_empty()
    }
}

impl JobStore for FileJobStore {
    fn list_job_ids(&self) -> Vec<JobId> {
        self.jobs.keys().copied().collect()
    }

    fn get_job(&self, id: JobId) -> Option<JobRecord> {
        self.jobs.get(&id).cloned()
    }
}
