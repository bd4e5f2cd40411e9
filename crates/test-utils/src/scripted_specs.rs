use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use simrun::errors::{Result, SimrunError};
use simrun::exec::{ProcessSpec, ProcessSpecBuilder};
use simrun::types::JobId;

/// A spec builder that runs a shell snippet per job:
/// - jobs without an explicit script run the default script
/// - jobs marked unavailable fail with `ResourceUnavailable`
/// - every job a command was built for is recorded, in order
#[derive(Clone)]
pub struct ScriptedSpecs {
    default_script: String,
    scripts: HashMap<JobId, String>,
    unavailable: Vec<JobId>,
    built: Arc<Mutex<Vec<JobId>>>,
}

impl ScriptedSpecs {
    pub fn new(default_script: &str) -> Self {
        Self {
            default_script: default_script.to_string(),
            scripts: HashMap::new(),
            unavailable: Vec::new(),
            built: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn script(mut self, job: JobId, script: &str) -> Self {
        self.scripts.insert(job, script.to_string());
        self
    }

    pub fn unavailable(mut self, job: JobId) -> Self {
        self.unavailable.push(job);
        self
    }

    /// Shared handle to the list of jobs a command was built for.
    pub fn built(&self) -> Arc<Mutex<Vec<JobId>>> {
        Arc::clone(&self.built)
    }

    pub fn into_arc(self) -> Arc<dyn ProcessSpecBuilder> {
        Arc::new(self)
    }
}

impl ProcessSpecBuilder for ScriptedSpecs {
    fn build_command(&self, job: JobId) -> Result<ProcessSpec> {
        self.built.lock().unwrap().push(job);

        if self.unavailable.contains(&job) {
            return Err(SimrunError::ResourceUnavailable(format!(
                "no runtime for job {job}"
            )));
        }

        let script = self.scripts.get(&job).unwrap_or(&self.default_script);
        Ok(ProcessSpec::new("sh").arg("-c").arg(script.clone()))
    }
}
