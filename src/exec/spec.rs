// src/exec/spec.rs

//! Turning a job id into a concrete child-process command.
//!
//! The supervisor never decides *what* a simulation process looks like; it
//! asks a [`ProcessSpecBuilder`] for every launch. Production uses
//! [`TemplateSpecBuilder`], driven by the `[process]` config section. Tests
//! can pass any closure `Fn(JobId) -> Result<ProcessSpec>`.

use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

use tokio::process::Command;
use tracing::trace;

use crate::config::{JOB_PLACEHOLDER, ProcessSection};
use crate::errors::{Result, SimrunError};
use crate::types::JobId;

/// Fully specified command for one simulation process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub program: PathBuf,
    pub args: Vec<String>,
    pub cwd: Option<PathBuf>,
    pub env: Vec<(String, String)>,
}

impl ProcessSpec {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            env: Vec::new(),
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn cwd(mut self, cwd: impl Into<PathBuf>) -> Self {
        self.cwd = Some(cwd.into());
        self
    }

    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Build the Tokio command. Stdio is left for the caller to wire up.
    pub(crate) fn to_command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args);
        if let Some(cwd) = &self.cwd {
            cmd.current_dir(cwd);
        }
        for (k, v) in &self.env {
            cmd.env(k, v);
        }
        cmd
    }
}

impl fmt::Display for ProcessSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " {:?}", arg)?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Produces the command for a job.
///
/// A failure aborts that single launch attempt only; it should be reported
/// as [`SimrunError::ResourceUnavailable`].
pub trait ProcessSpecBuilder: Send + Sync {
    fn build_command(&self, job: JobId) -> Result<ProcessSpec>;
}

impl<F> ProcessSpecBuilder for F
where
    F: Fn(JobId) -> Result<ProcessSpec> + Send + Sync,
{
    fn build_command(&self, job: JobId) -> Result<ProcessSpec> {
        self(job)
    }
}

/// Config-driven builder: `program runtime_args... args...` with `{job}`
/// substituted everywhere.
#[derive(Debug, Clone)]
pub struct TemplateSpecBuilder {
    section: ProcessSection,
    search_path: Option<OsString>,
}

impl TemplateSpecBuilder {
    /// Builder resolving bare program names against the current `PATH`.
    pub fn from_config(section: &ProcessSection) -> Self {
        Self {
            section: section.clone(),
            search_path: std::env::var_os("PATH"),
        }
    }

    /// Override the search path used for bare program names.
    pub fn with_search_path(mut self, path: Option<OsString>) -> Self {
        self.search_path = path;
        self
    }

    fn resolve_program(&self) -> Result<PathBuf> {
        let program = Path::new(&self.section.program);

        // Anything with a directory component is taken as-is; the OS reports
        // a bad path at spawn time.
        if program.components().count() > 1 || program.is_absolute() {
            return Ok(program.to_path_buf());
        }

        let Some(search_path) = &self.search_path else {
            return Err(SimrunError::ResourceUnavailable(format!(
                "cannot resolve program '{}': PATH is not set",
                self.section.program
            )));
        };

        std::env::split_paths(search_path)
            .map(|dir| dir.join(program))
            .find(|candidate| is_executable(candidate))
            .ok_or_else(|| {
                SimrunError::ResourceUnavailable(format!(
                    "cannot resolve program '{}' on PATH",
                    self.section.program
                ))
            })
    }
}

impl ProcessSpecBuilder for TemplateSpecBuilder {
    fn build_command(&self, job: JobId) -> Result<ProcessSpec> {
        let program = self.resolve_program()?;
        let job_str = job.to_string();
        let expand = |s: &String| s.replace(JOB_PLACEHOLDER, &job_str);

        let mut spec = ProcessSpec::new(program)
            .args(self.section.runtime_args.iter().map(expand))
            .args(self.section.args.iter().map(expand));

        if let Some(cwd) = &self.section.cwd {
            spec = spec.cwd(cwd);
        }
        for (k, v) in &self.section.env {
            spec = spec.env(k, expand(v));
        }

        trace!(job, command = %spec, "built process spec");
        Ok(spec)
    }
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    path.metadata()
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file()
}
