// src/store/mod.rs

//! Job metadata access.
//!
//! The scheduler never reads job records; the batch commands do, to decide
//! which ids to submit. [`JobStore`] is the narrow read interface, and
//! [`FileJobStore`] a TOML-backed implementation of it.

pub mod file;
pub mod validate;

use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};

use crate::types::JobId;

pub use file::FileJobStore;

/// Lifecycle states a job record can be in.
pub mod state {
    pub const NOT_STARTED: &str = "NOT STARTED";
    pub const AUTO_START: &str = "AUTO START";
}

/// Stored description of one simulation.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct JobRecord {
    pub name: String,

    /// Simulation class the worker process should instantiate.
    pub class_name: String,

    #[serde(default = "default_state")]
    pub state: String,

    /// Simulation cycle at which the run stops.
    pub finish_cycle: u64,

    /// Opaque to the scheduler. Non-string TOML values are kept in their
    /// TOML spelling, so `agents = 20` reads back as `"20"`.
    #[serde(default, deserialize_with = "parameters_as_strings")]
    pub parameters: BTreeMap<String, String>,

    #[serde(default)]
    pub parent: Option<JobId>,
}

fn default_state() -> String {
    state::NOT_STARTED.to_string()
}

fn parameters_as_strings<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = BTreeMap::<String, toml::Value>::deserialize(deserializer)?;
    Ok(raw
        .into_iter()
        .map(|(key, value)| {
            let value = match value {
                toml::Value::String(s) => s,
                other => other.to_string(),
            };
            (key, value)
        })
        .collect())
}

impl JobRecord {
    pub fn is_in_state(&self, state: &str) -> bool {
        self.state.eq_ignore_ascii_case(state)
    }
}

/// Read access to job records.
pub trait JobStore {
    /// All job ids, ascending.
    fn list_job_ids(&self) -> Vec<JobId>;

    fn get_job(&self, id: JobId) -> Option<JobRecord>;
}

/// Ids of the jobs a batch run should submit, in id order.
///
/// Jobs in `AUTO START` are always selected; `NOT STARTED` jobs only when
/// `include_not_started` is set.
pub fn select_runnable(store: &dyn JobStore, include_not_started: bool) -> Vec<JobId> {
    store
        .list_job_ids()
        .into_iter()
        .filter(|&id| {
            store.get_job(id).is_some_and(|job| {
                job.is_in_state(state::AUTO_START)
                    || (include_not_started && job.is_in_state(state::NOT_STARTED))
            })
        })
        .collect()
}

/// Render the job listing as a tab-separated, column-aligned table.
pub fn format_job_table(store: &dyn JobStore) -> String {
    const HEADERS: [&str; 5] = ["ID", "Name", "ClassName", "State", "FinishCycle"];

    let rows: Vec<[String; 5]> = store
        .list_job_ids()
        .into_iter()
        .filter_map(|id| {
            let job = store.get_job(id)?;
            Some([
                id.to_string(),
                job.name,
                job.class_name,
                job.state,
                job.finish_cycle.to_string(),
            ])
        })
        .collect();

    let mut widths = HEADERS.map(str::len);
    for row in &rows {
        for (w, cell) in widths.iter_mut().zip(row) {
            *w = (*w).max(cell.len());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &widths, HEADERS.iter().copied());
    push_row(&mut out, &widths, widths.map(|w| "-".repeat(w)).iter().map(String::as_str));
    for row in &rows {
        push_row(&mut out, &widths, row.iter().map(String::as_str));
    }
    out
}

fn push_row<'a>(out: &mut String, widths: &[usize], cells: impl Iterator<Item = &'a str>) {
    let line: Vec<String> = cells
        .zip(widths.iter().copied())
        .map(|(cell, w)| format!("{cell:<w$}"))
        .collect();
    out.push_str(line.join("\t").trim_end());
    out.push('\n');
}
