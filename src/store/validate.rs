// src/store/validate.rs

use std::collections::BTreeMap;

use petgraph::algo::toposort;
use petgraph::graphmap::DiGraphMap;

use crate::errors::{Result, SimrunError};
use crate::store::JobRecord;
use crate::types::{JobId, SENTINEL};

/// Check ids and parent links of a loaded job set.
pub fn validate_jobs(jobs: &BTreeMap<JobId, JobRecord>) -> Result<()> {
    validate_ids(jobs)?;
    validate_parent_references(jobs)?;
    validate_parent_graph(jobs)?;
    Ok(())
}

fn validate_ids(jobs: &BTreeMap<JobId, JobRecord>) -> Result<()> {
    if jobs.contains_key(&SENTINEL) {
        return Err(SimrunError::ConfigError(
            "job id 0 is reserved and cannot name a job".to_string(),
        ));
    }
    Ok(())
}

fn validate_parent_references(jobs: &BTreeMap<JobId, JobRecord>) -> Result<()> {
    for (id, job) in jobs.iter() {
        let Some(parent) = job.parent else {
            continue;
        };
        if parent == *id {
            return Err(SimrunError::ConfigError(format!(
                "job {} cannot be its own parent",
                id
            )));
        }
        if !jobs.contains_key(&parent) {
            return Err(SimrunError::ConfigError(format!(
                "job {} has unknown parent {}",
                id, parent
            )));
        }
    }
    Ok(())
}

fn validate_parent_graph(jobs: &BTreeMap<JobId, JobRecord>) -> Result<()> {
    // Edge direction: parent -> child.
    let mut graph: DiGraphMap<JobId, ()> = DiGraphMap::new();

    for id in jobs.keys() {
        graph.add_node(*id);
    }
    for (id, job) in jobs.iter() {
        if let Some(parent) = job.parent {
            graph.add_edge(parent, *id, ());
        }
    }

    match toposort(&graph, None) {
        Ok(_order) => Ok(()),
        Err(cycle) => Err(SimrunError::ParentCycle(format!(
            "cycle detected in job parents involving job {}",
            cycle.node_id()
        ))),
    }
}
