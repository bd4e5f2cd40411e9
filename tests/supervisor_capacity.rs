// tests/supervisor_capacity.rs
#![cfg(unix)]

mod common;
use crate::common::{ScriptedSpecs, TestResult, fast_supervisor, init_tracing, wait_until, with_timeout};

use std::sync::Arc;

use simrun::errors::{Result as SimResult, SimrunError};
use simrun::exec::{ProcessSpec, ProcessSpecBuilder};
use simrun::types::{Admission, JobId};

#[tokio::test]
async fn c_plus_k_jobs_occupy_exactly_c_slots() -> TestResult {
    init_tracing();

    let specs = ScriptedSpecs::new("sleep 1");
    let built = specs.built();
    let supervisor = fast_supervisor(specs.into_arc(), 2);

    assert_eq!(supervisor.start(1)?, Admission::Launched);
    assert_eq!(supervisor.start(2)?, Admission::Launched);
    assert_eq!(supervisor.start(3)?, Admission::AtCapacity);
    assert_eq!(supervisor.start(4)?, Admission::AtCapacity);

    assert_eq!(supervisor.running_count(), 2);
    assert_eq!(supervisor.capacity(), 2);
    assert_eq!(supervisor.running_jobs(), vec![1, 2]);

    // Rejected attempts never reach the spec builder.
    assert_eq!(*built.lock().unwrap(), vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn reaper_frees_slot_after_exit() -> TestResult {
    init_tracing();

    let supervisor = fast_supervisor(ScriptedSpecs::new("exit 0").into_arc(), 1);

    assert_eq!(supervisor.start(1)?, Admission::Launched);
    assert_eq!(supervisor.start(2)?, Admission::AtCapacity);

    with_timeout(wait_until("job 1 reaped", || supervisor.running_count() == 0)).await;

    assert_eq!(supervisor.start(2)?, Admission::Launched);
    assert_eq!(supervisor.capacity(), 1);

    let outcomes = supervisor.outcomes();
    assert_eq!(outcomes.len(), 1);
    assert_eq!(outcomes[0].job, 1);
    assert_eq!(outcomes[0].exit_code, 0);

    Ok(())
}

#[tokio::test]
async fn spawn_failure_does_not_consume_capacity() -> TestResult {
    init_tracing();

    let specs = |job: JobId| -> SimResult<ProcessSpec> {
        if job == 7 {
            Ok(ProcessSpec::new("/nonexistent/simrun-test-binary"))
        } else {
            Ok(ProcessSpec::new("sh").arg("-c").arg("sleep 1"))
        }
    };
    let specs: Arc<dyn ProcessSpecBuilder> = Arc::new(specs);
    let supervisor = fast_supervisor(specs, 1);

    match supervisor.start(7) {
        Err(SimrunError::Spawn { job, .. }) => assert_eq!(job, 7),
        other => panic!("expected spawn failure, got {other:?}"),
    }

    assert_eq!(supervisor.running_count(), 0);
    assert_eq!(supervisor.capacity(), 1, "spawn failure must not trip fast-fail");
    assert_eq!(supervisor.start(8)?, Admission::Launched);

    Ok(())
}

#[tokio::test]
async fn unavailable_spec_aborts_only_that_launch() -> TestResult {
    init_tracing();

    let specs = ScriptedSpecs::new("sleep 1").unavailable(5);
    let supervisor = fast_supervisor(specs.into_arc(), 2);

    match supervisor.start(5) {
        Err(SimrunError::ResourceUnavailable(msg)) => assert!(msg.contains('5')),
        other => panic!("expected ResourceUnavailable, got {other:?}"),
    }

    assert_eq!(supervisor.start(6)?, Admission::Launched);
    assert_eq!(supervisor.running_jobs(), vec![6]);

    Ok(())
}

#[tokio::test]
async fn reap_on_empty_set_is_a_no_op() -> TestResult {
    init_tracing();

    let supervisor = fast_supervisor(ScriptedSpecs::new("exit 0").into_arc(), 3);

    assert!(supervisor.reap().is_empty());
    assert_eq!(supervisor.capacity(), 3);
    assert!(supervisor.outcomes().is_empty());

    // Nothing running, so waiting for idle returns straight away.
    with_timeout(supervisor.wait_idle()).await;

    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_starts_never_exceed_ceiling() -> TestResult {
    init_tracing();

    let supervisor = fast_supervisor(ScriptedSpecs::new("sleep 1").into_arc(), 3);

    let mut handles = Vec::new();
    for job in 1..=12 {
        let supervisor = Arc::clone(&supervisor);
        handles.push(tokio::spawn(async move { supervisor.start(job) }));
    }

    let mut launched = 0;
    for handle in handles {
        if handle.await?? == Admission::Launched {
            launched += 1;
        }
    }

    assert_eq!(launched, 3);
    assert_eq!(supervisor.running_count(), 3);

    Ok(())
}

#[tokio::test]
async fn wait_idle_resolves_once_every_process_exited() -> TestResult {
    init_tracing();

    let specs = ScriptedSpecs::new("sleep 0.1").script(2, "sleep 0.3");
    let supervisor = fast_supervisor(specs.into_arc(), 2);

    supervisor.start(1)?;
    supervisor.start(2)?;

    with_timeout(supervisor.wait_idle()).await;

    assert_eq!(supervisor.running_count(), 0);
    let mut reaped: Vec<_> = supervisor.outcomes().iter().map(|o| o.job).collect();
    reaped.sort();
    assert_eq!(reaped, vec![1, 2]);

    Ok(())
}
