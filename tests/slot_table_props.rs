// tests/slot_table_props.rs

use std::cell::Cell;
use std::io;
use std::rc::Rc;

use proptest::prelude::*;
use simrun::exec::{ExitProbe, SlotTable};
use simrun::types::{Admission, JobId};

/// Process stand-in whose exit status the test flips by hand.
struct FakeProcess {
    status: Rc<Cell<Option<i32>>>,
}

impl ExitProbe for FakeProcess {
    fn try_exit(&mut self) -> io::Result<Option<i32>> {
        Ok(self.status.get())
    }
}

#[derive(Debug, Clone)]
enum Op {
    Launch,
    // Index into the launched processes (taken modulo their count) and exit code.
    Exit(usize, i32),
    Reap,
}

fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Launch),
        3 => (any::<usize>(), prop_oneof![8 => Just(0), 1 => 1..=3i32]).prop_map(|(i, c)| Op::Exit(i, c)),
        3 => Just(Op::Reap),
    ]
}

proptest! {
    #[test]
    fn running_count_never_exceeds_ceiling_at_admission(
        ceiling in 1..6usize,
        ops in proptest::collection::vec(op_strategy(), 1..80),
    ) {
        let mut table: SlotTable<FakeProcess> = SlotTable::new(ceiling);
        let mut handles: Vec<Rc<Cell<Option<i32>>>> = Vec::new();
        let mut next_job: JobId = 1;
        let mut reaped = 0usize;
        let mut saw_failure = false;

        for op in ops {
            match op {
                Op::Launch => match table.rejection() {
                    None => {
                        prop_assert!(table.running_count() < table.capacity());
                        let status = Rc::new(Cell::new(None));
                        table.occupy(next_job, FakeProcess { status: Rc::clone(&status) });
                        handles.push(status);
                        next_job += 1;
                        prop_assert!(table.running_count() <= table.capacity());
                    }
                    Some(Admission::AtCapacity) => {
                        prop_assert_eq!(table.running_count(), table.capacity());
                    }
                    Some(Admission::Halted) => prop_assert!(saw_failure),
                    Some(Admission::Launched) => prop_assert!(false, "rejection never says Launched"),
                },
                Op::Exit(i, code) => {
                    if !handles.is_empty() {
                        let handle = &handles[i % handles.len()];
                        if handle.get().is_none() {
                            handle.set(Some(code));
                        }
                    }
                }
                Op::Reap => {
                    let finished = table.reap();
                    reaped += finished.len();
                    if finished.iter().any(|o| !o.success()) {
                        saw_failure = true;
                    }
                }
            }

            if saw_failure {
                prop_assert_eq!(table.capacity(), 0);
                prop_assert_eq!(table.rejection(), Some(Admission::Halted));
            } else {
                prop_assert_eq!(table.capacity(), ceiling);
            }
            prop_assert_eq!(table.outcomes().len(), reaped);
        }
    }

    #[test]
    fn reap_keeps_exactly_the_unfinished_jobs(
        exits in proptest::collection::vec(proptest::option::of(0..2i32), 1..10),
    ) {
        let mut table: SlotTable<FakeProcess> = SlotTable::new(exits.len());

        for (i, exit) in exits.iter().enumerate() {
            let status = Rc::new(Cell::new(*exit));
            table.occupy(i as JobId + 1, FakeProcess { status });
        }

        let finished = table.reap();

        let expected_running: Vec<JobId> = exits
            .iter()
            .enumerate()
            .filter(|(_, e)| e.is_none())
            .map(|(i, _)| i as JobId + 1)
            .collect();
        prop_assert_eq!(table.running_jobs(), expected_running);
        prop_assert_eq!(finished.len(), exits.iter().filter(|e| e.is_some()).count());

        let any_failed = exits.iter().any(|e| matches!(e, Some(c) if *c != 0));
        prop_assert_eq!(table.capacity() == 0, any_failed);
    }
}

#[test]
fn probe_error_is_recorded_as_failure() {
    struct Broken;

    impl ExitProbe for Broken {
        fn try_exit(&mut self) -> io::Result<Option<i32>> {
            Err(io::Error::other("status unavailable"))
        }
    }

    let mut table = SlotTable::new(2);
    table.occupy(7, Broken);

    let finished = table.reap();

    assert_eq!(finished.len(), 1);
    assert_eq!(finished[0].exit_code, -1);
    assert!(table.is_idle());
    assert_eq!(table.rejection(), Some(Admission::Halted));
}

#[test]
fn raising_the_ceiling_reopens_admission() {
    let mut table: SlotTable<FakeProcess> = SlotTable::new(1);
    table.occupy(1, FakeProcess { status: Rc::new(Cell::new(Some(5))) });
    table.reap();
    assert_eq!(table.rejection(), Some(Admission::Halted));

    assert_eq!(table.set_capacity(3), 0);

    assert_eq!(table.rejection(), None);
    assert_eq!(table.capacity(), 3);
}
