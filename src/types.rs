use std::fmt;

/// Identifier of one simulation run.
///
/// Ids are opaque to the scheduler; only [`SENTINEL`] has a meaning.
pub type JobId = u64;

/// Reserved id marking the end of submitted input. Never a real job.
pub const SENTINEL: JobId = 0;

/// Answer of the supervisor to a single launch attempt.
///
/// Backpressure is an ordinary value here so the dispatcher's retry loop is
/// plain control flow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Admission {
    /// A process was started and now occupies a running slot.
    Launched,
    /// Every slot is taken; try again once the reaper frees one.
    AtCapacity,
    /// The ceiling is zero (fast-fail tripped). Retrying cannot succeed until
    /// an operator raises the ceiling again.
    Halted,
}

/// Exit code recorded by the reaper for one finished job.
///
/// Processes terminated by a signal (or whose status could not be read) are
/// recorded with code `-1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JobOutcome {
    pub job: JobId,
    pub exit_code: i32,
}

impl JobOutcome {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

impl fmt::Display for JobOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "job {} exited with {}", self.job, self.exit_code)
    }
}

/// Lifecycle of a dispatcher: `Idle -> Running -> Stopped`, never backwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Idle,
    Running,
    Stopped,
}
