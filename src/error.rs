use thiserror::Error;

/// Configuration rejected at `Manager`/pool construction time. Fatal: the
/// pool never starts.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("unknown algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("contradictory configuration: {0}")]
    Contradictory(&'static str),
    #[error("neither max_trials nor max_time is finite; run_trials would never terminate")]
    NoBudget,
}

/// Raised by an `Environment` implementation. Recoverable: the worker that
/// hit it aborts only the current trial and the pool keeps running.
#[derive(Debug, Error)]
pub enum EnvironmentError {
    #[error("action not valid in this state")]
    InvalidAction,
    #[error("sampler returned an observation outside its own distribution")]
    UnsupportedObservation,
    #[error("transition distribution does not sum to 1 (got {0})")]
    BadDistribution(f64),
}

/// Programmer error: the node graph invariant `get_child(k)` on a missing
/// key was violated. Not recoverable, matches the teacher's use of
/// `.expect(...)` for broken invariants (`lib.rs::init`).
#[derive(Debug, Error)]
pub enum TreeInvariantError {
    #[error("no child for key")]
    MissingChild,
}

impl TreeInvariantError {
    /// Aborts the process. Called at sites where the invariant is a
    /// precondition established earlier in the same trial, so surviving it
    /// would only propagate corrupted state.
    pub fn panic(self) -> ! {
        panic!("tree invariant violated: {self}")
    }
}
