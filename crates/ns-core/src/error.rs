/// Fatal error kinds for the nested-sampling engine.
///
/// Nothing is recovered silently except transport retries, which are
/// handled inside `ns-dispatch` before a `Transport` error ever reaches
/// here. `ns-cli` maps each variant to a process exit code.
#[derive(Debug, thiserror::Error)]
pub enum NsError {
    /// Invalid `N`, `K >= N`, `nproc < 1`, missing endpoint, etc.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// `potential.energy` raised or returned a non-finite value.
    #[error("potential error at x={x:?}: {message}")]
    Potential {
        /// The offending configuration.
        x: Vec<f64>,
        /// Failure detail.
        message: String,
    },

    /// A dispatcher-returned replica violated `e < cutoff`.
    #[error("invariant violation: returned replica e={e} >= cutoff={cutoff}")]
    InvariantViolation {
        /// The energy the dispatcher returned.
        e: f64,
        /// The cutoff it should have stayed below.
        cutoff: f64,
    },

    /// A remote dispatcher call failed after exhausting `retry_max` retries.
    #[error("transport error after {attempts} attempt(s): {message}")]
    Transport {
        /// Number of attempts made, including the first.
        attempts: u32,
        /// Failure detail.
        message: String,
    },

    /// A batch exceeded its configured wall-clock budget.
    #[error("batch timed out after {0:?}")]
    Timeout(std::time::Duration),

    /// User-signalled cancellation; not itself an error condition for the
    /// process exit code, but modeled here so the engine loop can return
    /// it through the same `Result` path as other stops.
    #[error("cancelled")]
    Cancelled,
}

impl NsError {
    /// Process exit code to report this error with.
    pub fn exit_code(&self) -> i32 {
        match self {
            NsError::Configuration(_) => 1,
            NsError::Potential { .. } | NsError::InvariantViolation { .. } => 2,
            NsError::Transport { .. } => 3,
            NsError::Timeout(_) => 4,
            NsError::Cancelled => 0,
        }
    }
}
