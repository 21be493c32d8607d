use crate::{NsError, NsRng, WalkJob, WalkResult};

/// The scalar energy function the population samples below.
///
/// An explicit capability trait rather than a duck-typed callback.
/// `energy` may fail (e.g. on a numerically degenerate configuration); a
/// `random_configuration` failure is not modeled here because
/// construction-time failures surface as `NsError::Configuration` in the
/// driver instead.
pub trait Potential: Send + Sync {
    /// Number of degrees of freedom of a configuration.
    fn ndof(&self) -> usize;

    /// Evaluate the energy at `x`. Must return a finite value; a
    /// non-finite result is treated as a fatal potential error by callers.
    fn energy(&self, x: &[f64]) -> anyhow::Result<f64>;

    /// Draw a fresh configuration, e.g. for the engine's initial live set.
    fn random_configuration(&self, rng: &mut NsRng) -> Vec<f64>;
}

/// A symmetric proposal kernel: `(x, stepsize, rng) -> x'`.
///
/// Symmetry is assumed by the walker's pure hard-wall-rejection acceptance
/// rule; this trait does not enforce it, callers must supply a symmetric
/// kernel.
pub trait StepKernel: Send + Sync {
    /// Propose a trial configuration from `x` at the given step size.
    fn take_step(&self, x: &[f64], stepsize: f64, rng: &mut NsRng) -> Vec<f64>;
}

/// A pure, cheap, total predicate a trial configuration must satisfy.
pub trait AcceptTest: Send + Sync {
    /// Returns whether `x` satisfies the test.
    fn accept(&self, x: &[f64]) -> bool;
}

/// A pure observer invoked on each walker state transition.
///
/// Observers must not mutate walker state; they exist for diagnostics
/// (e.g. writing every visited configuration to a trace file).
pub trait Observer: Send + Sync {
    /// Called with the walker's current configuration after each trial.
    fn on_step(&self, x: &[f64], e: f64);
}

/// Runs a batch of independent constrained walks and returns their
/// results in the same order as `jobs`.
///
/// A batch is synchronous from the caller's point of view: `run_batch`
/// does not return until all jobs complete or one fails. If any single
/// job fails, the whole batch fails and partial results are discarded.
#[async_trait::async_trait]
pub trait WalkDispatcher: Send + Sync {
    /// Run `jobs` to completion, in input order.
    async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError>;
}
