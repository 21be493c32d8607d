#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! Illustrative `Potential`/`StepKernel`/`AcceptTest` implementations used
//! by this workspace's own tests and by `ns-cli`'s `--potential harmonic`
//! demo mode, plus fault-injecting test doubles for exercising error
//! paths.
//!
//! None of this is part of the nested-sampling core: the concrete
//! potential, step kernel, and accept-test list are external
//! collaborators supplied by the caller; this crate exists only because
//! the tests need something concrete to run against.

use rand::Rng;

use ns_core::{AcceptTest, NsError, NsRng, Potential, Replica, StepKernel, WalkDispatcher, WalkJob, WalkResult};

/// `energy(x) = 0.5 * |x|^2`, the harmonic well used in scenarios S1–S3.
pub struct HarmonicPotential {
    ndof: usize,
}

impl HarmonicPotential {
    /// Construct a harmonic potential over `ndof` dimensions.
    pub fn new(ndof: usize) -> Self {
        Self { ndof }
    }
}

impl Potential for HarmonicPotential {
    fn ndof(&self) -> usize {
        self.ndof
    }

    fn energy(&self, x: &[f64]) -> anyhow::Result<f64> {
        Ok(0.5 * x.iter().map(|v| v * v).sum::<f64>())
    }

    fn random_configuration(&self, rng: &mut NsRng) -> Vec<f64> {
        // Ball-of-radius-10 initialization, matching scenario S2.
        (0..self.ndof).map(|_| rng.random_range(-10.0..10.0)).collect()
    }
}

/// `x' = x + Uniform(-stepsize, +stepsize)` per coordinate. Symmetric, as
/// the walker's acceptance rule requires.
pub struct UniformStepKernel;

impl StepKernel for UniformStepKernel {
    fn take_step(&self, x: &[f64], stepsize: f64, rng: &mut NsRng) -> Vec<f64> {
        x.iter()
            .map(|v| v + rng.random_range(-stepsize..stepsize))
            .collect()
    }
}

/// `‖x‖∞ < bound`, the constrained-box test from scenario S3.
pub struct BoxAcceptTest {
    bound: f64,
}

impl BoxAcceptTest {
    /// Construct a box test with the given half-width.
    pub fn new(bound: f64) -> Self {
        Self { bound }
    }
}

impl AcceptTest for BoxAcceptTest {
    fn accept(&self, x: &[f64]) -> bool {
        x.iter().all(|v| v.abs() < self.bound)
    }
}

/// A walk that always reports a replica at or above its own cutoff,
/// simulating a worker that ignores the constraint it was given.
pub struct FaultyWalker;

impl FaultyWalker {
    /// "Run" a job, always returning a replica at `cutoff + 1.0`.
    pub fn walk(&self, job: &WalkJob) -> WalkResult {
        WalkResult {
            replica: Replica::new(job.seed.x.clone(), job.cutoff + 1.0),
            n_accept: 1,
            n_reject: 0,
            n_cutoff_reject: 0,
            n_test_reject: 0,
        }
    }
}

/// A dispatcher that runs every job through [`FaultyWalker`], for
/// exercising the engine's invariant-violation error path.
pub struct FaultyDispatcher;

#[async_trait::async_trait]
impl WalkDispatcher for FaultyDispatcher {
    async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError> {
        let walker = FaultyWalker;
        Ok(jobs.iter().map(|job| walker.walk(job)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::rng_from_seed;

    #[test]
    fn harmonic_energy_is_nonnegative() {
        let p = HarmonicPotential::new(3);
        let e = p.energy(&[1.0, -2.0, 0.5]).unwrap();
        assert!((e - 0.5 * (1.0 + 4.0 + 0.25)).abs() < 1e-12);
    }

    #[test]
    fn box_test_matches_infinity_norm() {
        let t = BoxAcceptTest::new(1.0);
        assert!(t.accept(&[0.5, -0.9]));
        assert!(!t.accept(&[0.5, 1.1]));
    }

    #[test]
    fn uniform_step_is_bounded() {
        let kernel = UniformStepKernel;
        let mut rng = rng_from_seed(1);
        let x = vec![0.0; 4];
        let x2 = kernel.take_step(&x, 0.5, &mut rng);
        for (a, b) in x.iter().zip(x2.iter()) {
            assert!((b - a).abs() < 0.5);
        }
    }
}
