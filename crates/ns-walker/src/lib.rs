#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The constrained Monte Carlo walker.
//!
//! `walk` runs a fixed-length chain of trial moves under an energy cutoff
//! plus auxiliary configuration tests, short-circuiting the energy test
//! before the (potentially more expensive) configuration tests.

use ns_core::{AcceptTest, NsError, NsRng, Observer, Potential, Replica, StepKernel, WalkResult};

/// Runs one constrained Markov chain from `seed` under `cutoff`.
pub struct MonteCarloWalker<'a> {
    potential: &'a dyn Potential,
    step_kernel: &'a dyn StepKernel,
    accept_tests: &'a [Box<dyn AcceptTest>],
    events: &'a [Box<dyn Observer>],
}

impl<'a> MonteCarloWalker<'a> {
    /// Construct a walker over the given potential, step kernel, and
    /// auxiliary configuration tests/observers.
    pub fn new(
        potential: &'a dyn Potential,
        step_kernel: &'a dyn StepKernel,
        accept_tests: &'a [Box<dyn AcceptTest>],
        events: &'a [Box<dyn Observer>],
    ) -> Self {
        Self {
            potential,
            step_kernel,
            accept_tests,
            events,
        }
    }

    /// Run exactly `mciter` trial moves starting from `seed`, constrained
    /// to stay below `cutoff`.
    ///
    /// Deterministic given `rng`'s state. If zero trials are accepted the
    /// seed is returned unchanged — it already satisfied the constraint.
    pub fn walk(
        &self,
        seed: &Replica,
        cutoff: f64,
        stepsize: f64,
        mciter: u64,
        rng: &mut NsRng,
    ) -> Result<WalkResult, NsError> {
        let mut x_current = seed.x.clone();
        let mut e_current = seed.e;

        let mut n_accept: u64 = 0;
        let mut n_cutoff_reject: u64 = 0;
        let mut n_test_reject: u64 = 0;

        for _ in 0..mciter {
            let x_trial = self.step_kernel.take_step(&x_current, stepsize, rng);
            let e_trial = self.potential.energy(&x_trial).map_err(|err| NsError::Potential {
                x: x_trial.clone(),
                message: format!("{err:#}"),
            })?;
            if !e_trial.is_finite() {
                return Err(NsError::Potential {
                    x: x_trial,
                    message: "energy() returned a non-finite value".to_string(),
                });
            }

            let passes_cutoff = e_trial < cutoff;
            let passes_tests = passes_cutoff && self.accept_tests.iter().all(|t| t.accept(&x_trial));

            if passes_cutoff && passes_tests {
                x_current = x_trial;
                e_current = e_trial;
                n_accept += 1;
            } else if !passes_cutoff {
                n_cutoff_reject += 1;
            } else {
                n_test_reject += 1;
            }

            for event in self.events {
                event.on_step(&x_current, e_current);
            }
        }

        let n_reject = n_cutoff_reject + n_test_reject;
        tracing::debug!(
            n_accept,
            n_reject,
            n_cutoff_reject,
            n_test_reject,
            "walk finished"
        );

        Ok(WalkResult {
            replica: Replica::new(x_current, e_current),
            n_accept,
            n_reject,
            n_cutoff_reject,
            n_test_reject,
        })
    }
}
