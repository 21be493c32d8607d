use std::sync::Arc;

use rand::seq::index::sample;

use ns_core::{derive_seed, rng_from_seed, EngineConfig, NsError, NsRng, Replica, WalkJob};
use ns_dispatch::WalkDispatcher;

use crate::live_set::LiveSet;
use crate::step_size;

/// How sharply the step-size control reacts to acceptance ratio deviation
/// from `target_ratio`.
const STEP_SIZE_ALPHA: f64 = 1.0;

/// What one call to [`NestedSampling::step`] produced.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    /// The `K` energies discarded this iteration, ascending.
    pub discarded: Vec<f64>,
    /// Step size in effect for *this* iteration's walks (before the
    /// post-iteration adaptive update).
    pub stepsize_used: f64,
    /// Observed acceptance ratio over this iteration's batch.
    pub accept_ratio: f64,
    /// 1-based iteration counter, matching what was just completed.
    pub iteration: u64,
}

/// The nested-sampling iteration engine.
///
/// Owns the live set exclusively; the only suspension point per iteration
/// is the `await` on [`WalkDispatcher::run_batch`].
pub struct NestedSampling {
    live_set: LiveSet,
    dispatcher: Arc<dyn WalkDispatcher>,
    k: usize,
    mciter: u64,
    stepsize: f64,
    stepsize_min: f64,
    max_stepsize: f64,
    target_ratio: f64,
    rng: NsRng,
    iteration: u64,
}

impl NestedSampling {
    /// Construct an engine over an initial live set and dispatcher,
    /// validating `config` against the live set's size first.
    pub fn new(
        replicas: Vec<Replica>,
        dispatcher: Arc<dyn WalkDispatcher>,
        config: &EngineConfig,
    ) -> Result<Self, NsError> {
        config.validate(replicas.len())?;
        Ok(Self {
            live_set: LiveSet::new(replicas),
            dispatcher,
            k: config.nproc,
            mciter: config.mciter,
            stepsize: config.stepsize,
            stepsize_min: config.stepsize_min,
            max_stepsize: config.max_stepsize,
            target_ratio: config.target_ratio,
            rng: rng_from_seed(config.seed),
            iteration: 0,
        })
    }

    /// 0-based count of iterations completed so far.
    pub fn iteration(&self) -> u64 {
        self.iteration
    }

    /// Current adaptive step size.
    pub fn stepsize(&self) -> f64 {
        self.stepsize
    }

    /// `E_max_live - E_min_live`, the termination spread.
    pub fn energy_spread(&self) -> f64 {
        self.live_set.max_e() - self.live_set.min_e()
    }

    /// Final live-set energies, ascending.
    pub fn live_energies(&self) -> Vec<f64> {
        self.live_set.energies_ascending()
    }

    /// Whether the termination tolerance has been reached. `max_iter` and
    /// cancellation are the caller's responsibility to check between
    /// calls to [`Self::step`].
    pub fn etol_reached(&self, etol: f64) -> bool {
        self.energy_spread() < etol
    }

    /// Run one NS iteration: discard the `K` highest-energy replicas,
    /// clone-and-mutate `K` surviving seeds under the new cutoff, replace,
    /// and adapt the step size.
    pub async fn step(&mut self) -> Result<StepOutcome, NsError> {
        let n = self.live_set.len();
        let k = self.k;

        let cutoff = self.live_set.cutoff(k);
        let discarded = self.live_set.discarded_top_k(k);

        let seed_indices = sample(&mut self.rng, n - k, k);
        let jobs: Vec<WalkJob> = {
            let survivors = self.live_set.survivors(k);
            seed_indices
                .iter()
                .map(|i| WalkJob {
                    seed: survivors[i].clone(),
                    cutoff,
                    stepsize: self.stepsize,
                    seed_rng: derive_seed(&mut self.rng),
                })
                .collect()
        };

        let results = self.dispatcher.run_batch(jobs).await?;

        let mut accept_total = 0u64;
        let mut trial_total = 0u64;
        let mut replacements = Vec::with_capacity(k);
        for result in results {
            if result.replica.e >= cutoff {
                return Err(NsError::InvariantViolation {
                    e: result.replica.e,
                    cutoff,
                });
            }
            accept_total += result.n_accept;
            trial_total += result.n_trials();
            replacements.push(result.replica);
        }

        self.live_set.replace_top_k(k, replacements);

        let accept_ratio = if trial_total == 0 {
            0.0
        } else {
            accept_total as f64 / trial_total as f64
        };
        let factor = step_size::step_factor(accept_ratio, self.target_ratio, STEP_SIZE_ALPHA);
        let stepsize_used = self.stepsize;
        self.stepsize = step_size::update_stepsize(self.stepsize, factor, self.stepsize_min, self.max_stepsize);

        self.iteration += 1;

        metrics::counter!("ns_steps_total").increment(k as u64);
        metrics::gauge!("ns_stepsize").set(self.stepsize);
        metrics::histogram!("ns_accept_ratio").record(accept_ratio);
        tracing::info!(
            iteration = self.iteration,
            stepsize_used,
            next_stepsize = self.stepsize,
            accept_ratio,
            e_cut = cutoff,
            "nested sampling iteration complete"
        );

        Ok(StepOutcome {
            discarded,
            stepsize_used,
            accept_ratio,
            iteration: self.iteration,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ns_core::{AcceptTest, Observer, Potential, StepKernel, WalkResult};
    use ns_testkit::{FaultyDispatcher, HarmonicPotential, UniformStepKernel};
    use ns_walker::MonteCarloWalker;

    struct InlineDispatcher {
        potential: HarmonicPotential,
        kernel: UniformStepKernel,
        mciter: u64,
    }

    #[async_trait]
    impl WalkDispatcher for InlineDispatcher {
        async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError> {
            let accept_tests: Vec<Box<dyn AcceptTest>> = Vec::new();
            let events: Vec<Box<dyn Observer>> = Vec::new();
            let walker = MonteCarloWalker::new(&self.potential, &self.kernel, &accept_tests, &events);
            jobs.into_iter()
                .map(|job| {
                    let mut rng = rng_from_seed(job.seed_rng);
                    walker.walk(&job.seed, job.cutoff, job.stepsize, self.mciter, &mut rng)
                })
                .collect()
        }
    }

    fn initial_replicas(potential: &HarmonicPotential, n: usize, seed: u64) -> Vec<Replica> {
        let mut rng = rng_from_seed(seed);
        (0..n)
            .map(|_| {
                let x = potential.random_configuration(&mut rng);
                let e = potential.energy(&x).unwrap();
                Replica::new(x, e)
            })
            .collect()
    }

    fn config(_n: usize, k: usize) -> EngineConfig {
        EngineConfig {
            nproc: k,
            stepsize: 0.1,
            max_stepsize: 1.0,
            stepsize_min: 1e-4,
            mciter: 50,
            etol: 1e-6,
            max_iter: 0,
            target_ratio: 0.5,
            seed: 42,
            dispatcher_endpoint: None,
            retry_max: 0,
            batch_timeout: None,
        }
    }

    #[tokio::test]
    async fn live_set_cardinality_is_constant() {
        let potential = HarmonicPotential::new(1);
        let replicas = initial_replicas(&potential, 20, 1);
        let dispatcher = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 50,
        });
        let mut engine = NestedSampling::new(replicas, dispatcher, &config(20, 2)).unwrap();
        for _ in 0..5 {
            engine.step().await.unwrap();
            assert_eq!(engine.live_set.len(), 20);
        }
    }

    #[tokio::test]
    async fn energy_spread_shrinks_over_iterations() {
        let potential = HarmonicPotential::new(1);
        let replicas = initial_replicas(&potential, 50, 2);
        let dispatcher = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 50,
        });
        let mut engine = NestedSampling::new(replicas, dispatcher, &config(50, 1)).unwrap();
        let spread_before = engine.energy_spread();
        for _ in 0..50 {
            engine.step().await.unwrap();
        }
        assert!(engine.energy_spread() < spread_before);
    }

    #[tokio::test]
    async fn invariant_violation_is_surfaced() {
        let replicas: Vec<Replica> = (0..10).map(|i| Replica::new(vec![i as f64], i as f64)).collect();
        let dispatcher = Arc::new(FaultyDispatcher);
        let mut engine = NestedSampling::new(replicas, dispatcher, &config(10, 2)).unwrap();
        let err = engine.step().await.unwrap_err();
        assert!(matches!(err, NsError::InvariantViolation { .. }));
    }

    #[tokio::test]
    async fn two_runs_with_the_same_seed_discard_identical_sequences() {
        let potential = HarmonicPotential::new(1);
        let replicas_a = initial_replicas(&potential, 30, 5);
        let replicas_b = initial_replicas(&potential, 30, 5);

        let dispatcher_a = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 40,
        });
        let dispatcher_b = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 40,
        });

        let cfg = config(30, 3);
        let mut engine_a = NestedSampling::new(replicas_a, dispatcher_a, &cfg).unwrap();
        let mut engine_b = NestedSampling::new(replicas_b, dispatcher_b, &cfg).unwrap();

        for _ in 0..10 {
            let outcome_a = engine_a.step().await.unwrap();
            let outcome_b = engine_b.step().await.unwrap();
            assert_eq!(outcome_a.discarded, outcome_b.discarded);
        }
    }
}
