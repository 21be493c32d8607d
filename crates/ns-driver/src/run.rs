use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use ns_core::NsError;
use ns_engine::NestedSampling;

use crate::output::EnergyTraceWriter;

/// Summary of a completed (or cancelled) run, for the driver's exit-code
/// decision.
#[derive(Debug)]
pub struct RunOutcome {
    /// Total iterations completed.
    pub iterations: u64,
    /// Whether the loop stopped due to cooperative cancellation rather
    /// than reaching `etol`/`max_iter`.
    pub cancelled: bool,
}

/// Drive `engine` to termination: `etol` reached, `max_iter` reached
/// (`0` = unlimited), or `cancelled` observed at an iteration boundary.
///
/// Every iteration's discarded energies are appended to `trace` and
/// flushed before the next iteration begins, so a crash mid-run leaves a
/// valid prefix.
pub async fn run(
    engine: &mut NestedSampling,
    etol: f64,
    max_iter: u64,
    cancelled: &Arc<AtomicBool>,
    trace: &mut EnergyTraceWriter,
) -> Result<RunOutcome, NsError> {
    loop {
        if cancelled.load(Ordering::SeqCst) {
            return Ok(RunOutcome {
                iterations: engine.iteration(),
                cancelled: true,
            });
        }
        if engine.etol_reached(etol) {
            break;
        }
        if max_iter != 0 && engine.iteration() >= max_iter {
            break;
        }

        let outcome = engine.step().await?;
        trace
            .append_iteration(&outcome.discarded)
            .map_err(|err| NsError::Configuration(format!("writing energy trace: {err:#}")))?;
    }

    Ok(RunOutcome {
        iterations: engine.iteration(),
        cancelled: false,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use ns_core::{rng_from_seed, EngineConfig, Potential, Replica, WalkJob, WalkResult};
    use ns_dispatch::WalkDispatcher;
    use ns_testkit::{HarmonicPotential, UniformStepKernel};
    use ns_walker::MonteCarloWalker;

    struct InlineDispatcher {
        potential: HarmonicPotential,
        kernel: UniformStepKernel,
        mciter: u64,
    }

    #[async_trait]
    impl WalkDispatcher for InlineDispatcher {
        async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError> {
            let accept_tests: Vec<Box<dyn ns_core::AcceptTest>> = Vec::new();
            let events: Vec<Box<dyn ns_core::Observer>> = Vec::new();
            let walker = MonteCarloWalker::new(&self.potential, &self.kernel, &accept_tests, &events);
            jobs.into_iter()
                .map(|job| {
                    let mut rng = rng_from_seed(job.seed_rng);
                    walker.walk(&job.seed, job.cutoff, job.stepsize, self.mciter, &mut rng)
                })
                .collect()
        }
    }

    fn temp_label(name: &str) -> String {
        let dir = std::env::temp_dir().join(format!("ns-driver-run-test-{}-{}", std::process::id(), name));
        std::fs::create_dir_all(&dir).unwrap();
        dir.join("run").to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn run_stops_at_max_iter_and_writes_trace() {
        let potential = HarmonicPotential::new(1);
        let mut rng = rng_from_seed(7);
        let replicas: Vec<Replica> = (0..20)
            .map(|_| {
                let x = potential.random_configuration(&mut rng);
                let e = potential.energy(&x).unwrap();
                Replica::new(x, e)
            })
            .collect();

        let dispatcher = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 30,
        });
        let config = EngineConfig {
            nproc: 2,
            stepsize: 0.2,
            max_stepsize: 1.0,
            stepsize_min: 1e-4,
            mciter: 30,
            etol: 0.0,
            max_iter: 5,
            target_ratio: 0.5,
            seed: 1,
            dispatcher_endpoint: None,
            retry_max: 0,
            batch_timeout: None,
        };
        let mut engine = NestedSampling::new(replicas, dispatcher, &config).unwrap();

        let label = temp_label("maxiter");
        let mut trace = EnergyTraceWriter::create(&label).unwrap();
        let cancelled = Arc::new(AtomicBool::new(false));

        let outcome = run(&mut engine, config.etol, config.max_iter, &cancelled, &mut trace)
            .await
            .unwrap();
        assert_eq!(outcome.iterations, 5);
        assert!(!outcome.cancelled);

        let contents = std::fs::read_to_string(format!("{label}.energies")).unwrap();
        assert_eq!(contents.lines().count(), 5 * config.nproc);
    }

    #[tokio::test]
    async fn run_stops_immediately_when_cancelled_up_front() {
        let potential = HarmonicPotential::new(1);
        let mut rng = rng_from_seed(3);
        let replicas: Vec<Replica> = (0..10)
            .map(|_| {
                let x = potential.random_configuration(&mut rng);
                let e = potential.energy(&x).unwrap();
                Replica::new(x, e)
            })
            .collect();
        let dispatcher = Arc::new(InlineDispatcher {
            potential: HarmonicPotential::new(1),
            kernel: UniformStepKernel,
            mciter: 10,
        });
        let config = EngineConfig {
            nproc: 1,
            stepsize: 0.1,
            max_stepsize: 1.0,
            stepsize_min: 1e-4,
            mciter: 10,
            etol: 0.0,
            max_iter: 0,
            target_ratio: 0.5,
            seed: 9,
            dispatcher_endpoint: None,
            retry_max: 0,
            batch_timeout: None,
        };
        let mut engine = NestedSampling::new(replicas, dispatcher, &config).unwrap();

        let label = temp_label("cancel");
        let mut trace = EnergyTraceWriter::create(&label).unwrap();
        let cancelled = Arc::new(AtomicBool::new(true));

        let outcome = run(&mut engine, config.etol, config.max_iter, &cancelled, &mut trace)
            .await
            .unwrap();
        assert!(outcome.cancelled);
        assert_eq!(outcome.iterations, 0);
    }
}
