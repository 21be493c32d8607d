use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use ns_core::{AcceptTest, NsError, Observer, Potential, StepKernel, WalkJob, WalkResult, rng_from_seed};
use ns_walker::MonteCarloWalker;

use crate::WalkDispatcher;

/// A fixed-size in-process worker pool.
///
/// Walks are CPU-bound, so each job runs inside `tokio::task::spawn_blocking`
/// rather than on the async executor's own worker threads. A semaphore of
/// `nproc` permits keeps the number of concurrently-running walks bounded
/// to the configured pool size — work-conserving, since a permit is
/// released the instant a walk finishes and the next queued job picks it
/// up.
pub struct LocalDispatcher {
    potential: Arc<dyn Potential>,
    step_kernel: Arc<dyn StepKernel>,
    accept_tests: Arc<Vec<Box<dyn AcceptTest>>>,
    events: Arc<Vec<Box<dyn Observer>>>,
    mciter: u64,
    permits: Arc<Semaphore>,
}

impl LocalDispatcher {
    /// Construct a local dispatcher with the given worker-pool size.
    pub fn new(
        potential: Arc<dyn Potential>,
        step_kernel: Arc<dyn StepKernel>,
        accept_tests: Arc<Vec<Box<dyn AcceptTest>>>,
        events: Arc<Vec<Box<dyn Observer>>>,
        mciter: u64,
        nproc: usize,
    ) -> Self {
        Self {
            potential,
            step_kernel,
            accept_tests,
            events,
            mciter,
            permits: Arc::new(Semaphore::new(nproc.max(1))),
        }
    }
}

#[async_trait]
impl WalkDispatcher for LocalDispatcher {
    async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError> {
        let n = jobs.len();
        let mut set = JoinSet::new();

        for (idx, job) in jobs.into_iter().enumerate() {
            let potential = self.potential.clone();
            let step_kernel = self.step_kernel.clone();
            let accept_tests = self.accept_tests.clone();
            let events = self.events.clone();
            let mciter = self.mciter;
            let permits = self.permits.clone();

            set.spawn(async move {
                let _permit = permits
                    .acquire_owned()
                    .await
                    .expect("semaphore is never closed");

                tokio::task::spawn_blocking(move || {
                    let mut rng = rng_from_seed(job.seed_rng);
                    let walker = MonteCarloWalker::new(
                        potential.as_ref(),
                        step_kernel.as_ref(),
                        &accept_tests,
                        &events,
                    );
                    let result = walker.walk(&job.seed, job.cutoff, job.stepsize, mciter, &mut rng);
                    (idx, result)
                })
                .await
                .map_err(|err| NsError::Potential {
                    x: Vec::new(),
                    message: format!("worker task join error: {err}"),
                })
            });
        }

        let mut results: Vec<Option<WalkResult>> = (0..n).map(|_| None).collect();
        while let Some(joined) = set.join_next().await {
            let (idx, result) = match joined {
                Ok(inner) => inner?,
                Err(err) => {
                    return Err(NsError::Potential {
                        x: Vec::new(),
                        message: format!("dispatcher task panicked: {err}"),
                    });
                }
            };
            results[idx] = Some(result?);
        }

        Ok(results
            .into_iter()
            .map(|r| r.expect("every index was populated by a join"))
            .collect())
    }
}
