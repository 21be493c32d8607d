use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Engine construction options.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Number of parallel workers; also `K`, the number of replicas
    /// replaced per iteration.
    pub nproc: usize,
    /// Initial Monte Carlo step size; must be `> 0`.
    pub stepsize: f64,
    /// Upper clamp for the adaptive step size; must be `>= stepsize`.
    pub max_stepsize: f64,
    /// Lower clamp for the adaptive step size. Defaults to `0.0`.
    #[serde(default)]
    pub stepsize_min: f64,
    /// Number of trial moves per walk.
    pub mciter: u64,
    /// Termination tolerance: stop when `E_max_live - E_min_live < etol`.
    #[serde(default)]
    pub etol: f64,
    /// Maximum iteration count; `0` means unlimited.
    #[serde(default)]
    pub max_iter: u64,
    /// Target acceptance ratio the step-size adaptation converges toward.
    #[serde(default = "default_target_ratio")]
    pub target_ratio: f64,
    /// Master RNG seed.
    pub seed: u64,
    /// When set, run walks via a remote dispatcher service reachable at
    /// this endpoint instead of the local thread pool.
    #[serde(default)]
    pub dispatcher_endpoint: Option<String>,
    /// Bounded number of transport retries before a remote batch fails
    /// fatally. Default `0` (no retries).
    #[serde(default)]
    pub retry_max: u32,
    /// Per-batch wall-clock timeout for the dispatcher. `None` disables
    /// the timeout.
    #[serde(default)]
    pub batch_timeout: Option<std::time::Duration>,
}

fn default_target_ratio() -> f64 {
    0.5
}

impl EngineConfig {
    /// Validate configuration-error conditions. Invalid `N` is checked by
    /// the driver once the live set size is known, but the purely-local
    /// invariants are checked here.
    pub fn validate(&self, n_replicas: usize) -> Result<(), crate::NsError> {
        if self.nproc < 1 {
            return Err(crate::NsError::Configuration(
                "nproc must be >= 1".to_string(),
            ));
        }
        if n_replicas == 0 || self.nproc >= n_replicas {
            return Err(crate::NsError::Configuration(format!(
                "K (nproc={}) must satisfy 1 <= K < N (N={})",
                self.nproc, n_replicas
            )));
        }
        if !(self.stepsize > 0.0) {
            return Err(crate::NsError::Configuration(
                "stepsize must be > 0".to_string(),
            ));
        }
        if self.max_stepsize < self.stepsize {
            return Err(crate::NsError::Configuration(
                "max_stepsize must be >= stepsize".to_string(),
            ));
        }
        if self.mciter < 1 {
            return Err(crate::NsError::Configuration(
                "mciter must be >= 1".to_string(),
            ));
        }
        if !(self.target_ratio > 0.0 && self.target_ratio < 1.0) {
            return Err(crate::NsError::Configuration(
                "target_ratio must be in (0, 1)".to_string(),
            ));
        }
        if self.dispatcher_endpoint.is_none() {
            // Local mode: nothing further to validate here; `nproc`
            // already bounds the thread pool size.
        }
        Ok(())
    }
}


/// Where to find the remote dispatcher service's endpoint, for CLI/driver
/// wiring.
#[derive(Debug, Clone)]
pub enum DispatcherEndpointSource {
    /// Endpoint given directly on the command line / config file.
    Literal(String),
    /// Read the endpoint from a file (`dispatcher_uri.dat` by convention).
    File(PathBuf),
}

impl DispatcherEndpointSource {
    /// Resolve to the endpoint string, reading the file if this is a
    /// `File` source.
    pub fn resolve(&self) -> Result<String, crate::NsError> {
        match self {
            DispatcherEndpointSource::Literal(endpoint) => Ok(endpoint.clone()),
            DispatcherEndpointSource::File(path) => std::fs::read_to_string(path)
                .map(|s| s.trim().to_string())
                .map_err(|err| {
                    crate::NsError::Configuration(format!(
                        "reading dispatcher endpoint file {}: {err}",
                        path.display()
                    ))
                }),
        }
    }
}
