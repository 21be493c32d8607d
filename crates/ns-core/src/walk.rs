use serde::{Deserialize, Serialize};

use crate::Replica;

/// A unit of work handed from the engine to a single dispatcher worker.
///
/// Created by the engine, consumed by exactly one worker, then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkJob {
    /// The replica to clone and evolve.
    pub seed: Replica,
    /// Upper energy bound the walk must stay below.
    pub cutoff: f64,
    /// Current adaptive step size to use for the whole walk.
    pub stepsize: f64,
    /// Deterministic RNG seed for this walk, derived from the engine's
    /// master RNG.
    pub seed_rng: u64,
}

/// The outcome of running one `WalkJob` to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalkResult {
    /// The evolved replica; `e < cutoff` unless zero trials were accepted.
    pub replica: Replica,
    /// Number of accepted trial moves.
    pub n_accept: u64,
    /// Number of trials rejected for any reason.
    pub n_reject: u64,
    /// Of the rejected trials, how many failed the energy cutoff test.
    pub n_cutoff_reject: u64,
    /// Of the rejected trials, how many failed a configuration test.
    pub n_test_reject: u64,
}

impl WalkResult {
    /// Total number of trial moves attempted (`n_accept + n_reject`).
    pub fn n_trials(&self) -> u64 {
        self.n_accept + self.n_reject
    }
}

/// Per-iteration (or rolling-window) step-size adaptation state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AdaptiveState {
    /// Current step size, always within `[stepsize_min, max_stepsize]`.
    pub stepsize: f64,
    /// Cumulative accepted trials feeding the adaptation.
    pub accept_total: u64,
    /// Cumulative trials (accepted + rejected) feeding the adaptation.
    pub trial_total: u64,
}

impl AdaptiveState {
    /// Observed acceptance ratio, or `0.0` if no trials have run yet.
    pub fn ratio(&self) -> f64 {
        if self.trial_total == 0 {
            0.0
        } else {
            self.accept_total as f64 / self.trial_total as f64
        }
    }
}
