use serde::{Deserialize, Serialize};

/// One sample: a configuration and its energy.
///
/// Immutable once constructed. Cloning a `Replica` deep-copies the
/// coordinate vector so live-set replicas never alias each other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Replica {
    /// Configuration coordinates, length `ndof`.
    pub x: Vec<f64>,
    /// Energy at `x`, consistent with `potential.energy(x)` within
    /// numerical tolerance at construction time.
    pub e: f64,
}

impl Replica {
    /// Construct a replica from coordinates and their energy.
    pub fn new(x: Vec<f64>, e: f64) -> Self {
        Self { x, e }
    }

    /// Number of degrees of freedom.
    pub fn ndof(&self) -> usize {
        self.x.len()
    }
}
