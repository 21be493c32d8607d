use serde::{Deserialize, Serialize};

use ns_core::{WalkJob, WalkResult};

/// Request body for `POST /batches`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchRequest {
    /// Caller-assigned identifier for this batch, for server-side logging.
    pub batch_id: u64,
    /// The jobs to run, in the order results must come back in.
    pub jobs: Vec<WalkJob>,
}

/// Response body for `POST /batches`.
#[derive(Debug, Serialize, Deserialize)]
pub struct BatchResponse {
    /// Results in the same order as `BatchRequest::jobs`.
    pub results: Vec<WalkResult>,
}
