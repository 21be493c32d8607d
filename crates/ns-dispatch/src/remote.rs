use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Url};

use ns_core::{NsError, WalkJob, WalkResult};

use crate::wire::{BatchRequest, BatchResponse};
use crate::WalkDispatcher;

/// Client of a dispatcher service reachable over HTTP.
///
/// A transport failure is retried up to `retry_max` times before being
/// surfaced as `NsError::Transport`, and the whole call is wrapped in a
/// deadline when `batch_timeout` is set.
pub struct RemoteDispatcher {
    client: Client,
    endpoint: Url,
    retry_max: u32,
    batch_timeout: Option<Duration>,
}

impl RemoteDispatcher {
    /// Construct a client targeting the dispatcher service at `endpoint`.
    pub fn new(endpoint: Url, retry_max: u32, batch_timeout: Option<Duration>) -> Self {
        Self {
            client: Client::new(),
            endpoint,
            retry_max,
            batch_timeout,
        }
    }

    async fn post_batch(&self, batch_id: u64, jobs: &[WalkJob]) -> Result<BatchResponse, NsError> {
        let url = self
            .endpoint
            .join("batches")
            .map_err(|err| NsError::Configuration(format!("invalid dispatcher endpoint: {err}")))?;

        let request = BatchRequest {
            batch_id,
            jobs: jobs.to_vec(),
        };

        let response = self
            .client
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|err| NsError::Transport {
                attempts: 1,
                message: err.to_string(),
            })?;

        let response = response.error_for_status().map_err(|err| NsError::Transport {
            attempts: 1,
            message: err.to_string(),
        })?;

        response
            .json::<BatchResponse>()
            .await
            .map_err(|err| NsError::Transport {
                attempts: 1,
                message: format!("malformed batch response: {err}"),
            })
    }

    async fn run_with_retry(&self, batch_id: u64, jobs: &[WalkJob]) -> Result<BatchResponse, NsError> {
        let mut attempts = 0u32;
        loop {
            attempts += 1;
            match self.post_batch(batch_id, jobs).await {
                Ok(response) => return Ok(response),
                Err(err) if attempts > self.retry_max => {
                    return Err(match err {
                        NsError::Transport { message, .. } => NsError::Transport { attempts, message },
                        other => other,
                    });
                }
                Err(_) => continue,
            }
        }
    }
}

#[async_trait]
impl WalkDispatcher for RemoteDispatcher {
    async fn run_batch(&self, jobs: Vec<WalkJob>) -> Result<Vec<WalkResult>, NsError> {
        if jobs.is_empty() {
            return Ok(Vec::new());
        }
        let batch_id = 0;
        let call = self.run_with_retry(batch_id, &jobs);

        let response = match self.batch_timeout {
            Some(deadline) => tokio::time::timeout(deadline, call)
                .await
                .map_err(|_| NsError::Timeout(deadline))??,
            None => call.await?,
        };

        if response.results.len() != jobs.len() {
            return Err(NsError::Transport {
                attempts: 1,
                message: format!(
                    "dispatcher returned {} results for {} jobs",
                    response.results.len(),
                    jobs.len()
                ),
            });
        }

        Ok(response.results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ns_core::Replica;

    fn job() -> WalkJob {
        WalkJob {
            seed: Replica::new(vec![0.0], 0.0),
            cutoff: 1.0,
            stepsize: 0.2,
            seed_rng: 1,
        }
    }

    #[tokio::test]
    async fn empty_batch_short_circuits() {
        let dispatcher = RemoteDispatcher::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            0,
            None,
        );
        let results = dispatcher.run_batch(Vec::new()).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn unreachable_endpoint_is_transport_error_after_retries() {
        let dispatcher = RemoteDispatcher::new(
            Url::parse("http://127.0.0.1:1").unwrap(),
            2,
            None,
        );
        let err = dispatcher.run_batch(vec![job()]).await.unwrap_err();
        match err {
            NsError::Transport { attempts, .. } => assert_eq!(attempts, 3),
            other => panic!("expected Transport, got {other:?}"),
        }
    }
}
