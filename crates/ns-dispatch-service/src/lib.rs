#![forbid(unsafe_code)]
#![deny(unreachable_pub)]
#![deny(missing_docs)]

//! The remote dispatcher service: an HTTP server satisfying the wire
//! contract `RemoteDispatcher` speaks, plus the worker
//! registration/heartbeat surface.

mod app;
mod registry;

pub use app::{router, AppState};
pub use registry::{WorkerRegistry, WorkerState};

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use tokio::net::TcpListener;

/// Bind the service to `addr`, write the bound address to
/// `<state_dir>/dispatcher_uri.dat`, and serve until the process is
/// stopped.
///
/// The write-then-rename never leaves a half-written file for a
/// concurrently-starting client to read.
pub async fn serve(addr: SocketAddr, state_dir: &Path, state: Arc<AppState>) -> anyhow::Result<()> {
    let listener = TcpListener::bind(addr).await?;
    let bound = listener.local_addr()?;

    std::fs::create_dir_all(state_dir)?;
    let uri = format!("http://{bound}/");
    let tmp = state_dir.join("dispatcher_uri.dat.tmp");
    std::fs::write(&tmp, &uri)?;
    std::fs::rename(&tmp, state_dir.join("dispatcher_uri.dat"))?;

    tracing::info!(%bound, "dispatcher service listening");
    axum::serve(listener, router(state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use ns_dispatch::LocalDispatcher;
    use ns_testkit::{HarmonicPotential, UniformStepKernel};

    use super::*;

    #[tokio::test]
    async fn serve_writes_endpoint_file_and_answers_register() {
        let dir = std::env::temp_dir().join(format!(
            "ns-dispatch-service-test-{}-{}",
            std::process::id(),
            "serve"
        ));
        std::fs::create_dir_all(&dir).unwrap();

        let dispatcher = LocalDispatcher::new(
            Arc::new(HarmonicPotential::new(1)),
            Arc::new(UniformStepKernel),
            Arc::new(Vec::new()),
            Arc::new(Vec::new()),
            50,
            2,
        );
        let state = Arc::new(AppState::new(Arc::new(dispatcher)));

        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let serve_dir = dir.clone();
        tokio::spawn(async move {
            serve(addr, &serve_dir, state).await.unwrap();
        });

        let uri_path = dir.join("dispatcher_uri.dat");
        let endpoint = loop {
            if let Ok(contents) = std::fs::read_to_string(&uri_path) {
                break contents;
            }
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        };

        let client = reqwest::Client::new();
        let response = client
            .post(format!("{}workers/register", endpoint.trim()))
            .send()
            .await
            .unwrap();
        assert!(response.status().is_success());

        std::fs::remove_dir_all(&dir).ok();
    }
}
