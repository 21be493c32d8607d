use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;

use ns_dispatch::LocalDispatcher;
use ns_dispatch_service::{serve, AppState};
use ns_testkit::{HarmonicPotential, UniformStepKernel};

/// Standalone remote dispatcher service. Demo-only: backs every batch
/// with the same illustrative `HarmonicPotential`/`UniformStepKernel`
/// pair `ns-cli` uses, so a `--dispatcher-endpoint` run reproduces a
/// local run with the same seed.
#[derive(Debug, Parser)]
#[command(name = "ns-dispatch-service", version)]
struct Args {
    /// Address to bind the HTTP service to.
    #[arg(long, default_value = "127.0.0.1:0")]
    bind: SocketAddr,

    /// Degrees of freedom of the demo potential.
    #[arg(long, default_value_t = 1)]
    ndof: usize,

    /// Size of the internal worker pool backing `/batches`.
    #[arg(long, default_value_t = 4)]
    nproc: usize,

    /// Trial moves per walk. Must match the client's `--nsteps`: the wire
    /// protocol carries `WalkJob`s, not `mciter`, so both sides agree on
    /// it out of band.
    #[arg(long, default_value_t = 200)]
    mciter: u64,

    /// Directory to write `dispatcher_uri.dat` into.
    #[arg(long, default_value = ".")]
    state_dir: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let args = Args::parse();

    let dispatcher = LocalDispatcher::new(
        Arc::new(HarmonicPotential::new(args.ndof)),
        Arc::new(UniformStepKernel),
        Arc::new(Vec::new()),
        Arc::new(Vec::new()),
        args.mciter,
        args.nproc,
    );
    let state = Arc::new(AppState::new(Arc::new(dispatcher)));

    serve(args.bind, &args.state_dir, state).await
}
