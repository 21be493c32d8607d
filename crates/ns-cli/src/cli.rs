use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use clap::{Parser, ValueEnum};
use serde::Deserialize;

use ns_core::{DispatcherEndpointSource, EngineConfig, NsError};

fn default_nprocs() -> usize {
    std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1)
}

fn parse_seconds(input: &str) -> Result<Duration, String> {
    let secs: f64 = input
        .parse()
        .map_err(|_| format!("invalid duration in seconds: {input:?}"))?;
    if !(secs > 0.0) {
        return Err("duration must be > 0".to_string());
    }
    Ok(Duration::from_secs_f64(secs))
}

/// Which illustrative potential to run. The concrete potential is an
/// external collaborator; this CLI only wires up the demo implementations
/// in `ns-testkit`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PotentialKind {
    /// `energy(x) = 0.5 * |x|^2`.
    Harmonic,
}

/// Command-line options for a nested-sampling run, layered over an
/// optional config file.
#[derive(Debug, Clone, Parser)]
#[command(name = "ns-cli", version, about = "Nested sampling Monte Carlo engine")]
pub struct Cli {
    /// TOML config file; CLI flags override values it sets.
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of live replicas (`N`).
    #[arg(long)]
    pub nreplicas: Option<usize>,

    /// Degrees of freedom per replica.
    #[arg(long)]
    pub ndof: Option<usize>,

    /// Worker pool size; also `K`, replicas replaced per iteration.
    #[arg(long = "nprocs")]
    pub nprocs: Option<usize>,

    /// Trial moves per walk.
    #[arg(long = "nsteps")]
    pub mciter: Option<u64>,

    /// Initial Monte Carlo step size.
    #[arg(long)]
    pub stepsize: Option<f64>,

    /// Upper clamp for the adaptive step size.
    #[arg(long)]
    pub max_stepsize: Option<f64>,

    /// Lower clamp for the adaptive step size.
    #[arg(long)]
    pub stepsize_min: Option<f64>,

    /// Termination tolerance on the live-set energy spread.
    #[arg(long)]
    pub etol: Option<f64>,

    /// Maximum iteration count; `0` means unlimited.
    #[arg(long)]
    pub max_iter: Option<u64>,

    /// Target acceptance ratio for step-size adaptation.
    #[arg(long)]
    pub target_ratio: Option<f64>,

    /// Master RNG seed.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Run walks via a remote dispatcher service at this endpoint instead
    /// of the local thread pool.
    #[arg(long, conflicts_with = "dispatcher_endpoint_file")]
    pub dispatcher_endpoint: Option<String>,

    /// Read the dispatcher endpoint from a file (`dispatcher_uri.dat`
    /// convention).
    #[arg(long)]
    pub dispatcher_endpoint_file: Option<PathBuf>,

    /// Bounded number of remote-dispatcher transport retries.
    #[arg(long)]
    pub retry_max: Option<u32>,

    /// Per-batch wall-clock timeout for the remote dispatcher, in seconds.
    #[arg(long, value_parser = parse_seconds)]
    pub batch_timeout: Option<Duration>,

    /// Illustrative potential to run against.
    #[arg(long, value_enum, default_value_t = PotentialKind::Harmonic)]
    pub potential: PotentialKind,

    /// `‖x‖∞ < bound` accept test. Omit to run unconstrained.
    #[arg(long)]
    pub box_bound: Option<f64>,

    /// Output file stem: writes `<label>.energies` and
    /// `<label>.replicas_final`.
    #[arg(long, default_value = "ns")]
    pub label: String,

    /// Bind a Prometheus exporter here and install the `metrics` recorder.
    /// Omit to run with no metrics recorder installed (the library crates
    /// still emit through the facade; nothing records it).
    #[arg(long)]
    pub metrics_bind: Option<SocketAddr>,
}

#[derive(Debug, Clone, Default, Deserialize)]
struct FileConfig {
    nreplicas: Option<usize>,
    ndof: Option<usize>,
    nprocs: Option<usize>,
    mciter: Option<u64>,
    stepsize: Option<f64>,
    max_stepsize: Option<f64>,
    stepsize_min: Option<f64>,
    etol: Option<f64>,
    max_iter: Option<u64>,
    target_ratio: Option<f64>,
    seed: Option<u64>,
    dispatcher_endpoint: Option<String>,
    retry_max: Option<u32>,
    batch_timeout_secs: Option<f64>,
}

impl FileConfig {
    fn load(path: &Path) -> Result<Self, NsError> {
        let raw = std::fs::read_to_string(path)
            .map_err(|err| NsError::Configuration(format!("reading config file {}: {err}", path.display())))?;
        toml::from_str(&raw)
            .map_err(|err| NsError::Configuration(format!("parsing config file {}: {err}", path.display())))
    }
}

/// Everything the driver needs beyond `EngineConfig` itself: the live-set
/// size, degrees of freedom, and frontend wiring choices.
pub struct ResolvedRun {
    /// Number of live replicas.
    pub nreplicas: usize,
    /// Degrees of freedom per replica.
    pub ndof: usize,
    /// Engine construction options.
    pub engine: EngineConfig,
    /// Which demo potential to run.
    pub potential: PotentialKind,
    /// Optional box accept-test bound.
    pub box_bound: Option<f64>,
    /// Output file stem.
    pub label: String,
    /// Prometheus exporter bind address, if any.
    pub metrics_bind: Option<SocketAddr>,
}

/// Merge `cli` over an optional config file, CLI flags taking precedence.
pub fn resolve(cli: &Cli) -> Result<ResolvedRun, NsError> {
    let file = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    let nreplicas = cli.nreplicas.or(file.nreplicas).ok_or_else(|| {
        NsError::Configuration("nreplicas is required (--nreplicas or config file)".to_string())
    })?;
    let ndof = cli
        .ndof
        .or(file.ndof)
        .ok_or_else(|| NsError::Configuration("ndof is required (--ndof or config file)".to_string()))?;
    let seed = cli
        .seed
        .or(file.seed)
        .ok_or_else(|| NsError::Configuration("seed is required (--seed or config file)".to_string()))?;

    let nprocs = cli.nprocs.or(file.nprocs).unwrap_or_else(default_nprocs);
    let stepsize = cli.stepsize.or(file.stepsize).unwrap_or(0.1);
    let max_stepsize = cli.max_stepsize.or(file.max_stepsize).unwrap_or_else(|| stepsize.max(1.0));
    let stepsize_min = cli.stepsize_min.or(file.stepsize_min).unwrap_or(0.0);
    let mciter = cli.mciter.or(file.mciter).unwrap_or(200);
    let etol = cli.etol.or(file.etol).unwrap_or(0.0);
    let max_iter = cli.max_iter.or(file.max_iter).unwrap_or(0);
    let target_ratio = cli.target_ratio.or(file.target_ratio).unwrap_or(0.5);
    let dispatcher_endpoint = match (&cli.dispatcher_endpoint, &cli.dispatcher_endpoint_file) {
        (Some(endpoint), _) => Some(DispatcherEndpointSource::Literal(endpoint.clone()).resolve()?),
        (None, Some(path)) => Some(DispatcherEndpointSource::File(path.clone()).resolve()?),
        (None, None) => file.dispatcher_endpoint,
    };
    let retry_max = cli.retry_max.or(file.retry_max).unwrap_or(0);
    let batch_timeout = cli
        .batch_timeout
        .or_else(|| file.batch_timeout_secs.map(Duration::from_secs_f64));

    let engine = EngineConfig {
        nproc: nprocs,
        stepsize,
        max_stepsize,
        stepsize_min,
        mciter,
        etol,
        max_iter,
        target_ratio,
        seed,
        dispatcher_endpoint,
        retry_max,
        batch_timeout,
    };
    engine.validate(nreplicas)?;

    Ok(ResolvedRun {
        nreplicas,
        ndof,
        engine,
        potential: cli.potential,
        box_bound: cli.box_bound,
        label: cli.label.clone(),
        metrics_bind: cli.metrics_bind,
    })
}
