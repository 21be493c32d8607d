mod cli;
mod shutdown;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use clap::Parser;

use ns_core::{AcceptTest, NsError, Potential, Replica};
use ns_dispatch::{LocalDispatcher, RemoteDispatcher, WalkDispatcher};
use ns_driver::{run, write_final_replicas, EnergyTraceWriter};
use ns_engine::NestedSampling;
use ns_testkit::{BoxAcceptTest, HarmonicPotential, UniformStepKernel};

use crate::cli::{resolve, Cli, PotentialKind};
use crate::shutdown::{spawn_ctrl_c_handler, ShutdownController, ShutdownEvent};

#[tokio::main]
async fn main() {
    let exit_code = match run_cli().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(exit_code);
}

async fn run_cli() -> anyhow::Result<i32> {
    let cli = Cli::parse();
    let resolved = resolve(&cli)?;

    if let Some(bind) = resolved.metrics_bind {
        metrics_exporter_prometheus::PrometheusBuilder::new()
            .with_http_listener(bind)
            .install()?;
    }

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let potential = match resolved.potential {
        PotentialKind::Harmonic => HarmonicPotential::new(resolved.ndof),
    };

    let mut init_rng = ns_core::rng_from_seed(resolved.engine.seed);
    let replicas: Vec<Replica> = (0..resolved.nreplicas)
        .map(|_| {
            let x = potential.random_configuration(&mut init_rng);
            let e = potential.energy(&x)?;
            Ok::<_, NsError>(Replica::new(x, e))
        })
        .collect::<Result<_, _>>()?;

    let accept_tests: Vec<Box<dyn AcceptTest>> = match resolved.box_bound {
        Some(bound) => vec![Box::new(BoxAcceptTest::new(bound))],
        None => Vec::new(),
    };

    let dispatcher: Arc<dyn WalkDispatcher> = if let Some(endpoint) = &resolved.engine.dispatcher_endpoint {
        let url = reqwest::Url::parse(endpoint)?;
        Arc::new(RemoteDispatcher::new(
            url,
            resolved.engine.retry_max,
            resolved.engine.batch_timeout,
        ))
    } else {
        Arc::new(LocalDispatcher::new(
            Arc::new(potential),
            Arc::new(UniformStepKernel),
            Arc::new(accept_tests),
            Arc::new(Vec::new()),
            resolved.engine.mciter,
            resolved.engine.nproc,
        ))
    };

    let mut engine = NestedSampling::new(replicas, dispatcher, &resolved.engine)?;
    let mut trace = EnergyTraceWriter::create(&resolved.label)?;

    let cancelled = Arc::new(AtomicBool::new(false));
    let shutdown = Arc::new(ShutdownController::new());
    let (shutdown_tx, mut shutdown_rx) = tokio::sync::mpsc::unbounded_channel::<ShutdownEvent>();
    spawn_ctrl_c_handler(shutdown.clone(), shutdown_tx);

    let cancelled_for_watcher = cancelled.clone();
    tokio::spawn(async move {
        while let Some(event) = shutdown_rx.recv().await {
            match event {
                ShutdownEvent::Graceful => {
                    tracing::info!("stop requested, finishing current iteration before exiting");
                    cancelled_for_watcher.store(true, Ordering::SeqCst);
                }
                ShutdownEvent::Immediate => {
                    tracing::warn!("stop requested again, exiting immediately");
                    std::process::exit(130);
                }
            }
        }
    });

    let outcome = run(
        &mut engine,
        resolved.engine.etol,
        resolved.engine.max_iter,
        &cancelled,
        &mut trace,
    )
    .await;

    write_final_replicas(&resolved.label, engine.live_energies())?;

    match outcome {
        Ok(run_outcome) => {
            tracing::info!(
                iterations = run_outcome.iterations,
                cancelled = run_outcome.cancelled,
                "run complete"
            );
            Ok(0)
        }
        Err(err) => {
            tracing::error!(error = %err, "run failed");
            Ok(err.exit_code())
        }
    }
}
