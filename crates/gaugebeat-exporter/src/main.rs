//! gaugebeat exporter
//!
//! Resamples the configured gauges every `interval_seconds` and serves them on
//! `GET /metrics`. Takes no arguments; configured through `gaugebeat.yaml`
//! and `GAUGEBEAT_*` environment variables. Runs until Ctrl+C / SIGTERM.

use std::process::ExitCode;
use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{fmt, EnvFilter};

use gaugebeat_core::error::Result;
use gaugebeat_exporter::{app_state::AppState, config, sampler::UniformSampler, server};

#[tokio::main]
async fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    match run().await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(kind = e.kind().as_str(), error = %e, "gaugebeat-exporter failed");
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<()> {
    let cfg = config::load()?;
    let listen = cfg.exporter.listen_addr()?;
    let precision = cfg.exporter.precision;

    let state = AppState::new(cfg)?;
    let listener = server::bind(listen).await?;

    tracing::info!(%listen, "gaugebeat-exporter running on http://{listen}/metrics");

    let shutdown = CancellationToken::new();
    tokio::spawn(shutdown_signal(state.clone(), shutdown.clone()));

    server::serve(listener, state, Arc::new(UniformSampler::new(precision)), shutdown).await
}

async fn shutdown_signal(state: AppState, shutdown: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    tracing::info!("signal received, starting graceful shutdown");
    state.set_draining();
    shutdown.cancel();
}
