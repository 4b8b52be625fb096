//! Listener setup and the serve loop.
//!
//! `serve` runs the HTTP server and the publish loop side by side. Whichever
//! ends first stops the other. The publish loop only ends cleanly once
//! `shutdown` is cancelled; any other exit, including a panic, turns into an
//! `Internal` error.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::task::JoinError;
use tokio_util::sync::CancellationToken;

use gaugebeat_core::error::{GaugebeatError, Result};

use crate::app_state::AppState;
use crate::router;
use crate::sampler::SampleGenerator;

/// Bind the metrics listener. A taken port surfaces as `Bind`.
pub async fn bind(addr: SocketAddr) -> Result<TcpListener> {
    TcpListener::bind(addr).await.map_err(|e| GaugebeatError::Bind {
        addr: addr.to_string(),
        reason: e.to_string(),
    })
}

/// Serve `/metrics` and run the publish loop until `shutdown` fires or either side fails.
pub async fn serve(
    listener: TcpListener,
    state: AppState,
    sampler: Arc<dyn SampleGenerator>,
    shutdown: CancellationToken,
) -> Result<()> {
    let publisher = state.publish_loop(sampler);
    let mut publish_task = {
        let token = shutdown.clone();
        tokio::spawn(async move { publisher.run(token).await })
    };

    let app = router::build_router(state.clone());
    let mut server_task = {
        let token = shutdown.clone();
        tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async move { token.cancelled().await })
                .await
        })
    };

    tokio::select! {
        joined = &mut publish_task => {
            let requested = shutdown.is_cancelled();
            state.set_draining();
            shutdown.cancel();
            let served = server_task.await;

            match joined {
                Err(e) => {
                    tracing::error!(error = %e, "publish loop crashed, shutting down");
                    return Err(GaugebeatError::Internal(format!("publish loop failed: {e}")));
                }
                Ok(()) if !requested => {
                    return Err(GaugebeatError::Internal(
                        "publish loop exited before shutdown was requested".into(),
                    ));
                }
                Ok(()) => {}
            }
            server_result(served)
        }
        served = &mut server_task => {
            state.set_draining();
            shutdown.cancel();
            let joined = publish_task.await;

            server_result(served)?;
            joined.map_err(|e| GaugebeatError::Internal(format!("publish loop failed: {e}")))
        }
    }
}

fn server_result(served: std::result::Result<std::io::Result<()>, JoinError>) -> Result<()> {
    match served {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(GaugebeatError::Internal(format!("server failed: {e}"))),
        Err(e) => Err(GaugebeatError::Internal(format!("server task failed: {e}"))),
    }
}
