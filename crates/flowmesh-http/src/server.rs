//! Listener and graceful shutdown

use flowmesh_core::FlowEngine;
use std::sync::Arc;
use tokio::{net::TcpListener, signal};
use tracing::{error, info};

use crate::{config::HttpServerConfig, router::router};

/// Errors that stop the server
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Mesh(#[from] flowmesh_core::MeshError),
}

/// Serve `engine` until SIGINT/SIGTERM, then shut the engine down
pub async fn serve(engine: Arc<FlowEngine>, config: HttpServerConfig) -> Result<(), ServerError> {
    let addr = config.socket_addr()?;
    let listener = TcpListener::bind(addr).await?;
    info!(address = %listener.local_addr()?, "Flowmesh HTTP adapter listening");

    let app = router(Arc::clone(&engine), &config);
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    engine.shutdown().await?;
    info!("Server stopped");
    Ok(())
}

/// Completes on SIGINT (Ctrl+C) or, on unix, SIGTERM
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received SIGINT (Ctrl+C), initiating graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        },
    }
}
