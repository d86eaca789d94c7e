//! Listener setup and graceful shutdown.

use std::net::SocketAddr;

use thiserror::Error;
use tokio::net::TcpListener;

use super::{build_app_router, AppState};
use crate::services::ServerConfig;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("invalid listen address `{address}`: {source}")]
    InvalidListenAddr {
        address: String,
        #[source]
        source: std::net::AddrParseError,
    },
    #[error("failed to bind to {address}: {source}")]
    Bind {
        address: String,
        #[source]
        source: std::io::Error,
    },
    #[error("axum server error: {source}")]
    Serve {
        #[source]
        source: std::io::Error,
    },
}

pub async fn serve(config: &ServerConfig, state: AppState) -> Result<(), ServerError> {
    let addr = parse_listen_addr(&config.host, config.port)?;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| ServerError::Bind {
            address: addr.to_string(),
            source,
        })?;

    if !config.static_dir.is_dir() {
        tracing::warn!(dir = %config.static_dir.display(), "static frontend directory not found");
    }

    let app = build_app_router(state, &config.static_dir);
    tracing::info!("listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(wait_for_shutdown())
        .await
        .map_err(|source| ServerError::Serve { source })?;

    tracing::info!("server shutdown complete");
    Ok(())
}

fn parse_listen_addr(host: &str, port: u16) -> Result<SocketAddr, ServerError> {
    let address = format!("{}:{}", host.trim(), port);
    address
        .parse()
        .map_err(|source| ServerError::InvalidListenAddr { address, source })
}

async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            tracing::warn!(%error, "failed to capture Ctrl+C signal");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let sigterm = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut term) => {
                term.recv().await;
            }
            Err(error) => {
                tracing::warn!(%error, "failed to capture SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let sigterm = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = sigterm => tracing::info!("received SIGTERM, shutting down"),
    }
}
