pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod models;
pub mod service;
pub mod state;
pub mod telemetry;

use std::sync::Arc;

use anyhow::Context;
use auth::RemoteTokenVerifier;
use tokio::net::TcpListener;
use tracing::{info, warn};

pub use config::BrokerConfig;
pub use service::{KeyError, KeyService};
pub use state::AppState;
pub use telemetry::CorrelationId;

pub async fn run(config: BrokerConfig) -> anyhow::Result<()> {
    let state = build_state(&config).await?;

    let http_listener = TcpListener::bind(config.http_addr).await.with_context(|| {
        format!(
            "failed to bind http listener on {addr}",
            addr = config.http_addr
        )
    })?;

    let http_addr = http_listener.local_addr()?;
    info!(%http_addr, audience = %config.auth.audience, "http server listening");

    axum::serve(http_listener, http::router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("http server failed")?;

    info!("http server stopped");
    Ok(())
}

pub async fn build_state(config: &BrokerConfig) -> anyhow::Result<AppState> {
    let verifier = RemoteTokenVerifier::from_config(&config.auth)?;
    let store = config::load_store(&config.store).await?;
    Ok(AppState::new(KeyService::new(Arc::new(verifier), store)))
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            warn!(?err, "failed to install ctrl-c handler");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => warn!(?err, "failed to install sigterm handler"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
