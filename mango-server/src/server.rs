//! Server lifecycle: engine construction, serving and graceful shutdown.

use crate::config::ServerConfig;
use crate::routes::{router, AppState};
use anyhow::Context;
use mango_crypto::{CipherEngine, EncryptionKey};
use mango_storage::{DocumentStore, DuckDbStore};
use mango_vault::{OpContext, VaultEngine};
use std::future::{Future, IntoFuture};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{info, warn};

/// Opens the configured store and builds the vault engine over it.
pub async fn build_engine(config: &ServerConfig, key: EncryptionKey) -> anyhow::Result<VaultEngine> {
    let store = DuckDbStore::open(&config.db_path, &config.collection).with_context(|| {
        format!(
            "failed to open credential store at {}",
            config.db_path.display()
        )
    })?;
    let store: Arc<dyn DocumentStore> = Arc::new(store);
    let cipher = CipherEngine::new(key);

    if config.site_index {
        let ctx = OpContext::with_timeout(config.request_timeout());
        VaultEngine::with_site_index(cipher, store, &ctx)
            .await
            .context("failed to prime site index")
    } else {
        Ok(VaultEngine::new(cipher, store))
    }
}

/// Serves `state` on `listener` until `shutdown` resolves, then gives
/// in-flight requests up to `shutdown_timeout` to finish.
pub async fn run(
    listener: TcpListener,
    state: AppState,
    shutdown_timeout: Duration,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let (signalled_tx, signalled_rx) = oneshot::channel::<()>();
    let server = axum::serve(listener, router(state)).with_graceful_shutdown(async move {
        shutdown.await;
        info!("shutting down server");
        let _ = signalled_tx.send(());
    });
    let mut server = std::pin::pin!(server.into_future());

    tokio::select! {
        result = &mut server => return result.context("server error"),
        _ = signalled_rx => {}
    }

    match tokio::time::timeout(shutdown_timeout, server).await {
        Ok(result) => result.context("server error during shutdown"),
        Err(_) => {
            warn!(
                timeout_secs = shutdown_timeout.as_secs(),
                "graceful shutdown timed out, dropping open connections"
            );
            Ok(())
        }
    }
}

/// Resolves on Ctrl-C, or SIGTERM on unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to listen for ctrl-c");
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
                warn!(error = %e, "failed to listen for SIGTERM");
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
}
