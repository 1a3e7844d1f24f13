//! Daemon Lifecycle Management
//!
//! Handles daemon startup and shutdown.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::signal;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::config::Config;

use super::actions::CollaborationActions;
use super::http::HttpServer;
use super::index_manager::{IndexManager, COLLABORATIONS_INDEX_NAME};

const SHUTDOWN_GRACE: Duration = Duration::from_secs(5);

/// Daemon instance managing all components
pub struct Daemon {
    config: Config,
    actions: CollaborationActions,
    shutdown_tx: broadcast::Sender<()>,
}

impl Daemon {
    /// Build the store client, index manager and actions from `config`.
    ///
    /// No store calls are made here; the index is provisioned on first write.
    pub async fn start(config: Config) -> Result<Self> {
        info!("Starting collabd");

        let index_manager = Arc::new(
            IndexManager::from_config(&config.store).context("Failed to create index manager")?,
        );
        let actions = CollaborationActions::new(index_manager);

        let (shutdown_tx, _) = broadcast::channel(16);

        info!("Daemon initialized");
        info!(
            "Collaboration objects stored in index {} (timeout {}ms)",
            COLLABORATIONS_INDEX_NAME, config.store.operation_timeout_ms
        );

        Ok(Self {
            config,
            actions,
            shutdown_tx,
        })
    }

    /// Run the daemon until Ctrl+C, SIGTERM or [`Daemon::shutdown_handle`] fires
    pub async fn run(&self) -> Result<()> {
        info!("Daemon running");

        let shutdown_rx = self.shutdown_tx.subscribe();

        let http_server = HttpServer::new(
            self.config.http.clone(),
            &self.config.auth,
            self.actions.clone(),
        );
        let shutdown_rx_http = self.shutdown_tx.subscribe();
        info!("Starting HTTP API server on: {}", self.config.http.listen_addr);
        let mut http_handle = tokio::spawn(async move {
            match http_server.run(shutdown_rx_http).await {
                Ok(()) => info!("HTTP server shut down cleanly"),
                Err(e) => error!("HTTP server failed: {:#}", e),
            }
        });

        // Wait for shutdown signal (Ctrl+C, SIGTERM, or the server exiting on its own)
        let server_exited = tokio::select! {
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
                false
            }
            _ = Self::wait_for_sigterm() => {
                info!("Received SIGTERM, shutting down");
                false
            }
            _ = Self::wait_for_shutdown(shutdown_rx) => {
                info!("Shutdown requested");
                false
            }
            _ = &mut http_handle => true,
        };

        let _ = self.shutdown_tx.send(());

        if server_exited {
            anyhow::bail!("HTTP server exited unexpectedly");
        }

        let http_abort = http_handle.abort_handle();
        if tokio::time::timeout(SHUTDOWN_GRACE, http_handle).await.is_err() {
            warn!("HTTP server did not shut down within {:?}, aborting", SHUTDOWN_GRACE);
            http_abort.abort();
        }

        info!("Daemon shutdown complete");
        Ok(())
    }

    /// Sender that stops [`Daemon::run`] when signalled
    pub fn shutdown_handle(&self) -> broadcast::Sender<()> {
        self.shutdown_tx.clone()
    }

    pub fn actions(&self) -> &CollaborationActions {
        &self.actions
    }

    /// Wait for SIGTERM signal
    #[cfg(unix)]
    async fn wait_for_sigterm() {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!("Failed to register SIGTERM handler: {}. Falling back to pending future.", e);
                std::future::pending::<()>().await;
            }
        }
    }

    #[cfg(not(unix))]
    async fn wait_for_sigterm() {
        std::future::pending::<()>().await
    }

    async fn wait_for_shutdown(mut rx: broadcast::Receiver<()>) {
        let _ = rx.recv().await;
    }
}
