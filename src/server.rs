//! HTTPS server for the admission webhook

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use axum_server::tls_rustls::RustlsConfig;
use axum_server::Handle;
use tracing::{info, warn};

use crate::webhook::{webhook_router, WebhookState};
use crate::{Error, Result};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address to bind the server
    pub addr: SocketAddr,
    /// Serving certificate PEM file
    pub cert_file: PathBuf,
    /// Serving private key PEM file
    pub key_file: PathBuf,
    /// How long in-flight admissions may take to finish after a shutdown signal
    pub shutdown_grace: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        let cert_dir = PathBuf::from(crate::DEFAULT_CERT_DIR);
        Self {
            addr: SocketAddr::from(([0, 0, 0, 0], crate::DEFAULT_WEBHOOK_PORT)),
            cert_file: cert_dir.join("tls.crt"),
            key_file: cert_dir.join("tls.key"),
            shutdown_grace: Duration::from_secs(10),
        }
    }
}

/// Serve the webhook until SIGINT/SIGTERM
pub async fn start_server(config: ServerConfig, state: Arc<WebhookState>) -> Result<()> {
    let tls_config = RustlsConfig::from_pem_file(&config.cert_file, &config.key_file)
        .await
        .map_err(|e| {
            Error::config(format!(
                "TLS config error ({}, {}): {}",
                config.cert_file.display(),
                config.key_file.display(),
                e
            ))
        })?;

    let handle = Handle::new();
    tokio::spawn(shutdown_on_signal(handle.clone(), config.shutdown_grace));

    info!(addr = %config.addr, "Starting webhook server");

    axum_server::bind_rustls(config.addr, tls_config)
        .handle(handle)
        .serve(webhook_router(state).into_make_service())
        .await
        .map_err(|e| Error::server(format!("Server error: {}", e)))?;

    info!("Webhook server stopped");
    Ok(())
}

async fn shutdown_on_signal(handle: Handle, grace: Duration) {
    wait_for_signal().await;
    info!(grace = ?grace, "Shutdown signal received, draining connections");
    handle.graceful_shutdown(Some(grace));
}

async fn wait_for_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "Failed to listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "Failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
}
