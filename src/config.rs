//! Command line and environment configuration

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

use crate::registration::RegistrationConfig;
use crate::server::ServerConfig;
use crate::telemetry::LogFormat;
use crate::{Error, Result};

/// Mutating admission webhook that biases Pod priority by requested CPU
#[derive(Parser, Debug)]
#[command(name = "pod-priority-request-bias", version, about, long_about = None)]
pub struct Cli {
    /// Log line format
    #[arg(long, env = "LOG_FORMAT", value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,

    /// Serve arguments when no subcommand is given
    #[command(flatten)]
    pub serve: ServeArgs,

    /// Mode to run in; serves when omitted
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Serve the admission webhook (default mode)
    Serve(ServeArgs),

    /// Print the MutatingWebhookConfiguration YAML and exit
    Manifest(RegistrationArgs),
}

/// Serve mode arguments
#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    /// Address to listen on
    #[arg(long, env = "WEBHOOK_ADDR", default_value = "0.0.0.0:9443")]
    pub addr: SocketAddr,

    /// Serving certificate PEM file
    #[arg(
        long,
        env = "WEBHOOK_CERT_FILE",
        default_value = "/tmp/k8s-webhook-server/serving-certs/tls.crt"
    )]
    pub cert_file: PathBuf,

    /// Serving private key PEM file
    #[arg(
        long,
        env = "WEBHOOK_KEY_FILE",
        default_value = "/tmp/k8s-webhook-server/serving-certs/tls.key"
    )]
    pub key_file: PathBuf,

    /// Seconds in-flight requests get to finish on shutdown
    #[arg(long, env = "WEBHOOK_SHUTDOWN_GRACE_SECS", default_value = "10")]
    pub shutdown_grace_secs: u64,

    /// Apply the MutatingWebhookConfiguration before serving
    #[arg(long)]
    pub register: bool,

    /// Where the API server reaches this webhook
    #[command(flatten)]
    pub registration: RegistrationArgs,
}

/// Registration arguments
#[derive(Args, Debug, Clone)]
pub struct RegistrationArgs {
    /// Name of the MutatingWebhookConfiguration
    #[arg(long, default_value = "pod-priority-request-bias")]
    pub config_name: String,

    /// Service fronting the webhook
    #[arg(
        long,
        env = "WEBHOOK_SERVICE_NAME",
        default_value = "pod-priority-request-bias-webhook"
    )]
    pub service_name: String,

    /// Namespace of the webhook Service
    #[arg(long, env = "POD_NAMESPACE", default_value = "default")]
    pub service_namespace: String,

    /// Port of the webhook Service
    #[arg(long, default_value = "443")]
    pub service_port: i32,

    /// PEM CA bundle the API server should trust for the webhook
    #[arg(long, env = "WEBHOOK_CA_BUNDLE_FILE")]
    pub ca_bundle_file: Option<PathBuf>,
}

impl ServeArgs {
    /// Server configuration for these arguments
    pub fn server_config(&self) -> ServerConfig {
        ServerConfig {
            addr: self.addr,
            cert_file: self.cert_file.clone(),
            key_file: self.key_file.clone(),
            shutdown_grace: Duration::from_secs(self.shutdown_grace_secs),
        }
    }
}

impl RegistrationArgs {
    /// Registration configuration, reading the CA bundle file if given
    pub async fn registration_config(&self) -> Result<RegistrationConfig> {
        let ca_bundle = match &self.ca_bundle_file {
            Some(path) => Some(tokio::fs::read(path).await.map_err(|e| {
                Error::config(format!(
                    "Failed to read CA bundle {}: {}",
                    path.display(),
                    e
                ))
            })?),
            None => None,
        };

        Ok(RegistrationConfig {
            config_name: self.config_name.clone(),
            service_name: self.service_name.clone(),
            service_namespace: self.service_namespace.clone(),
            service_port: self.service_port,
            ca_bundle,
        })
    }
}
