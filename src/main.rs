//! Pod priority request bias webhook

use std::sync::Arc;

use clap::Parser;
use kube::Client;

use pod_priority_request_bias::config::{Cli, Commands, RegistrationArgs, ServeArgs};
use pod_priority_request_bias::registration::{ensure_webhook_config, webhook_manifest};
use pod_priority_request_bias::server::start_server;
use pod_priority_request_bias::telemetry::{init_telemetry, LogFormat, TelemetryConfig};
use pod_priority_request_bias::webhook::WebhookState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Manifest(args)) => print_manifest(args).await,
        Some(Commands::Serve(args)) => run_webhook(cli.log_format, args).await,
        None => run_webhook(cli.log_format, cli.serve).await,
    }
}

/// Print the MutatingWebhookConfiguration YAML
async fn print_manifest(args: RegistrationArgs) -> anyhow::Result<()> {
    let config = args.registration_config().await?;
    let manifest = webhook_manifest(&config)?;
    println!("{manifest}");
    Ok(())
}

/// Serve the admission webhook until shutdown
async fn run_webhook(log_format: LogFormat, args: ServeArgs) -> anyhow::Result<()> {
    if let Err(e) = rustls::crypto::aws_lc_rs::default_provider().install_default() {
        eprintln!("CRITICAL: Failed to install crypto provider: {:?}", e);
        std::process::exit(1);
    }

    init_telemetry(TelemetryConfig { format: log_format })?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        "Pod priority request bias webhook starting"
    );

    if args.register {
        let registration = args.registration.registration_config().await?;
        let client = Client::try_default()
            .await
            .map_err(|e| anyhow::anyhow!("Failed to create Kubernetes client: {}", e))?;
        ensure_webhook_config(&client, &registration)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to install webhook configuration: {}", e))?;
    }

    start_server(args.server_config(), Arc::new(WebhookState::default())).await?;

    tracing::info!("Pod priority request bias webhook shutting down");
    Ok(())
}
