//! # GSMCTL CLI
//!
//! Command-line interface for the GSM Secret Controller.
//!
//! ## Usage
//!
//! ```bash
//! # Force a reconcile by stamping the release annotation
//! gsmctl release app-secrets --namespace team-a
//!
//! # Show the Ready condition of a GSMSecret
//! gsmctl status app-secrets
//!
//! # List GSMSecrets in all namespaces
//! gsmctl list
//! ```

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use kube::config::KubeConfigOptions;
use kube::{Client, Config};

mod list;
mod release;
mod status;

/// GSM Secret Controller CLI
#[derive(Parser)]
#[command(name = "gsmctl")]
#[command(
    about = "GSM Secret Controller CLI",
    long_about = None,
    after_help = "\
Examples:
  gsmctl list
  gsmctl release app-secrets --namespace team-a
  gsmctl status app-secrets
"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Kubernetes namespace (defaults to current context namespace)
    #[arg(short, long, global = true)]
    namespace: Option<String>,

    /// Kubernetes context to use
    #[arg(short, long, global = true)]
    context: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Force a reconcile by stamping the release annotation with the current time
    Release {
        /// Name of the GSMSecret resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// Show the Ready condition of a GSMSecret resource
    Status {
        /// Name of the GSMSecret resource
        #[arg(value_name = "NAME")]
        name: String,
    },
    /// List GSMSecret resources (all namespaces unless --namespace is set)
    List,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Required for rustls 0.23+; matches the controller's provider
    if rustls::crypto::ring::default_provider()
        .install_default()
        .is_err()
    {
        eprintln!("rustls crypto provider already installed, keeping the existing one");
    }

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gsmctl=info".into()),
        )
        .init();

    let cli = Cli::parse();

    let config = Config::from_kubeconfig(&KubeConfigOptions {
        context: cli.context.clone(),
        ..KubeConfigOptions::default()
    })
    .await
    .or_else(|_| Config::incluster())
    .context("Failed to load Kubernetes configuration. Ensure kubeconfig is configured.")?;
    let client = Client::try_from(config).context("Failed to create Kubernetes client")?;

    match cli.command {
        Commands::Release { name } => release::release_command(client, name, cli.namespace).await,
        Commands::Status { name } => status::status_command(client, name, cli.namespace).await,
        Commands::List => list::list_command(client, cli.namespace).await,
    }
}
