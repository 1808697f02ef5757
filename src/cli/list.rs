//! # List Command
//!
//! Lists GSMSecret resources with their target and Ready state.

use anyhow::{Context, Result};
use gsm_secret_controller::crd::{GsmSecret, CONDITION_READY};
use kube::api::{Api, ListParams};
use kube::Client;

pub async fn list_command(client: Client, namespace: Option<String>) -> Result<()> {
    let api: Api<GsmSecret> = if let Some(ns) = &namespace {
        println!("Listing GSMSecret resources in namespace '{ns}'...");
        Api::namespaced(client, ns)
    } else {
        println!("Listing GSMSecret resources in all namespaces...");
        Api::all(client)
    };

    let resources = api
        .list(&ListParams::default())
        .await
        .context("Failed to list GSMSecret resources")?;

    if resources.items.is_empty() {
        println!("No GSMSecret resources found.");
        return Ok(());
    }

    println!(
        "\n{:<30} {:<20} {:<30} {:<8} {:<15}",
        "NAME", "NAMESPACE", "TARGET", "READY", "REASON"
    );
    println!("{}", "-".repeat(107));

    for resource in &resources.items {
        println!("{}", row(resource));
    }

    Ok(())
}

fn row(resource: &GsmSecret) -> String {
    let name = resource.metadata.name.as_deref().unwrap_or("<unknown>");
    let ns = resource.metadata.namespace.as_deref().unwrap_or("<unknown>");
    let target = resource.spec.target_name();

    let ready = resource
        .status
        .as_ref()
        .and_then(|s| s.condition(CONDITION_READY));
    let status = ready.map_or("Unknown", |c| c.status.as_str());
    let reason = ready.and_then(|c| c.reason.as_deref()).unwrap_or("-");

    format!("{name:<30} {ns:<20} {target:<30} {status:<8} {reason:<15}")
}
