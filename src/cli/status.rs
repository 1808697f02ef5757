//! # Status Command
//!
//! Shows the Ready condition of a GSMSecret.

use anyhow::{Context, Result};
use gsm_secret_controller::crd::{GsmSecret, ANNOTATION_RELEASE, CONDITION_READY};
use kube::api::Api;
use kube::{Client, ResourceExt};

pub async fn status_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.unwrap_or_else(|| client.default_namespace().to_string());
    let api: Api<GsmSecret> = Api::namespaced(client, &ns);

    let resource = api
        .get(&name)
        .await
        .with_context(|| format!("Failed to get GSMSecret '{ns}/{name}'"))?;

    println!("GSMSecret: {ns}/{name}");
    println!("  Target Secret: {}", resource.spec.target_name());
    println!("  Entries: {}", resource.spec.entries.len());
    println!(
        "  Generation: {}",
        resource.metadata.generation.unwrap_or_default()
    );
    if let Some(release) = resource.annotations().get(ANNOTATION_RELEASE) {
        println!("  Last release: {release}");
    }

    let ready = resource
        .status
        .as_ref()
        .and_then(|s| s.condition(CONDITION_READY));

    match ready {
        Some(condition) => {
            println!("\nReady: {}", condition.status);
            println!(
                "  Reason: {}",
                condition.reason.as_deref().unwrap_or("-")
            );
            println!(
                "  Message: {}",
                condition.message.as_deref().unwrap_or("-")
            );
            println!(
                "  Observed generation: {}",
                condition
                    .observed_generation
                    .map_or_else(|| "-".to_string(), |g| g.to_string())
            );
            println!(
                "  Last transition: {}",
                condition.last_transition_time.as_deref().unwrap_or("-")
            );
        }
        None => println!("\nReady: Unknown (not reconciled yet)"),
    }

    Ok(())
}
