//! # Release Command
//!
//! Forces a reconcile by stamping the release annotation.
//!
//! The controller treats any change to `secrets.pize.com/release` as a change
//! to desired state, so a fresh timestamp re-materializes the Secret (picking
//! up new `latest` versions) without touching the spec.

use anyhow::{Context, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use gsm_secret_controller::crd::{GsmSecret, ANNOTATION_RELEASE};
use kube::api::{Api, Patch, PatchParams};
use kube::Client;
use serde_json::json;

pub async fn release_command(client: Client, name: String, namespace: Option<String>) -> Result<()> {
    let ns = namespace.unwrap_or_else(|| client.default_namespace().to_string());
    let api: Api<GsmSecret> = Api::namespaced(client, &ns);

    // Fail with a clear message instead of patching a missing resource
    api.get(&name)
        .await
        .with_context(|| format!("Failed to get GSMSecret '{ns}/{name}'"))?;

    let stamp = release_stamp(Utc::now());
    api.patch(
        &name,
        &PatchParams::default(),
        &Patch::Merge(release_patch(&stamp)),
    )
    .await
    .with_context(|| format!("Failed to annotate GSMSecret '{ns}/{name}'"))?;

    println!("✅ Released GSMSecret '{ns}/{name}'");
    println!("   {ANNOTATION_RELEASE}: {stamp}");
    println!("   The controller will re-materialize the target Secret shortly.");
    Ok(())
}

fn release_stamp(now: DateTime<Utc>) -> String {
    now.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn release_patch(stamp: &str) -> serde_json::Value {
    json!({
        "metadata": {
            "annotations": {
                ANNOTATION_RELEASE: stamp
            }
        }
    })
}
