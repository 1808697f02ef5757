//! # Watch Loop
//!
//! Watches GSMSecrets and the Secrets they own, and drives reconciles.
//!
//! Both watch streams pass through a [`ChangeGate`] first:
//! - GSMSecret events trigger only when the desired state changed
//!   (generation, identity annotations or the release annotation). Status
//!   writes and deletions never trigger.
//! - Owned Secret events trigger when `data` or `type` drifted, and on
//!   deletion so the Secret is recreated.
//!
//! Resyncs come from the `requeue` each successful reconcile returns.

use crate::controller::filter::{desired_state_changed, target_object_changed, ChangeGate};
use crate::controller::reconciler::{reconcile, Reconciler};
use crate::controller::server::ServerState;
use crate::crd::GsmSecret;
use crate::runtime::error_policy::error_policy;
use futures::{future, StreamExt};
use k8s_openapi::api::core::v1::Secret;
use kube::api::Api;
use kube::{Client, Resource};
use kube_runtime::{reflector, watcher, Controller, WatchStreamExt};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Run the controller until SIGINT/SIGTERM.
///
/// Readiness is raised once the controller is wired up and cleared on the
/// way out, so `/readyz` fails while in-flight reconciles drain.
pub async fn run_watch_loop(
    client: Client,
    reconciler: Arc<Reconciler>,
    server_state: Arc<ServerState>,
) -> Result<(), anyhow::Error> {
    info!("Starting controller watch loop...");

    let gsm_secrets: Api<GsmSecret> = Api::all(client.clone());
    let secrets: Api<Secret> = Api::all(client);

    let (reader, writer) = reflector::store();

    let mut gsm_gate = ChangeGate::new(desired_state_changed, false);
    let gsm_stream = watcher(gsm_secrets, watcher::Config::default())
        .default_backoff()
        .reflect(writer)
        .filter_map(move |event| future::ready(gsm_gate.admit(event)));

    let mut secret_gate = ChangeGate::new(target_object_changed, true);
    let secret_stream = watcher(secrets, watcher::Config::default())
        .default_backoff()
        .filter(|event| future::ready(concerns_gsm_secret(event)))
        .filter_map(move |event| future::ready(secret_gate.admit(event)));

    server_state.set_ready(true);
    info!("Controller is ready");

    Controller::for_stream(gsm_stream, reader)
        .owns_stream(secret_stream)
        .shutdown_on_signal()
        .run(reconcile, error_policy, reconciler)
        .for_each(|result| {
            match result {
                Ok((obj, _action)) => debug!(
                    resource.name = %obj.name,
                    resource.namespace = obj.namespace.as_deref().unwrap_or_default(),
                    "Reconcile finished"
                ),
                // Reconcile failures were already handled by the error policy
                Err(kube_runtime::controller::Error::ReconcilerFailed(_, _)) => {}
                Err(e) => warn!("Controller error: {}", e),
            }
            future::ready(())
        })
        .await;

    server_state.set_ready(false);
    info!("Controller stopped gracefully");
    Ok(())
}

/// Keep only Secrets owned by a GSMSecret (and non-object events).
///
/// Unowned Secrets can never map back to a GSMSecret, so there is no point
/// remembering them in the change gate.
fn concerns_gsm_secret(event: &Result<watcher::Event<Secret>, watcher::Error>) -> bool {
    match event {
        Ok(
            watcher::Event::Apply(secret)
            | watcher::Event::InitApply(secret)
            | watcher::Event::Delete(secret),
        ) => is_owned_by_gsm_secret(secret),
        _ => true,
    }
}

fn is_owned_by_gsm_secret(secret: &Secret) -> bool {
    let kind = GsmSecret::kind(&());
    secret
        .metadata
        .owner_references
        .as_ref()
        .is_some_and(|refs| refs.iter().any(|r| r.kind == kind))
}
