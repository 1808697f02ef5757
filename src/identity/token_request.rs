//! # ServiceAccount Token Request
//!
//! Mints a short-lived, audience-bound token for a Kubernetes ServiceAccount
//! through the `serviceaccounts/{name}/token` subresource.

use super::credential::AccessToken;
use crate::controller::kube_client::ClusterClient;
use crate::error::{Error, Result};
use k8s_openapi::api::authentication::v1::{TokenRequest, TokenRequestSpec};
use tracing::debug;

/// Request a token for `service_account` in `namespace`, bound to `audience`.
///
/// # Errors
///
/// - [`Error::Authorization`] when the controller lacks `create` on `serviceaccounts/token`
/// - [`Error::NotFound`] when the ServiceAccount does not exist
/// - [`Error::Upstream`] for any other API failure or an empty token
pub async fn request_service_account_token(
    cluster: &dyn ClusterClient,
    namespace: &str,
    service_account: &str,
    audience: &str,
    expiration_secs: i64,
) -> Result<AccessToken> {
    let request = TokenRequest {
        spec: TokenRequestSpec {
            audiences: vec![audience.to_string()],
            expiration_seconds: Some(expiration_secs),
            ..Default::default()
        },
        ..Default::default()
    };

    let response = cluster
        .create_service_account_token(namespace, service_account, &request)
        .await
        .map_err(|err| match err {
            kube::Error::Api(ae) if ae.code == 403 => Error::Authorization(format!(
                "token request forbidden for serviceaccount {service_account} (need RBAC create on serviceaccounts/token in namespace {namespace}): {}",
                ae.message
            )),
            kube::Error::Api(ae) if ae.code == 404 => Error::NotFound(format!(
                "serviceaccount {service_account} not found in namespace {namespace}"
            )),
            other => Error::Upstream(format!(
                "token request failed for serviceaccount {namespace}/{service_account}: {other}"
            )),
        })?;

    let token = response
        .status
        .map(|status| AccessToken::new(status.token))
        .filter(|token| !token.is_empty())
        .ok_or_else(|| {
            Error::Upstream(format!(
                "token request succeeded but token was empty for serviceaccount {namespace}/{service_account}"
            ))
        })?;

    debug!(
        namespace,
        service_account,
        expiration_secs,
        "ServiceAccount token issued"
    );
    Ok(token)
}
