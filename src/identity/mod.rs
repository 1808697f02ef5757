//! # Identity Broker
//!
//! Turns a GSMSecret's effective configuration into a short-lived Google
//! access credential.
//!
//! Federated mode runs three steps, each under its own deadline:
//!
//! 1. Kubernetes `TokenRequest` for the ServiceAccount, bound to the WIF audience
//! 2. STS token exchange of that JWT for a federated access token
//! 3. Optional impersonation of a Google service account (`secrets.pize.com/gsa`)
//!
//! Trusted mode skips all of it and uses the controller pod's own identity.
//! A fresh credential is minted on every reconcile; nothing is cached.

mod credential;
mod impersonation;
mod metadata;
mod settings;
mod sts;
mod token_request;

pub use credential::{AccessToken, Credential, FederatedCredential};
pub use impersonation::IamCredentialsClient;
pub use metadata::MetadataClient;
pub use settings::{BrokerMode, BrokerSettings};
pub use sts::StsClient;
pub use token_request::request_service_account_token;

use crate::config::ControllerConfig;
use crate::controller::kube_client::ClusterClient;
use crate::crd::GsmSecret;
use crate::error::{with_deadline, Result};
use crate::observability::metrics;
use async_trait::async_trait;
use kube::ResourceExt;
use std::sync::Arc;
use tracing::{debug, info_span, Instrument};

#[cfg(test)]
use mockall::automock;

/// Produces the credential used to read Secret Manager for one resource
#[cfg_attr(test, automock)]
#[async_trait]
pub trait IdentityBroker: Send + Sync {
    async fn authenticate(&self, resource: &GsmSecret) -> Result<Credential>;
}

/// Production broker talking to the API server and Google
pub struct GcpIdentityBroker {
    cluster: Arc<dyn ClusterClient>,
    config: Arc<ControllerConfig>,
    sts: StsClient,
    iam: IamCredentialsClient,
    metadata: MetadataClient,
}

impl std::fmt::Debug for GcpIdentityBroker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcpIdentityBroker")
            .field("trusted_subsystem", &self.config.trusted_subsystem)
            .finish_non_exhaustive()
    }
}

impl GcpIdentityBroker {
    #[must_use]
    pub fn new(
        cluster: Arc<dyn ClusterClient>,
        config: Arc<ControllerConfig>,
        http_client: reqwest::Client,
    ) -> Self {
        let endpoints = &config.endpoints;
        Self {
            sts: StsClient::new(http_client.clone(), endpoints.sts.clone()),
            iam: IamCredentialsClient::new(http_client.clone(), endpoints.iam_credentials.clone()),
            metadata: MetadataClient::new(http_client, endpoints.metadata.clone()),
            cluster,
            config,
        }
    }

    async fn ambient(&self, settings: &BrokerSettings) -> Result<Credential> {
        let token = with_deadline(
            "metadata token request",
            settings.http_timeout,
            self.metadata.default_token(),
        )
        .instrument(info_span!("broker.metadata_token"))
        .await?;
        Ok(Credential::Ambient(token))
    }

    async fn federate(
        &self,
        settings: &BrokerSettings,
        service_account: &str,
        audience: &str,
        impersonate: Option<&str>,
    ) -> Result<Credential> {
        let subject_token = with_deadline(
            "serviceaccount token request",
            settings.token_request_timeout,
            request_service_account_token(
                self.cluster.as_ref(),
                &settings.namespace,
                service_account,
                audience,
                settings.token_expiration_secs,
            ),
        )
        .instrument(info_span!("broker.ksa_token", service_account))
        .await?;

        let federated = with_deadline(
            "STS token exchange",
            settings.http_timeout,
            self.sts.exchange(&subject_token, audience),
        )
        .instrument(info_span!("broker.sts_exchange", audience))
        .await?;

        let Some(gsa) = impersonate else {
            return Ok(Credential::Federated(federated));
        };

        let impersonated = with_deadline(
            "service account impersonation",
            settings.http_timeout,
            self.iam.generate_access_token(&federated, gsa),
        )
        .instrument(info_span!("broker.impersonate", service_account = gsa))
        .await?;

        Ok(Credential::Impersonated {
            service_account: gsa.to_string(),
            credential: impersonated,
        })
    }
}

#[async_trait]
impl IdentityBroker for GcpIdentityBroker {
    async fn authenticate(&self, resource: &GsmSecret) -> Result<Credential> {
        let settings = BrokerSettings::resolve(&self.config, resource)?;

        let strategy = match &settings.mode {
            BrokerMode::Trusted => "ambient",
            BrokerMode::Federated {
                impersonate: Some(_),
                ..
            } => "impersonated",
            BrokerMode::Federated { .. } => "federated",
        };
        let span = info_span!(
            "identity.authenticate",
            strategy,
            resource = %resource.name_any(),
            namespace = %settings.namespace,
        );

        let result = async {
            match &settings.mode {
                BrokerMode::Trusted => self.ambient(&settings).await,
                BrokerMode::Federated {
                    service_account,
                    audience,
                    impersonate,
                } => {
                    self.federate(&settings, service_account, audience, impersonate.as_deref())
                        .await
                }
            }
        }
        .instrument(span)
        .await;

        metrics::record_credential_exchange(strategy, result.is_ok());
        if let Ok(credential) = &result {
            debug!(
                strategy,
                expires_at = %credential.expires_at(),
                "Credential minted"
            );
        }
        result
    }
}
