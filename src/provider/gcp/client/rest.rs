//! GCP Secret Manager REST Client
//!
//! Native REST implementation of the one Secret Manager call the controller
//! needs: `versions.access`. Uses reqwest and a bearer token from the
//! identity broker.
//!
//! This implementation:
//! - Works directly with Pact HTTP mock servers
//! - Avoids gRPC/SSL issues with the official SDK
//!
//! References:
//! - [GCP Secret Manager REST API v1](https://cloud.google.com/secret-manager/docs/reference/rest)

use super::responses::{error_from_response, AccessSecretVersionResponse};
use crate::error::{with_deadline, Error, Result};
use crate::identity::Credential;
use crate::observability::metrics;
use crate::provider::{SecretStore, SecretStoreConnector, SecretVersionName};
use async_trait::async_trait;
use base64::{engine::general_purpose, Engine as _};
use reqwest::{Client, Url};
use std::time::{Duration, Instant};
use tracing::{debug, info_span, Instrument};

/// GCP Secret Manager REST client bound to one credential
pub struct SecretManagerREST {
    http_client: Client,
    base_url: String,
    credential: Credential,
    timeout: Duration,
}

impl std::fmt::Debug for SecretManagerREST {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretManagerREST")
            .field("base_url", &self.base_url)
            .field("strategy", &self.credential.strategy())
            .finish_non_exhaustive()
    }
}

impl SecretManagerREST {
    #[must_use]
    pub fn new(
        http_client: Client,
        base_url: impl Into<String>,
        credential: Credential,
        timeout: Duration,
    ) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            credential,
            timeout,
        }
    }

    /// `{base}/v1/projects/{p}/secrets/{s}/versions/{v}:access`, with each
    /// id percent-encoded as a single path segment
    fn access_url(&self, name: &SecretVersionName) -> Result<Url> {
        let mut url = Url::parse(&self.base_url).map_err(|e| {
            Error::Configuration(format!("invalid Secret Manager endpoint {}: {e}", self.base_url))
        })?;
        url.path_segments_mut()
            .map_err(|()| {
                Error::Configuration(format!(
                    "Secret Manager endpoint {} cannot carry a path",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .extend([
                "v1",
                "projects",
                name.project.as_str(),
                "secrets",
                name.secret.as_str(),
                "versions",
                format!("{}:access", name.version).as_str(),
            ]);
        Ok(url)
    }

    async fn fetch(&self, name: &SecretVersionName) -> Result<Vec<u8>> {
        let response = self
            .http_client
            .get(self.access_url(name)?)
            .header(
                reqwest::header::AUTHORIZATION,
                self.credential.authorization_header().as_str(),
            )
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(error_from_response("access secret version", status, &body));
        }

        let access: AccessSecretVersionResponse = response.json().await.map_err(|e| {
            Error::Upstream(format!("malformed access response for {name}: {e}"))
        })?;
        debug!(resolved = %access.name, "Secret version accessed");

        general_purpose::STANDARD
            .decode(access.payload.data.as_bytes())
            .map_err(|e| Error::Upstream(format!("payload of {name} is not valid base64: {e}")))
    }
}

#[async_trait]
impl SecretStore for SecretManagerREST {
    async fn access_version(&self, name: &SecretVersionName) -> Result<Vec<u8>> {
        let span = info_span!(
            "gcp.secret_manager.access",
            secret.project = %name.project,
            secret.id = %name.secret,
            secret.version = %name.version,
            credential.strategy = self.credential.strategy(),
        );

        async move {
            let start = Instant::now();
            let result = with_deadline(
                &format!("access {name}"),
                self.timeout,
                self.fetch(name),
            )
            .await;
            let outcome = match &result {
                Ok(_) => "success",
                Err(e) => e.kind(),
            };
            metrics::record_secret_fetch(outcome, start.elapsed().as_secs_f64());
            result
        }
        .instrument(span)
        .await
    }
}

/// Hands out [`SecretManagerREST`] clients that share one connection pool
#[derive(Debug, Clone)]
pub struct SecretManagerConnector {
    http_client: Client,
    base_url: String,
    timeout: Duration,
}

impl SecretManagerConnector {
    #[must_use]
    pub fn new(http_client: Client, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            http_client,
            base_url: base_url.into(),
            timeout,
        }
    }
}

impl SecretStoreConnector for SecretManagerConnector {
    fn connect(&self, credential: Credential) -> Box<dyn SecretStore> {
        Box::new(SecretManagerREST::new(
            self.http_client.clone(),
            self.base_url.clone(),
            credential,
            self.timeout,
        ))
    }
}
