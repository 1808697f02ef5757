//! # Service Account Impersonation
//!
//! Trades a federated token for an access token of a Google service account
//! via IAM Credentials `generateAccessToken`. The federated principal needs
//! `roles/iam.serviceAccountTokenCreator` on the target account.
//!
//! API Reference: https://cloud.google.com/iam/docs/reference/credentials/rest/v1/projects.serviceAccounts/generateAccessToken

use super::credential::{AccessToken, FederatedCredential};
use crate::constants::{CLOUD_PLATFORM_SCOPE, IMPERSONATED_TOKEN_LIFETIME};
use crate::error::{Error, Result};
use crate::provider::gcp::error_from_response;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateAccessTokenRequest<'a> {
    scope: Vec<&'a str>,
    lifetime: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateAccessTokenResponse {
    #[serde(default)]
    access_token: String,
    expire_time: String,
}

/// Client for `POST {iam}/v1/projects/-/serviceAccounts/{email}:generateAccessToken`
#[derive(Debug, Clone)]
pub struct IamCredentialsClient {
    http_client: Client,
    base_url: String,
}

impl IamCredentialsClient {
    #[must_use]
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Impersonate `service_account` using `federated` as the caller identity.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] on 401/403 (missing token creator binding),
    /// [`Error::NotFound`] for an unknown service account, otherwise
    /// [`Error::Upstream`].
    pub async fn generate_access_token(
        &self,
        federated: &FederatedCredential,
        service_account: &str,
    ) -> Result<FederatedCredential> {
        let url = format!(
            "{}/v1/projects/-/serviceAccounts/{service_account}:generateAccessToken",
            self.base_url
        );
        let body = GenerateAccessTokenRequest {
            scope: vec![CLOUD_PLATFORM_SCOPE],
            lifetime: IMPERSONATED_TOKEN_LIFETIME,
        };

        let response = self
            .http_client
            .post(&url)
            .bearer_auth(federated.access_token.secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_response(
                &format!("impersonate {service_account}"),
                status,
                &text,
            ));
        }

        let parsed: GenerateAccessTokenResponse = response.json().await.map_err(|e| {
            Error::Upstream(format!(
                "malformed generateAccessToken response for {service_account}: {e}"
            ))
        })?;

        let access_token = AccessToken::new(parsed.access_token);
        if access_token.is_empty() {
            return Err(Error::Upstream(format!(
                "impersonation of {service_account} returned an empty access token"
            )));
        }
        let expires_at = parse_expire_time(&parsed.expire_time)?;

        debug!(service_account, %expires_at, "Impersonated access token issued");
        Ok(FederatedCredential::new(access_token, "Bearer", expires_at))
    }
}

fn parse_expire_time(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| Error::Upstream(format!("invalid expireTime {raw:?}: {e}")))
}
