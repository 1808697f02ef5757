//! # Metadata Server
//!
//! Ambient credentials for trusted mode: the controller pod's own Google
//! identity, read from the GCE/GKE metadata server.

use super::credential::{AccessToken, FederatedCredential};
use crate::error::{Error, Result};
use reqwest::Client;
use serde::Deserialize;

const TOKEN_PATH: &str = "/computeMetadata/v1/instance/service-accounts/default/token";

#[derive(Debug, Deserialize)]
struct MetadataTokenResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    token_type: String,
}

/// Client for the metadata server's default service account token
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http_client: Client,
    base_url: String,
}

impl MetadataClient {
    #[must_use]
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// # Errors
    ///
    /// [`Error::Upstream`] when the metadata server is unreachable or answers
    /// with anything but a usable token.
    pub async fn default_token(&self) -> Result<FederatedCredential> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        let response = self
            .http_client
            .get(&url)
            .header("Metadata-Flavor", "Google")
            .send()
            .await
            .map_err(|e| Error::Upstream(format!("metadata server unreachable: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "metadata token request failed: HTTP {}: {}",
                status.as_u16(),
                body.trim()
            )));
        }

        let parsed: MetadataTokenResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed metadata token response: {e}")))?;

        let access_token = AccessToken::new(parsed.access_token);
        if access_token.is_empty() {
            return Err(Error::Upstream(
                "metadata server returned an empty access token".to_string(),
            ));
        }
        Ok(FederatedCredential::expiring_in(
            access_token,
            parsed.token_type,
            parsed.expires_in,
        ))
    }
}
