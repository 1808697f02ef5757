//! # Security Token Service
//!
//! RFC 8693 token exchange against Google STS: a Kubernetes ServiceAccount JWT
//! goes in, a federated Google access token comes out.
//!
//! API Reference: https://cloud.google.com/iam/docs/reference/sts/rest/v1/TopLevel/token

use super::credential::{AccessToken, FederatedCredential};
use crate::constants::CLOUD_PLATFORM_SCOPE;
use crate::error::{Error, Result};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use tracing::debug;

const GRANT_TYPE_TOKEN_EXCHANGE: &str = "urn:ietf:params:oauth:grant-type:token-exchange";
const TOKEN_TYPE_ACCESS_TOKEN: &str = "urn:ietf:params:oauth:token-type:access_token";
const TOKEN_TYPE_JWT: &str = "urn:ietf:params:oauth:token-type:jwt";

/// OAuth error codes STS uses for a rejected subject token or audience
const DENIAL_CODES: [&str; 3] = ["invalid_grant", "unauthorized_client", "access_denied"];

#[derive(Debug, Deserialize)]
struct ExchangeResponse {
    #[serde(default)]
    access_token: String,
    #[serde(default)]
    expires_in: i64,
    #[serde(default)]
    token_type: String,
}

#[derive(Debug, Deserialize)]
struct OAuthErrorResponse {
    #[serde(default)]
    error: String,
    #[serde(default)]
    error_description: String,
}

/// Client for `POST {sts}/v1/token`
#[derive(Debug, Clone)]
pub struct StsClient {
    http_client: Client,
    base_url: String,
}

impl StsClient {
    #[must_use]
    pub fn new(http_client: Client, base_url: impl Into<String>) -> Self {
        Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Exchange `subject_token` for a federated access token bound to `audience`.
    ///
    /// # Errors
    ///
    /// [`Error::Authorization`] when STS rejects the subject token or audience,
    /// [`Error::Upstream`] for transport failures, other non-2xx statuses and
    /// empty tokens.
    pub async fn exchange(
        &self,
        subject_token: &AccessToken,
        audience: &str,
    ) -> Result<FederatedCredential> {
        let url = format!("{}/v1/token", self.base_url);
        let form = [
            ("grant_type", GRANT_TYPE_TOKEN_EXCHANGE),
            ("audience", audience),
            ("scope", CLOUD_PLATFORM_SCOPE),
            ("requested_token_type", TOKEN_TYPE_ACCESS_TOKEN),
            ("subject_token_type", TOKEN_TYPE_JWT),
            ("subject_token", subject_token.secret()),
        ];

        let response = self.http_client.post(&url).form(&form).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(exchange_error(status, &body, audience));
        }

        let parsed: ExchangeResponse = response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("malformed STS response: {e}")))?;

        let access_token = AccessToken::new(parsed.access_token);
        if access_token.is_empty() {
            return Err(Error::Upstream(format!(
                "STS exchange for audience {audience} returned an empty access token"
            )));
        }

        debug!(audience, expires_in = parsed.expires_in, "STS exchange succeeded");
        Ok(FederatedCredential::expiring_in(
            access_token,
            parsed.token_type,
            parsed.expires_in,
        ))
    }
}

fn exchange_error(status: StatusCode, body: &str, audience: &str) -> Error {
    let (code, description) = match serde_json::from_str::<OAuthErrorResponse>(body) {
        Ok(parsed) => (parsed.error, parsed.error_description),
        Err(_) => (String::new(), body.trim().to_string()),
    };
    let detail = format!(
        "STS exchange for audience {audience} failed: HTTP {}: {code}: {description}",
        status.as_u16()
    );

    if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        || DENIAL_CODES.contains(&code.as_str())
    {
        Error::Authorization(detail)
    } else {
        Error::Upstream(detail)
    }
}
