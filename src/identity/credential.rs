//! # Credentials
//!
//! Short-lived access tokens produced by the identity broker.
//!
//! A [`Credential`] is minted for exactly one reconcile and handed to the
//! Secret Manager client by value. It is never cached or shared across
//! reconciles, so there is no refresh logic here.

use chrono::{DateTime, Utc};
use zeroize::Zeroizing;

/// OAuth2 bearer token, wiped from memory on drop and redacted in `Debug`
#[derive(Clone, PartialEq, Eq)]
pub struct AccessToken(Zeroizing<String>);

impl AccessToken {
    #[must_use]
    pub fn new(token: impl Into<String>) -> Self {
        Self(Zeroizing::new(token.into()))
    }

    #[must_use]
    pub fn secret(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// Access token, token type and absolute expiry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FederatedCredential {
    pub access_token: AccessToken,
    pub token_type: String,
    pub expires_at: DateTime<Utc>,
}

impl FederatedCredential {
    #[must_use]
    pub fn new(access_token: AccessToken, token_type: impl Into<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            access_token,
            token_type: token_type.into(),
            expires_at,
        }
    }

    /// Expiry computed from a relative `expires_in` (seconds)
    #[must_use]
    pub fn expiring_in(access_token: AccessToken, token_type: impl Into<String>, expires_in: i64) -> Self {
        Self::new(
            access_token,
            token_type,
            Utc::now() + chrono::Duration::seconds(expires_in.max(0)),
        )
    }
}

/// How the credential was obtained
///
/// Selected once by the broker, then passed opaquely to the secret store
/// client, which only ever asks for the `Authorization` header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    /// The controller pod's own identity (trusted mode)
    Ambient(FederatedCredential),
    /// STS token exchange of a ServiceAccount token
    Federated(FederatedCredential),
    /// Federated token traded for a Google service account token
    Impersonated {
        service_account: String,
        credential: FederatedCredential,
    },
}

impl Credential {
    /// Metric and log label
    #[must_use]
    pub fn strategy(&self) -> &'static str {
        match self {
            Credential::Ambient(_) => "ambient",
            Credential::Federated(_) => "federated",
            Credential::Impersonated { .. } => "impersonated",
        }
    }

    #[must_use]
    pub fn token(&self) -> &FederatedCredential {
        match self {
            Credential::Ambient(credential)
            | Credential::Federated(credential)
            | Credential::Impersonated { credential, .. } => credential,
        }
    }

    #[must_use]
    pub fn expires_at(&self) -> DateTime<Utc> {
        self.token().expires_at
    }

    /// Value for the HTTP `Authorization` header.
    /// Google APIs always accept `Bearer`, whatever `token_type` casing came back.
    #[must_use]
    pub fn authorization_header(&self) -> Zeroizing<String> {
        Zeroizing::new(format!("Bearer {}", self.token().access_token.secret()))
    }
}
