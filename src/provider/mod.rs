//! # Provider Modules
//!
//! External secret store access.
//!
//! The reconciler never talks to Google directly: it asks a
//! [`SecretStoreConnector`] for a [`SecretStore`] bound to the credential the
//! identity broker just minted, then reads versions through it.

use crate::error::Result;
use crate::identity::Credential;
use async_trait::async_trait;
use std::fmt;

#[cfg(test)]
use mockall::automock;

pub mod gcp;

/// Fully qualified secret version, `projects/{p}/secrets/{s}/versions/{v}`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretVersionName {
    pub project: String,
    pub secret: String,
    pub version: String,
}

impl SecretVersionName {
    /// Empty (or blank) versions are normalized to `latest`.
    #[must_use]
    pub fn new(
        project: impl Into<String>,
        secret: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        let version = version.into();
        let version = match version.trim() {
            "" => crate::constants::LATEST_VERSION.to_string(),
            v => v.to_string(),
        };
        Self {
            project: project.into(),
            secret: secret.into(),
            version,
        }
    }
}

impl fmt::Display for SecretVersionName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "projects/{}/secrets/{}/versions/{}",
            self.project, self.secret, self.version
        )
    }
}

/// Read access to secret versions
#[cfg_attr(test, automock)]
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Raw payload bytes of one version
    async fn access_version(&self, name: &SecretVersionName) -> Result<Vec<u8>>;
}

/// Builds a [`SecretStore`] for a freshly minted credential
#[cfg_attr(test, automock)]
pub trait SecretStoreConnector: Send + Sync {
    fn connect(&self, credential: Credential) -> Box<dyn SecretStore>;
}
