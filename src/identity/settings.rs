//! # Broker Settings
//!
//! Resolves, per reconcile, how the broker should obtain a credential for one
//! GSMSecret. This is the single place where annotation overrides meet the
//! environment-derived [`ControllerConfig`]; everything downstream works from
//! the resolved [`BrokerSettings`].
//!
//! Precedence:
//!
//! | Setting          | 1st                  | 2nd             | Fallback           |
//! |------------------|----------------------|-----------------|--------------------|
//! | ServiceAccount   | `secrets.pize.com/ksa` | `KSA`         | `default`          |
//! | Audience         | `WIFAUDIENCE`        | `secrets.pize.com/wif-audience` | configuration error |
//! | Impersonate      | `secrets.pize.com/gsa` | -             | none               |

use crate::config::ControllerConfig;
use crate::constants::DEFAULT_SERVICE_ACCOUNT;
use crate::crd::{
    annotation_value, GsmSecret, ANNOTATION_GSA, ANNOTATION_KSA, ANNOTATION_WIF_AUDIENCE,
};
use crate::error::{Error, Result};
use kube::ResourceExt;
use std::time::Duration;

/// Which credential strategy to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BrokerMode {
    /// Use the controller's ambient identity, no federation
    Trusted,
    /// TokenRequest, then STS exchange, then optional impersonation
    Federated {
        service_account: String,
        audience: String,
        impersonate: Option<String>,
    },
}

/// Fully resolved broker configuration for one reconcile
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrokerSettings {
    pub namespace: String,
    pub mode: BrokerMode,
    pub token_expiration_secs: i64,
    pub token_request_timeout: Duration,
    pub http_timeout: Duration,
}

impl BrokerSettings {
    /// Pure precedence resolution; reads no environment.
    ///
    /// # Errors
    ///
    /// [`Error::Configuration`] when the namespace is missing, when federation
    /// is required but no audience is configured, or when trusted mode is
    /// combined with impersonation.
    pub fn resolve(config: &ControllerConfig, resource: &GsmSecret) -> Result<Self> {
        let namespace = resource
            .namespace()
            .filter(|ns| !ns.is_empty())
            .ok_or_else(|| {
                Error::Configuration(format!(
                    "GSMSecret {} has no namespace",
                    resource.name_any()
                ))
            })?;

        let annotations = Some(resource.annotations());
        let impersonate = annotation_value(annotations, ANNOTATION_GSA).map(str::to_string);

        let mode = if config.trusted_subsystem {
            if let Some(gsa) = impersonate {
                return Err(Error::Configuration(format!(
                    "impersonating {gsa} ({ANNOTATION_GSA}) is not supported in trusted mode"
                )));
            }
            BrokerMode::Trusted
        } else {
            let service_account = annotation_value(annotations, ANNOTATION_KSA)
                .map(str::to_string)
                .or_else(|| config.service_account.clone())
                .unwrap_or_else(|| DEFAULT_SERVICE_ACCOUNT.to_string());

            let audience = config
                .wif_audience
                .clone()
                .or_else(|| annotation_value(annotations, ANNOTATION_WIF_AUDIENCE).map(str::to_string))
                .ok_or_else(|| {
                    Error::Configuration(format!(
                        "WIF audience not set: set WIFAUDIENCE env var or annotation {ANNOTATION_WIF_AUDIENCE}"
                    ))
                })?;

            BrokerMode::Federated {
                service_account,
                audience,
                impersonate,
            }
        };

        Ok(Self {
            namespace,
            mode,
            token_expiration_secs: config.token_expiration_secs,
            token_request_timeout: config.token_request_timeout,
            http_timeout: config.http_timeout,
        })
    }
}
