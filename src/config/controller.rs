//! # Controller Configuration
//!
//! Controller-level settings loaded from environment variables.
//!
//! The environment is read exactly once at startup. Per-resource precedence
//! (annotation vs. environment) is resolved later by
//! [`BrokerSettings::resolve`](crate::identity::BrokerSettings::resolve) from
//! this already-loaded struct, so nothing in the reconcile pipeline touches
//! the process environment.

use super::{lookup_bool, lookup_nonempty, lookup_or_default, lookup_str};
use crate::constants::{
    DEFAULT_BACKOFF_MAX_SECS, DEFAULT_BACKOFF_MIN_SECS, DEFAULT_HTTP_TIMEOUT_SECS,
    DEFAULT_IAM_CREDENTIALS_ENDPOINT, DEFAULT_METADATA_ENDPOINT, DEFAULT_RESYNC_INTERVAL_SECS,
    DEFAULT_SECRET_MANAGER_ENDPOINT, DEFAULT_STS_ENDPOINT, DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS,
    MIN_TOKEN_EXPIRATION_SECS,
};
use std::time::Duration;

/// Base URLs for every Google API the controller talks to
///
/// Overridable so contract tests can point the real clients at mock servers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GcpEndpoints {
    pub sts: String,
    pub iam_credentials: String,
    pub secret_manager: String,
    pub metadata: String,
}

impl Default for GcpEndpoints {
    fn default() -> Self {
        Self {
            sts: DEFAULT_STS_ENDPOINT.to_string(),
            iam_credentials: DEFAULT_IAM_CREDENTIALS_ENDPOINT.to_string(),
            secret_manager: DEFAULT_SECRET_MANAGER_ENDPOINT.to_string(),
            metadata: DEFAULT_METADATA_ENDPOINT.to_string(),
        }
    }
}

/// Controller-level configuration
///
/// All settings have sensible defaults and can be overridden via environment variables.
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// `KSA` - ServiceAccount name used when the resource has no annotation
    pub service_account: Option<String>,
    /// `WIFAUDIENCE` - federation audience; beats the annotation when set
    pub wif_audience: Option<String>,
    /// `TOKEN_EXP_SECONDS` - requested ServiceAccount token lifetime, never below the API floor
    pub token_expiration_secs: i64,
    /// `TOKEN_REQUEST_TIMEOUT_SECONDS` - deadline for the TokenRequest call
    pub token_request_timeout: Duration,
    /// `HTTP_TIMEOUT_SECONDS` - deadline for HTTP calls and Secret reads/writes
    pub http_timeout: Duration,
    /// `RESYNC_INTERVAL_SECONDS` - requeue delay after a successful reconcile
    pub resync_interval: Duration,
    /// `TRUSTED_SUBSYSTEM` - use the pod's own identity and skip federation
    pub trusted_subsystem: bool,
    /// Google API base URLs
    pub endpoints: GcpEndpoints,
    /// Fibonacci backoff floor for failed reconciles (seconds)
    pub backoff_min_secs: u64,
    /// Fibonacci backoff ceiling for failed reconciles (seconds)
    pub backoff_max_secs: u64,
    /// Log format (json, text)
    pub log_format: String,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            service_account: None,
            wif_audience: None,
            token_expiration_secs: MIN_TOKEN_EXPIRATION_SECS,
            token_request_timeout: Duration::from_secs(DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS),
            http_timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECS),
            resync_interval: Duration::from_secs(DEFAULT_RESYNC_INTERVAL_SECS),
            trusted_subsystem: false,
            endpoints: GcpEndpoints::default(),
            backoff_min_secs: DEFAULT_BACKOFF_MIN_SECS,
            backoff_max_secs: DEFAULT_BACKOFF_MAX_SECS,
            log_format: "text".to_string(),
        }
    }
}

impl ControllerConfig {
    /// Load configuration from environment variables with defaults
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build configuration from an arbitrary key lookup
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GcpEndpoints::default();
        Self {
            service_account: lookup_nonempty(&lookup, "KSA"),
            wif_audience: lookup_nonempty(&lookup, "WIFAUDIENCE"),
            token_expiration_secs: token_expiration_secs(lookup("TOKEN_EXP_SECONDS").as_deref()),
            token_request_timeout: positive_secs(
                lookup("TOKEN_REQUEST_TIMEOUT_SECONDS").as_deref(),
                DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS,
            ),
            http_timeout: positive_secs(
                lookup("HTTP_TIMEOUT_SECONDS").as_deref(),
                DEFAULT_HTTP_TIMEOUT_SECS,
            ),
            resync_interval: positive_secs(
                lookup("RESYNC_INTERVAL_SECONDS").as_deref(),
                DEFAULT_RESYNC_INTERVAL_SECS,
            ),
            trusted_subsystem: lookup_bool(&lookup, "TRUSTED_SUBSYSTEM", false),
            endpoints: GcpEndpoints {
                sts: lookup_str(&lookup, "STS_ENDPOINT", &defaults.sts),
                iam_credentials: lookup_str(
                    &lookup,
                    "IAM_CREDENTIALS_ENDPOINT",
                    &defaults.iam_credentials,
                ),
                secret_manager: lookup_str(
                    &lookup,
                    "SECRET_MANAGER_ENDPOINT",
                    &defaults.secret_manager,
                ),
                metadata: lookup_str(&lookup, "METADATA_ENDPOINT", &defaults.metadata),
            },
            backoff_min_secs: lookup_or_default(
                &lookup,
                "BACKOFF_MIN_SECONDS",
                DEFAULT_BACKOFF_MIN_SECS,
            ),
            backoff_max_secs: lookup_or_default(
                &lookup,
                "BACKOFF_MAX_SECONDS",
                DEFAULT_BACKOFF_MAX_SECS,
            ),
            log_format: lookup_str(&lookup, "LOG_FORMAT", "text"),
        }
    }
}

/// Requested ServiceAccount token lifetime.
///
/// Unset, unparsable or non-positive input yields the floor; values below the
/// floor are raised to it; anything above is honored as-is.
#[must_use]
pub fn token_expiration_secs(raw: Option<&str>) -> i64 {
    match raw.and_then(|v| v.trim().parse::<i64>().ok()) {
        Some(secs) if secs > 0 => secs.max(MIN_TOKEN_EXPIRATION_SECS),
        _ => MIN_TOKEN_EXPIRATION_SECS,
    }
}

/// Strictly positive whole seconds, otherwise `default_secs`
fn positive_secs(raw: Option<&str>, default_secs: u64) -> Duration {
    let secs = raw
        .and_then(|v| v.trim().parse::<i64>().ok())
        .and_then(|v| u64::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(default_secs);
    Duration::from_secs(secs)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> ControllerConfig {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        ControllerConfig::from_lookup(|key| env.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_env_empty() {
        let config = config_from(&[]);
        assert_eq!(config.service_account, None);
        assert_eq!(config.wif_audience, None);
        assert_eq!(config.token_expiration_secs, 600);
        assert_eq!(config.token_request_timeout, Duration::from_secs(10));
        assert_eq!(config.http_timeout, Duration::from_secs(30));
        assert_eq!(config.resync_interval, Duration::from_secs(300));
        assert!(!config.trusted_subsystem);
        assert_eq!(config.endpoints, GcpEndpoints::default());
    }

    #[test]
    fn test_token_lifetime_floor() {
        assert_eq!(token_expiration_secs(Some("60")), 600);
        assert_eq!(token_expiration_secs(Some("600")), 600);
        assert_eq!(token_expiration_secs(Some("3600")), 3600);
        assert_eq!(token_expiration_secs(None), 600);
        assert_eq!(token_expiration_secs(Some("0")), 600);
        assert_eq!(token_expiration_secs(Some("-5")), 600);
        assert_eq!(token_expiration_secs(Some("ten minutes")), 600);
    }

    #[test]
    fn test_resync_interval_falls_back_on_non_positive() {
        assert_eq!(
            config_from(&[("RESYNC_INTERVAL_SECONDS", "45")]).resync_interval,
            Duration::from_secs(45)
        );
        assert_eq!(
            config_from(&[("RESYNC_INTERVAL_SECONDS", "0")]).resync_interval,
            Duration::from_secs(300)
        );
        assert_eq!(
            config_from(&[("RESYNC_INTERVAL_SECONDS", "-30")]).resync_interval,
            Duration::from_secs(300)
        );
        assert_eq!(
            config_from(&[("RESYNC_INTERVAL_SECONDS", "5m")]).resync_interval,
            Duration::from_secs(300)
        );
    }

    #[test]
    fn test_http_timeout_override() {
        assert_eq!(
            config_from(&[("HTTP_TIMEOUT_SECONDS", "5")]).http_timeout,
            Duration::from_secs(5)
        );
        assert_eq!(
            config_from(&[("HTTP_TIMEOUT_SECONDS", "0")]).http_timeout,
            Duration::from_secs(30)
        );
    }

    #[test]
    fn test_identity_overrides_and_trusted_flag() {
        let config = config_from(&[
            ("KSA", "gsm-reader"),
            ("WIFAUDIENCE", "  "),
            ("TRUSTED_SUBSYSTEM", "yes"),
            ("SECRET_MANAGER_ENDPOINT", "http://127.0.0.1:9000"),
        ]);
        assert_eq!(config.service_account.as_deref(), Some("gsm-reader"));
        assert_eq!(config.wif_audience, None);
        assert!(config.trusted_subsystem);
        assert_eq!(config.endpoints.secret_manager, "http://127.0.0.1:9000");
        assert_eq!(config.endpoints.sts, DEFAULT_STS_ENDPOINT);
    }
}
