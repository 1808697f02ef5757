//! # Errors
//!
//! Error taxonomy shared by the identity broker, the secret resolver, the
//! builder and the apply step.
//!
//! Every variant carries a human-readable message that already includes the
//! offending identity, key or resource so status conditions stay diagnosable
//! without logs. [`Error::is_terminal`] tells the error policy whether a quick
//! retry has any chance of succeeding.

use std::future::Future;
use std::time::Duration;
use thiserror::Error;

/// Result alias used across the controller library
pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum Error {
    /// Missing audience, unsupported mode combination or a malformed resource
    #[error("configuration error: {0}")]
    Configuration(String),

    /// RBAC or IAM denial at any federation or fetch step
    #[error("authorization denied: {0}")]
    Authorization(String),

    /// Non-2xx or malformed response from an identity or secret store API
    #[error("upstream error: {0}")]
    Upstream(String),

    /// Missing ServiceAccount or missing secret version
    #[error("not found: {0}")]
    NotFound(String),

    /// Target key syntax or key/keys exclusivity violated
    #[error("validation error: {0}")]
    Validation(String),

    #[error("{operation} timed out after {}s", .after.as_secs())]
    Timeout { operation: String, after: Duration },

    #[error("kubernetes API error: {0}")]
    Kube(#[from] kube::Error),
}

impl Error {
    /// Configuration and validation failures will not heal on a quick retry.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Error::Configuration(_) | Error::Validation(_))
    }

    /// Stable label for metrics and structured logs
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Error::Configuration(_) => "configuration",
            Error::Authorization(_) => "authorization",
            Error::Upstream(_) => "upstream",
            Error::NotFound(_) => "not-found",
            Error::Validation(_) => "validation",
            Error::Timeout { .. } => "timeout",
            Error::Kube(_) => "kubernetes",
        }
    }

    /// Prefix the message with `context` while keeping the error kind.
    #[must_use]
    pub fn context(self, context: impl std::fmt::Display) -> Self {
        match self {
            Error::Configuration(msg) => Error::Configuration(format!("{context}: {msg}")),
            Error::Authorization(msg) => Error::Authorization(format!("{context}: {msg}")),
            Error::Upstream(msg) => Error::Upstream(format!("{context}: {msg}")),
            Error::NotFound(msg) => Error::NotFound(format!("{context}: {msg}")),
            Error::Validation(msg) => Error::Validation(format!("{context}: {msg}")),
            Error::Timeout { operation, after } => Error::Timeout {
                operation: format!("{context}: {operation}"),
                after,
            },
            Error::Kube(err) => Error::Upstream(format!("{context}: {err}")),
        }
    }
}

// Transport failures. Deadlines are enforced by `with_deadline`, not here.
impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Upstream(err.to_string())
    }
}

/// Run `fut` under a hard deadline, mapping expiry to [`Error::Timeout`].
///
/// # Errors
///
/// Returns [`Error::Timeout`] if the deadline passes, otherwise whatever `fut` returns.
pub async fn with_deadline<T, F>(operation: &str, after: Duration, fut: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(after, fut).await {
        Ok(result) => result,
        Err(_elapsed) => Err(Error::Timeout {
            operation: operation.to_string(),
            after,
        }),
    }
}
