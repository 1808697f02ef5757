//! # Constants
//!
//! Shared constants used throughout the controller.
//!
//! These values represent reasonable defaults and can be overridden via
//! configuration or environment variables where applicable.

/// Default HTTP server port for metrics and health probes
pub const DEFAULT_METRICS_PORT: u16 = 5000;

/// Default HTTP server startup timeout (how long to wait for server to be ready)
pub const DEFAULT_SERVER_STARTUP_TIMEOUT_SECS: u64 = 10;

/// Default HTTP server readiness poll interval
pub const DEFAULT_SERVER_POLL_INTERVAL_MS: u64 = 50;

/// Default resync interval after a successful reconcile (seconds)
///
/// This is the only mechanism by which changes made directly in Secret Manager
/// are picked up.
pub const DEFAULT_RESYNC_INTERVAL_SECS: u64 = 300;

/// Default timeout for every outbound HTTP call and target Secret read/write (seconds)
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Default timeout for the Kubernetes `TokenRequest` call (seconds)
pub const DEFAULT_TOKEN_REQUEST_TIMEOUT_SECS: u64 = 10;

/// Minimum `expirationSeconds` the API server accepts for a bound ServiceAccount token.
/// Also the default when nothing is configured.
pub const MIN_TOKEN_EXPIRATION_SECS: i64 = 600;

/// Lifetime requested for impersonated service account tokens
pub const IMPERSONATED_TOKEN_LIFETIME: &str = "3600s";

/// ServiceAccount used for federation when neither annotation nor `KSA` is set
pub const DEFAULT_SERVICE_ACCOUNT: &str = "default";

/// Secret Manager version used when an entry leaves `version` empty
pub const LATEST_VERSION: &str = "latest";

/// OAuth scope requested for every Google access token
pub const CLOUD_PLATFORM_SCOPE: &str = "https://www.googleapis.com/auth/cloud-platform";

/// Default Google Security Token Service base URL
pub const DEFAULT_STS_ENDPOINT: &str = "https://sts.googleapis.com";

/// Default IAM Credentials API base URL
pub const DEFAULT_IAM_CREDENTIALS_ENDPOINT: &str = "https://iamcredentials.googleapis.com";

/// Default Secret Manager API base URL
pub const DEFAULT_SECRET_MANAGER_ENDPOINT: &str = "https://secretmanager.googleapis.com";

/// Default GCE/GKE metadata server base URL
pub const DEFAULT_METADATA_ENDPOINT: &str = "http://metadata.google.internal";

/// Field manager / controller name used in logs and owner bookkeeping
pub const CONTROLLER_NAME: &str = "gsm-secret-controller";

/// Fibonacci backoff floor for failed reconciles (seconds)
pub const DEFAULT_BACKOFF_MIN_SECS: u64 = 5;

/// Fibonacci backoff ceiling for failed reconciles (seconds)
pub const DEFAULT_BACKOFF_MAX_SECS: u64 = 300;
