//! # Controller
//!
//! Core controller modules for the GSM Secret Controller.
//!
//! - `backoff`: Fibonacci backoff mechanism for retries
//! - `builder`: Folds resolved payloads into the desired Secret
//! - `filter`: Change predicates gating which watch events trigger a reconcile
//! - `kube_client`: The slice of the Kubernetes API the controller uses
//! - `reconciler`: Core reconciliation logic
//! - `resolver`: Fetches Secret Manager versions and expands them into keys
//! - `server`: HTTP server for metrics and health checks

pub mod backoff;
pub mod builder;
#[cfg(test)]
pub(crate) mod fake;
pub mod filter;
pub mod kube_client;
pub mod reconciler;
pub mod resolver;
pub mod server;
