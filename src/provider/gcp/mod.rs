//! # GCP Secret Manager
//!
//! Read-only Google Cloud Secret Manager access over REST.

pub mod client;

pub use client::responses::error_from_response;
pub use client::{SecretManagerConnector, SecretManagerREST};
