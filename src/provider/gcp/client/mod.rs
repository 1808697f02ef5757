//! # GCP Client
//!
//! REST client for Secret Manager and the Google API response types.

pub mod responses;
mod rest;

pub use rest::{SecretManagerConnector, SecretManagerREST};
