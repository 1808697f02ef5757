//! # CRD Generator
//!
//! Generates the `GSMSecret` CustomResourceDefinition YAML from the Rust types.
//!
//! ## Usage
//!
//! ```bash
//! # Generate CRD YAML
//! cargo run --bin crdgen > config/crd/gsmsecret.yaml
//!
//! # Generate and apply directly
//! cargo run --bin crdgen | kubectl apply -f -
//! ```
//!
//! The generated CRD includes:
//! - OpenAPI schema validation, including the CEL rules on entries
//! - Printer columns (Target, Ready, Reason, Age)
//! - Status subresource

use anyhow::{Context, Result};
use gsm_secret_controller::crd::GsmSecret;
use kube::core::CustomResourceExt;

fn main() -> Result<()> {
    let crd = GsmSecret::crd();
    let yaml = serde_yaml::to_string(&crd).context("Failed to serialize CRD to YAML")?;

    println!("# This file is auto-generated by crdgen");
    println!("# DO NOT EDIT THIS FILE MANUALLY");
    println!("# Fix schema problems in src/crd and regenerate");
    println!("---");
    print!("{yaml}");
    Ok(())
}
