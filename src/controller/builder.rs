//! # Secret Builder
//!
//! Folds resolved payloads into the desired Kubernetes Secret. Pure; no I/O.

use super::resolver::KeyedPayload;
use crate::crd::TargetRef;
use crate::error::{Error, Result};
use k8s_openapi::api::core::v1::Secret;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use k8s_openapi::ByteString;
use std::collections::BTreeMap;

/// Secret type written by the controller
pub const SECRET_TYPE_OPAQUE: &str = "Opaque";

/// Build the desired `Opaque` Secret named by `target` in `namespace`.
///
/// Later payloads overwrite earlier ones with the same key.
///
/// # Errors
///
/// [`Error::Validation`] if any payload has an empty key.
pub fn build_secret(
    target: &TargetRef,
    namespace: &str,
    payloads: Vec<KeyedPayload>,
) -> Result<Secret> {
    let mut data = BTreeMap::new();
    for payload in payloads {
        if payload.key.is_empty() {
            return Err(Error::Validation("payload has empty key".to_string()));
        }
        data.insert(payload.key, ByteString(payload.value));
    }

    Ok(Secret {
        metadata: ObjectMeta {
            name: Some(target.name.clone()),
            namespace: Some(namespace.to_string()),
            ..Default::default()
        },
        data: Some(data),
        type_: Some(SECRET_TYPE_OPAQUE.to_string()),
        ..Default::default()
    })
}
