//! # GSMSecret Spec
//!
//! Desired state: which Secret Manager versions to read and how to lay them
//! out in the target Kubernetes Secret.

use serde::{Deserialize, Serialize};

/// GSMSecret Custom Resource Definition
///
/// Materializes one or more Google Secret Manager secret versions into a
/// single Kubernetes Secret owned by this resource.
///
/// # Example
///
/// ```yaml
/// apiVersion: secrets.pize.com/v1alpha1
/// kind: GSMSecret
/// metadata:
///   name: app-secrets
///   namespace: default
///   annotations:
///     secrets.pize.com/ksa: gsm-reader
/// spec:
///   targetRef:
///     name: app-env
///   entries:
///     - key: DATABASE_URL
///       projectId: my-project
///       secretId: database-url
///       version: "latest"
///     - projectId: my-project
///       secretId: app-config-json
///       version: "3"
///       keys:
///         - key: API_TOKEN
///           value: /api/token
///         - key: /tenant/envName
///           value: /tenant/value
/// ```
#[derive(
    kube::CustomResource, Debug, Clone, Deserialize, Serialize, PartialEq, schemars::JsonSchema,
)]
#[kube(
    kind = "GSMSecret",
    root = "GsmSecret",
    group = "secrets.pize.com",
    version = "v1alpha1",
    namespaced,
    status = "crate::crd::GsmSecretStatus",
    shortname = "gsms",
    printcolumn = r#"{"name":"Target", "type":"string", "jsonPath":".spec.targetRef.name"}, {"name":"Ready", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].status"}, {"name":"Reason", "type":"string", "jsonPath":".status.conditions[?(@.type==\"Ready\")].reason"}, {"name":"Age", "type":"date", "jsonPath":".metadata.creationTimestamp"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct GsmSecretSpec {
    /// Kubernetes Secret to create, update or adopt
    pub target_ref: TargetRef,
    /// Secret Manager versions to materialize, processed in order.
    /// When two entries produce the same key the later one wins.
    #[schemars(length(min = 1, max = 64))]
    pub entries: Vec<SecretEntry>,
}

/// Name of the Secret to materialize into, in the GSMSecret's own namespace
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct TargetRef {
    #[schemars(length(min = 1, max = 253))]
    pub name: String,
}

/// A single Secret Manager secret version and how it maps into Secret data
///
/// Exactly one of `key` (store the raw payload under one key) or `keys`
/// (treat the payload as JSON and pick fields out with JSON Pointers) must be set.
/// Admission enforces this through the CEL rules below.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
#[schemars(extend("x-kubernetes-validations" = [
    {
        "rule": "has(self.key) != has(self.keys)",
        "message": "exactly one of key or keys must be set"
    },
    {
        "rule": "!has(self.key) || self.key.matches('^[A-Za-z0-9._-]+$')",
        "message": "key must match ^[A-Za-z0-9._-]+$"
    },
    {
        "rule": "!has(self.version) || self.version == '' || self.version == 'latest' || self.version.matches('^[1-9][0-9]*$')",
        "message": "version must be a positive integer or \"latest\""
    }
]))]
pub struct SecretEntry {
    /// Literal key in the target Secret's data, e.g. `MY_ENVVAR`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(max = 253))]
    pub key: Option<String>,
    /// JSON Pointer mappings from a structured payload
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(length(min = 1, max = 64))]
    pub keys: Option<Vec<KeyMapping>>,
    /// GCP project that owns the secret
    #[schemars(length(min = 1, max = 30))]
    pub project_id: String,
    /// Secret Manager secret name
    #[schemars(length(min = 1, max = 255))]
    pub secret_id: String,
    /// Version number or `latest`. Empty means `latest`.
    #[serde(default)]
    #[schemars(length(max = 32))]
    pub version: String,
}

/// One `targetKey <- payload[sourcePointer]` mapping
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct KeyMapping {
    /// Literal target key, or a JSON Pointer (leading `/`) that resolves to
    /// a string inside the payload
    #[schemars(length(min = 1, max = 256))]
    pub key: String,
    /// JSON Pointer to the value inside the payload
    #[schemars(length(min = 1, max = 256))]
    pub value: String,
}

impl GsmSecretSpec {
    /// Name of the Secret this resource materializes into
    #[must_use]
    pub fn target_name(&self) -> &str {
        &self.target_ref.name
    }
}
