//! # Secret Entry Resolver
//!
//! Fetches every entry's Secret Manager version and expands it into target
//! key/value pairs.
//!
//! - **Literal key** (`key`): the raw payload is stored under one key.
//! - **Key mappings** (`keys`): the payload is parsed as JSON once and each
//!   mapping picks a value out with a JSON Pointer. A target key starting with
//!   `/` is itself a pointer and must resolve to a string.
//!
//! Extracted values are re-serialized as JSON, so a string field `"val"` is
//! stored as the quoted bytes `"val"`.

use crate::crd::SecretEntry;
use crate::error::{Error, Result};
use crate::provider::{SecretStore, SecretVersionName};
use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::debug;

/// Valid Kubernetes Secret data key
#[allow(clippy::expect_used, reason = "The pattern is a literal and always compiles")]
static TARGET_KEY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9._-]+$").expect("static regex is valid"));

/// One resolved target key and its bytes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyedPayload {
    pub key: String,
    pub value: Vec<u8>,
}

impl KeyedPayload {
    #[must_use]
    pub fn new(key: impl Into<String>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// Does `key` match the Secret data key syntax?
#[must_use]
pub fn is_valid_target_key(key: &str) -> bool {
    TARGET_KEY.is_match(key)
}

fn validate_target_key(key: &str) -> Result<()> {
    if is_valid_target_key(key) {
        Ok(())
    } else {
        Err(Error::Validation(format!(
            "key {key:?} does not match pattern {}",
            TARGET_KEY.as_str()
        )))
    }
}

/// Fetch and expand `entries` in order.
///
/// Duplicate target keys are kept in the output; the builder applies
/// last-write-wins when it folds them into the Secret.
///
/// # Errors
///
/// [`Error::Validation`] for an invalid literal key or a key/keys exclusivity
/// violation. Fetch and JSON failures keep their kind and are prefixed with the
/// offending key and secret version.
pub async fn resolve_entries(
    store: &dyn SecretStore,
    entries: &[SecretEntry],
) -> Result<Vec<KeyedPayload>> {
    let mut payloads = Vec::with_capacity(entries.len());

    for entry in entries {
        let name = SecretVersionName::new(&entry.project_id, &entry.secret_id, &entry.version);
        let entry_label = entry.key.clone().unwrap_or_else(|| {
            entry
                .keys
                .iter()
                .flatten()
                .map(|m| m.key.as_str())
                .collect::<Vec<_>>()
                .join(",")
        });
        let wrap = |label: &str, err: Error| {
            err.context(format!(
                "fetch payload for key {label:?} (project={}, secret={}, version={})",
                name.project, name.secret, name.version
            ))
        };

        match (&entry.key, &entry.keys) {
            (Some(_), Some(_)) => {
                return Err(wrap(entry_label.as_str(), Error::Validation(
                    "cannot set both key and keys".to_string(),
                )))
            }
            (None, None) => {
                return Err(wrap(entry_label.as_str(), Error::Validation(
                    "either key or keys must be set".to_string(),
                )))
            }
            (None, Some(mappings)) if mappings.is_empty() => {
                return Err(wrap(entry_label.as_str(), Error::Validation(
                    "either key or keys must be set".to_string(),
                )))
            }
            (Some(key), None) => {
                validate_target_key(key).map_err(|e| wrap(key.as_str(), e))?;
                let raw = store.access_version(&name).await.map_err(|e| wrap(key.as_str(), e))?;
                debug!(key = %key, version = %name, bytes = raw.len(), "Resolved literal key");
                payloads.push(KeyedPayload::new(key.clone(), raw));
            }
            (None, Some(mappings)) => {
                // An empty pointer addresses the whole document
                if let Some(mapping) = mappings.iter().find(|m| m.value.is_empty()) {
                    return Err(wrap(mapping.key.as_str(), Error::Validation(
                        "mapping value must be a non-empty JSON Pointer".to_string(),
                    )));
                }

                let raw = store
                    .access_version(&name)
                    .await
                    .map_err(|e| wrap(entry_label.as_str(), e))?;
                let document: Value = serde_json::from_slice(&raw).map_err(|e| {
                    wrap(entry_label.as_str(), Error::Upstream(format!("payload is not valid JSON: {e}")))
                })?;

                for mapping in mappings {
                    let value = document.pointer(&mapping.value).ok_or_else(|| {
                        wrap(mapping.key.as_str(), Error::Upstream(format!(
                            "pointer {:?} does not resolve in payload",
                            mapping.value
                        )))
                    })?;
                    let key = resolve_target_key(&document, &mapping.key)
                        .map_err(|e| wrap(mapping.key.as_str(), e))?;
                    let bytes = serde_json::to_vec(value).map_err(|e| {
                        wrap(mapping.key.as_str(), Error::Upstream(format!(
                            "cannot serialize value at {:?}: {e}",
                            mapping.value
                        )))
                    })?;
                    debug!(key = %key, pointer = %mapping.value, version = %name, "Resolved mapped key");
                    payloads.push(KeyedPayload::new(key, bytes));
                }
            }
        }
    }

    Ok(payloads)
}

/// Literal keys are used as-is; `/`-prefixed keys are looked up in the payload.
/// Failures derived from payload content are upstream errors, not terminal ones.
fn resolve_target_key(document: &Value, key: &str) -> Result<String> {
    if !key.starts_with('/') {
        return validate_target_key(key).map(|()| key.to_string());
    }

    let resolved = document.pointer(key).ok_or_else(|| {
        Error::Upstream(format!("key pointer {key:?} does not resolve in payload"))
    })?;
    let Value::String(resolved) = resolved else {
        return Err(Error::Upstream(format!(
            "key pointer {key:?} resolved to {resolved}, which is not a string"
        )));
    };
    if !is_valid_target_key(resolved) {
        return Err(Error::Upstream(format!(
            "key pointer {key:?} resolved to {resolved:?}, which does not match pattern {}",
            TARGET_KEY.as_str()
        )));
    }
    Ok(resolved.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crd::KeyMapping;
    use crate::provider::MockSecretStore;
    use mockall::predicate::eq;

    fn literal(key: &str, secret: &str, version: &str) -> SecretEntry {
        SecretEntry {
            key: Some(key.to_string()),
            keys: None,
            project_id: "p".to_string(),
            secret_id: secret.to_string(),
            version: version.to_string(),
        }
    }

    fn mapped(secret: &str, mappings: &[(&str, &str)]) -> SecretEntry {
        SecretEntry {
            key: None,
            keys: Some(
                mappings
                    .iter()
                    .map(|(k, v)| KeyMapping {
                        key: (*k).to_string(),
                        value: (*v).to_string(),
                    })
                    .collect(),
            ),
            project_id: "p".to_string(),
            secret_id: secret.to_string(),
            version: "1".to_string(),
        }
    }

    fn store_with(payloads: &[(&'static str, &'static str)]) -> MockSecretStore {
        let mut store = MockSecretStore::new();
        for &(secret, body) in payloads {
            store
                .expect_access_version()
                .withf(move |name| name.secret == secret)
                .returning(move |_| Ok(body.as_bytes().to_vec()));
        }
        store
    }

    #[tokio::test]
    async fn test_literal_key_scenario() {
        let mut store = MockSecretStore::new();
        store
            .expect_access_version()
            .with(eq(SecretVersionName::new("p", "s", "1")))
            .times(1)
            .returning(|_| Ok(b"value".to_vec()));

        let payloads = resolve_entries(&store, &[literal("K", "s", "1")])
            .await
            .unwrap();
        assert_eq!(payloads, vec![KeyedPayload::new("K", b"value".to_vec())]);
    }

    #[tokio::test]
    async fn test_empty_version_fetches_latest() {
        let mut store = MockSecretStore::new();
        store
            .expect_access_version()
            .withf(|name| name.version == "latest")
            .times(1)
            .returning(|_| Ok(b"v".to_vec()));

        resolve_entries(&store, &[literal("K", "s", "")])
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_key_mapping_scenario_with_pointer_key() {
        let store = store_with(&[("json", r#"{"k":"ENV_KEY","v":"val"}"#)]);

        let payloads = resolve_entries(&store, &[mapped("json", &[("/k", "/v")])])
            .await
            .unwrap();
        assert_eq!(
            payloads,
            vec![KeyedPayload::new("ENV_KEY", br#""val""#.to_vec())]
        );
    }

    #[tokio::test]
    async fn test_key_mapping_literal_key_and_nested_value() {
        let store = store_with(&[(
            "json",
            r#"{"db":{"port":5432,"opts":{"ssl":true}}}"#,
        )]);

        let payloads = resolve_entries(
            &store,
            &[mapped("json", &[("DB_PORT", "/db/port"), ("DB_OPTS", "/db/opts")])],
        )
        .await
        .unwrap();
        assert_eq!(payloads[0], KeyedPayload::new("DB_PORT", b"5432".to_vec()));
        assert_eq!(
            payloads[1],
            KeyedPayload::new("DB_OPTS", br#"{"ssl":true}"#.to_vec())
        );
    }

    #[tokio::test]
    async fn test_payload_is_parsed_once_per_entry() {
        let mut store = MockSecretStore::new();
        store
            .expect_access_version()
            .times(1)
            .returning(|_| Ok(br#"{"a":"1","b":"2"}"#.to_vec()));

        let payloads = resolve_entries(&store, &[mapped("json", &[("A", "/a"), ("B", "/b")])])
            .await
            .unwrap();
        assert_eq!(payloads.len(), 2);
    }

    #[tokio::test]
    async fn test_entries_keep_order_for_last_write_wins() {
        let store = store_with(&[("first", "v1"), ("second", "v2")]);

        let payloads = resolve_entries(&store, &[literal("K", "first", "1"), literal("K", "second", "1")])
            .await
            .unwrap();
        assert_eq!(
            payloads,
            vec![
                KeyedPayload::new("K", b"v1".to_vec()),
                KeyedPayload::new("K", b"v2".to_vec())
            ]
        );
    }

    #[tokio::test]
    async fn test_invalid_literal_key_is_terminal_and_skips_fetch() {
        let mut store = MockSecretStore::new();
        store.expect_access_version().times(0);

        let err = resolve_entries(&store, &[literal("bad key!", "s", "1")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.is_terminal());
        assert!(err.to_string().contains("does not match pattern"));
        assert!(err.to_string().contains("project=p, secret=s, version=1"));
    }

    #[tokio::test]
    async fn test_key_pointer_to_non_string_is_rejected() {
        let store = store_with(&[("json", r#"{"k":42,"v":"val"}"#)]);

        let err = resolve_entries(&store, &[mapped("json", &[("/k", "/v")])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not a string"));
    }

    #[tokio::test]
    async fn test_key_pointer_to_invalid_key_is_rejected() {
        let store = store_with(&[("json", r#"{"k":"has space","v":"val"}"#)]);

        let err = resolve_entries(&store, &[mapped("json", &[("/k", "/v")])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not match pattern"));
    }

    #[tokio::test]
    async fn test_unresolved_value_pointer_is_an_error() {
        let store = store_with(&[("json", r#"{"a":"1"}"#)]);

        let err = resolve_entries(&store, &[mapped("json", &[("A", "/missing")])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("/missing"));
    }

    #[tokio::test]
    async fn test_mapping_failures_name_the_target_key() {
        let store = store_with(&[("json", r#"{"a":"1"}"#)]);

        let err = resolve_entries(
            &store,
            &[mapped("json", &[("A", "/a"), ("B", "/missing")])],
        )
        .await
        .unwrap_err();
        assert!(err.to_string().contains("fetch payload for key \"B\""));
        assert!(!err.to_string().contains("mapping(s)"));
    }

    #[tokio::test]
    async fn test_empty_value_pointer_is_rejected_before_fetch() {
        let mut store = MockSecretStore::new();
        store.expect_access_version().times(0);

        let err = resolve_entries(&store, &[mapped("json", &[("A", "/a"), ("WHOLE", "")])])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("key \"WHOLE\""));
        assert!(err.to_string().contains("non-empty JSON Pointer"));
    }

    #[tokio::test]
    async fn test_non_json_payload_is_an_error() {
        let store = store_with(&[("json", "not json")]);

        let err = resolve_entries(&store, &[mapped("json", &[("A", "/a")])])
            .await
            .unwrap_err();
        assert!(err.to_string().contains("not valid JSON"));
    }

    #[tokio::test]
    async fn test_key_and_keys_exclusivity_is_double_checked() {
        let mut store = MockSecretStore::new();
        store.expect_access_version().times(0);

        let mut both = mapped("json", &[("A", "/a")]);
        both.key = Some("K".to_string());
        let err = resolve_entries(&store, &[both]).await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(err.to_string().contains("cannot set both key and keys"));

        let mut neither = literal("K", "s", "1");
        neither.key = None;
        let err = resolve_entries(&store, &[neither]).await.unwrap_err();
        assert!(err.to_string().contains("either key or keys must be set"));
    }

    #[tokio::test]
    async fn test_fetch_errors_keep_their_kind() {
        let mut store = MockSecretStore::new();
        store
            .expect_access_version()
            .returning(|_| Err(Error::NotFound("HTTP 404".to_string())));

        let err = resolve_entries(&store, &[literal("K", "s", "3")])
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(!err.is_terminal());
        assert!(err.to_string().contains("fetch payload for key \"K\""));
    }

    #[test]
    fn test_target_key_syntax() {
        assert!(is_valid_target_key("DATABASE_URL"));
        assert!(is_valid_target_key("tls.crt"));
        assert!(is_valid_target_key("a-b_c.d"));
        assert!(!is_valid_target_key(""));
        assert!(!is_valid_target_key("a/b"));
        assert!(!is_valid_target_key("a b"));
    }
}
