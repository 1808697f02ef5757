//! Pact contract tests for GCP Secret Manager `versions/{v}:access`
//!
//! The controller only ever reads versions, so this is the whole contract.

mod common;

use common::{base_url, init_rustls};
use gsm_secret_controller::error::Error;
use gsm_secret_controller::identity::{AccessToken, Credential, FederatedCredential};
use gsm_secret_controller::provider::gcp::SecretManagerREST;
use gsm_secret_controller::provider::{SecretStore, SecretVersionName};
use pact_consumer::prelude::*;
use serde_json::json;
use std::time::Duration;

fn store(base: String) -> SecretManagerREST {
    let credential = Credential::Federated(FederatedCredential::expiring_in(
        AccessToken::new("test-token"),
        "Bearer",
        3600,
    ));
    SecretManagerREST::new(
        reqwest::Client::new(),
        base,
        credential,
        Duration::from_secs(10),
    )
}

#[tokio::test]
async fn test_access_version_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "GCP-Secret-Manager");

    pact_builder.interaction("access a secret version", "", |mut i| {
        i.given("version 3 of secret app-config exists");
        i.request
            .method("GET")
            .path("/v1/projects/test-project/secrets/app-config/versions/3:access")
            .header("authorization", "Bearer test-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/123456/secrets/app-config/versions/3",
                "payload": {
                    // {"api":{"token":"t0k"}}
                    "data": "eyJhcGkiOnsidG9rZW4iOiJ0MGsifX0=",
                    "dataCrc32c": "1183489021"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = store(base_url(mock_server.url()));

    let payload = client
        .access_version(&SecretVersionName::new("test-project", "app-config", "3"))
        .await
        .expect("access should succeed");

    assert_eq!(payload, br#"{"api":{"token":"t0k"}}"#.to_vec());
}

#[tokio::test]
async fn test_empty_version_reads_latest() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "GCP-Secret-Manager");

    pact_builder.interaction("access the latest secret version", "", |mut i| {
        i.given("secret database-url has an enabled version");
        i.request
            .method("GET")
            .path("/v1/projects/test-project/secrets/database-url/versions/latest:access")
            .header("authorization", "Bearer test-token");
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "name": "projects/123456/secrets/database-url/versions/7",
                "payload": { "data": "cG9zdGdyZXM6Ly9kYg==" }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = store(base_url(mock_server.url()));

    let payload = client
        .access_version(&SecretVersionName::new("test-project", "database-url", ""))
        .await
        .expect("access should succeed");

    assert_eq!(payload, b"postgres://db".to_vec());
}

#[tokio::test]
async fn test_missing_version_is_not_found() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "GCP-Secret-Manager");

    pact_builder.interaction("access a version that does not exist", "", |mut i| {
        i.given("secret app-config has no version 99");
        i.request
            .method("GET")
            .path("/v1/projects/test-project/secrets/app-config/versions/99:access");
        i.response
            .status(404)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 404,
                    "message": "Secret Version [projects/123456/secrets/app-config/versions/99] not found.",
                    "status": "NOT_FOUND"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = store(base_url(mock_server.url()));

    let err = client
        .access_version(&SecretVersionName::new("test-project", "app-config", "99"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::NotFound(_)), "got {err:?}");
    assert!(!err.is_terminal());
}

#[tokio::test]
async fn test_permission_denied_is_authorization_error() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "GCP-Secret-Manager");

    pact_builder.interaction("access a secret without secretAccessor", "", |mut i| {
        i.given("the caller lacks roles/secretmanager.secretAccessor");
        i.request
            .method("GET")
            .path("/v1/projects/test-project/secrets/app-config/versions/latest:access");
        i.response
            .status(403)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 403,
                    "message": "Permission 'secretmanager.versions.access' denied for resource.",
                    "status": "PERMISSION_DENIED"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = store(base_url(mock_server.url()));

    let err = client
        .access_version(&SecretVersionName::new("test-project", "app-config", "latest"))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization(_)), "got {err:?}");
}
