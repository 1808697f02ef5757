//! Pact contract tests for IAM Credentials `generateAccessToken`
//!
//! Covers service account impersonation with a federated caller token.

mod common;

use chrono::{TimeZone, Utc};
use common::{base_url, init_rustls};
use gsm_secret_controller::error::Error;
use gsm_secret_controller::identity::{AccessToken, FederatedCredential, IamCredentialsClient};
use pact_consumer::prelude::*;
use serde_json::json;

const SERVICE_ACCOUNT: &str = "reader@my-project.iam.gserviceaccount.com";

fn federated() -> FederatedCredential {
    FederatedCredential::expiring_in(AccessToken::new("federated-token"), "Bearer", 3600)
}

#[tokio::test]
async fn test_generate_access_token_contract() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "Google-IAM-Credentials");

    pact_builder.interaction("impersonate a Google service account", "", |mut i| {
        i.given("the federated principal holds roles/iam.serviceAccountTokenCreator");
        i.request
            .method("POST")
            .path(format!(
                "/v1/projects/-/serviceAccounts/{SERVICE_ACCOUNT}:generateAccessToken"
            ))
            .header("authorization", "Bearer federated-token")
            .json_body(json!({
                "scope": ["https://www.googleapis.com/auth/cloud-platform"],
                "lifetime": "3600s"
            }));
        i.response
            .status(200)
            .header("content-type", "application/json")
            .json_body(json!({
                "accessToken": "impersonated-token",
                "expireTime": "2030-01-01T00:00:00Z"
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = IamCredentialsClient::new(reqwest::Client::new(), base_url(mock_server.url()));

    let credential = client
        .generate_access_token(&federated(), SERVICE_ACCOUNT)
        .await
        .expect("impersonation should succeed");

    assert_eq!(credential.access_token.secret(), "impersonated-token");
    assert_eq!(
        credential.expires_at,
        Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap()
    );
}

#[tokio::test]
async fn test_missing_token_creator_binding_is_authorization_error() {
    init_rustls();
    let mut pact_builder = PactBuilder::new("GSM-Secret-Controller", "Google-IAM-Credentials");

    pact_builder.interaction("impersonate without the token creator role", "", |mut i| {
        i.given("the federated principal lacks roles/iam.serviceAccountTokenCreator");
        i.request.method("POST").path(format!(
            "/v1/projects/-/serviceAccounts/{SERVICE_ACCOUNT}:generateAccessToken"
        ));
        i.response
            .status(403)
            .header("content-type", "application/json")
            .json_body(json!({
                "error": {
                    "code": 403,
                    "message": "Permission 'iam.serviceAccounts.getAccessToken' denied on resource (or it may not exist).",
                    "status": "PERMISSION_DENIED"
                }
            }));
        i
    });

    let mock_server = pact_builder.start_mock_server(None, None);
    let client = IamCredentialsClient::new(reqwest::Client::new(), base_url(mock_server.url()));

    let err = client
        .generate_access_token(&federated(), SERVICE_ACCOUNT)
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Authorization(_)), "got {err:?}");
    assert!(err.to_string().contains(SERVICE_ACCOUNT));
}
