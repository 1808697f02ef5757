//! # Response Types
//!
//! Google API response structures shared by the Secret Manager client and the
//! identity broker's IAM Credentials call.
//!
//! API Reference: https://cloud.google.com/secret-manager/docs/reference/rest

use crate::error::Error;
use reqwest::StatusCode;
use serde::Deserialize;

/// Response from `versions/{v}:access`
///
/// API Reference: https://cloud.google.com/secret-manager/docs/reference/rest/v1/projects.secrets.versions/access
#[derive(Debug, Deserialize)]
pub struct AccessSecretVersionResponse {
    /// Resolved version name (`latest` is replaced by the concrete number)
    #[serde(default)]
    pub name: String,
    pub payload: SecretPayload,
}

/// The `data` field is base64-encoded on the wire.
#[derive(Debug, Deserialize)]
pub struct SecretPayload {
    #[serde(default)]
    pub data: String,
}

/// Standard Google API error envelope
#[derive(Debug, Deserialize)]
pub struct GoogleErrorResponse {
    pub error: GoogleErrorBody,
}

#[derive(Debug, Deserialize)]
pub struct GoogleErrorBody {
    pub code: u16,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub status: String,
}

/// Classify a non-success Google API response.
///
/// 401/403 become [`Error::Authorization`], 404 becomes [`Error::NotFound`],
/// anything else is an [`Error::Upstream`]. The parsed `message`/`status` are
/// kept when the body is a Google error envelope, otherwise the raw body is.
#[must_use]
pub fn error_from_response(operation: &str, status: StatusCode, body: &str) -> Error {
    let detail = match serde_json::from_str::<GoogleErrorResponse>(body) {
        Ok(parsed) => format!(
            "{operation}: HTTP {} {}: {}",
            parsed.error.code, parsed.error.status, parsed.error.message
        ),
        Err(_) => format!("{operation}: HTTP {}: {}", status.as_u16(), body.trim()),
    };

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Error::Authorization(detail),
        StatusCode::NOT_FOUND => Error::NotFound(detail),
        _ => Error::Upstream(detail),
    }
}
