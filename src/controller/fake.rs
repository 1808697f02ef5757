//! In-memory [`ClusterClient`] for reconciler tests.

use super::kube_client::ClusterClient;
use crate::crd::{GsmSecret, GsmSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::TokenRequest;
use k8s_openapi::api::core::v1::Secret;
use kube::error::ErrorResponse;
use std::collections::BTreeMap;
use std::sync::Mutex;

type Key = (String, String);

fn api_error(code: u16, reason: &str, message: String) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message,
        reason: reason.to_string(),
        code,
    })
}

/// Stores GSMSecrets and Secrets, bumps `resourceVersion` on every write and
/// enforces optimistic concurrency on replace like the API server does.
#[derive(Debug, Default)]
pub struct FakeCluster {
    pub gsm_secrets: Mutex<BTreeMap<Key, GsmSecret>>,
    pub secrets: Mutex<BTreeMap<Key, Secret>>,
    pub status_writes: Mutex<u32>,
    pub fail_secret_writes: Mutex<Option<u16>>,
    version: Mutex<u64>,
}

impl FakeCluster {
    pub fn with_gsm_secret(gsm: GsmSecret) -> Self {
        let fake = Self::default();
        fake.insert_gsm_secret(gsm);
        fake
    }

    pub fn insert_gsm_secret(&self, gsm: GsmSecret) {
        let key = (
            gsm.metadata.namespace.clone().unwrap_or_default(),
            gsm.metadata.name.clone().unwrap_or_default(),
        );
        self.gsm_secrets.lock().unwrap().insert(key, gsm);
    }

    pub fn insert_secret(&self, mut secret: Secret) {
        secret.metadata.resource_version = Some(self.next_version());
        let key = (
            secret.metadata.namespace.clone().unwrap_or_default(),
            secret.metadata.name.clone().unwrap_or_default(),
        );
        self.secrets.lock().unwrap().insert(key, secret);
    }

    pub fn secret(&self, namespace: &str, name: &str) -> Option<Secret> {
        self.secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned()
    }

    pub fn status(&self, namespace: &str, name: &str) -> Option<GsmSecretStatus> {
        self.gsm_secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .and_then(|gsm| gsm.status.clone())
    }

    fn next_version(&self) -> String {
        let mut version = self.version.lock().unwrap();
        *version += 1;
        version.to_string()
    }

    fn injected_failure(&self) -> Option<kube::Error> {
        self.fail_secret_writes
            .lock()
            .unwrap()
            .map(|code| api_error(code, "Injected", "injected failure".to_string()))
    }
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn get_gsm_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<GsmSecret>, kube::Error> {
        Ok(self
            .gsm_secrets
            .lock()
            .unwrap()
            .get(&(namespace.to_string(), name.to_string()))
            .cloned())
    }

    async fn patch_gsm_secret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GsmSecretStatus,
    ) -> Result<(), kube::Error> {
        let mut gsm_secrets = self.gsm_secrets.lock().unwrap();
        let gsm = gsm_secrets
            .get_mut(&(namespace.to_string(), name.to_string()))
            .ok_or_else(|| api_error(404, "NotFound", format!("gsmsecrets {name} not found")))?;
        gsm.status = Some(status.clone());
        *self.status_writes.lock().unwrap() += 1;
        Ok(())
    }

    async fn get_secret(&self, namespace: &str, name: &str) -> Result<Option<Secret>, kube::Error> {
        Ok(self.secret(namespace, name))
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, kube::Error> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        if self.secrets.lock().unwrap().contains_key(&key) {
            return Err(api_error(409, "AlreadyExists", format!("secrets {name} already exists")));
        }
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(self.next_version());
        self.secrets.lock().unwrap().insert(key, stored.clone());
        Ok(stored)
    }

    async fn replace_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, kube::Error> {
        if let Some(err) = self.injected_failure() {
            return Err(err);
        }
        let name = secret.metadata.name.clone().unwrap_or_default();
        let key = (namespace.to_string(), name.clone());
        let current_version = self
            .secrets
            .lock()
            .unwrap()
            .get(&key)
            .and_then(|s| s.metadata.resource_version.clone())
            .ok_or_else(|| api_error(404, "NotFound", format!("secrets {name} not found")))?;
        if secret.metadata.resource_version.as_deref() != Some(current_version.as_str()) {
            return Err(api_error(409, "Conflict", "resourceVersion mismatch".to_string()));
        }
        let mut stored = secret.clone();
        stored.metadata.resource_version = Some(self.next_version());
        self.secrets.lock().unwrap().insert(key, stored.clone());
        Ok(stored)
    }

    async fn create_service_account_token(
        &self,
        _namespace: &str,
        service_account: &str,
        _request: &TokenRequest,
    ) -> Result<TokenRequest, kube::Error> {
        Err(api_error(
            404,
            "NotFound",
            format!("serviceaccounts {service_account} not found"),
        ))
    }
}
