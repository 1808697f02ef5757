//! # Cluster Client
//!
//! The narrow slice of the Kubernetes API the reconciler and identity broker
//! need. Production code uses [`KubeClusterClient`], a thin wrapper over the
//! process-wide [`kube::Client`] built once at startup; tests substitute the
//! generated `MockClusterClient` or an in-memory fake.

use crate::crd::{GsmSecret, GsmSecretStatus};
use async_trait::async_trait;
use k8s_openapi::api::authentication::v1::TokenRequest;
use k8s_openapi::api::core::v1::{Secret, ServiceAccount};
use kube::api::{Api, Patch, PatchParams, PostParams};
use kube::Client;
use serde_json::json;

#[cfg(test)]
use mockall::automock;

/// Kubernetes operations used by the controller
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fresh read of a GSMSecret; `None` once it has been deleted
    async fn get_gsm_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<GsmSecret>, kube::Error>;

    /// Replace the status subresource
    async fn patch_gsm_secret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GsmSecretStatus,
    ) -> Result<(), kube::Error>;

    async fn get_secret(&self, namespace: &str, name: &str)
        -> Result<Option<Secret>, kube::Error>;

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, kube::Error>;

    /// Full update guarded by the object's `resourceVersion`
    async fn replace_secret(&self, namespace: &str, secret: &Secret)
        -> Result<Secret, kube::Error>;

    /// `POST serviceaccounts/{name}/token`
    async fn create_service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
        request: &TokenRequest,
    ) -> Result<TokenRequest, kube::Error>;
}

/// [`ClusterClient`] backed by a real API server connection
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl std::fmt::Debug for KubeClusterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KubeClusterClient").finish_non_exhaustive()
    }
}

impl KubeClusterClient {
    #[must_use]
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get_gsm_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<GsmSecret>, kube::Error> {
        let api: Api<GsmSecret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await
    }

    async fn patch_gsm_secret_status(
        &self,
        namespace: &str,
        name: &str,
        status: &GsmSecretStatus,
    ) -> Result<(), kube::Error> {
        let api: Api<GsmSecret> = Api::namespaced(self.client.clone(), namespace);
        let patch = json!({ "status": status });
        api.patch_status(name, &PatchParams::default(), &Patch::Merge(&patch))
            .await?;
        Ok(())
    }

    async fn get_secret(
        &self,
        namespace: &str,
        name: &str,
    ) -> Result<Option<Secret>, kube::Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.get_opt(name).await
    }

    async fn create_secret(&self, namespace: &str, secret: &Secret) -> Result<Secret, kube::Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        api.create(&PostParams::default(), secret).await
    }

    async fn replace_secret(
        &self,
        namespace: &str,
        secret: &Secret,
    ) -> Result<Secret, kube::Error> {
        let api: Api<Secret> = Api::namespaced(self.client.clone(), namespace);
        let name = secret.metadata.name.clone().unwrap_or_default();
        api.replace(&name, &PostParams::default(), secret).await
    }

    async fn create_service_account_token(
        &self,
        namespace: &str,
        service_account: &str,
        request: &TokenRequest,
    ) -> Result<TokenRequest, kube::Error> {
        let api: Api<ServiceAccount> = Api::namespaced(self.client.clone(), namespace);
        let body = serde_json::to_vec(request).map_err(kube::Error::SerdeError)?;
        api.create_subresource("token", service_account, &PostParams::default(), body)
            .await
    }
}
