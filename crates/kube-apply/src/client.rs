//! Cluster client abstraction.
//!
//! All outbound calls go through [`ObjectClient`] so reconcile logic can be
//! unit tested against the in-memory mock. The real implementation resolves
//! each group/version/kind against API discovery and binds the right scope.

use async_trait::async_trait;
use kube::api::{Api, DeleteParams, DynamicObject, PostParams};
use kube::core::GroupVersionKind;
use kube::discovery::{pinned_kind, Scope};
use kube::Client;

use crate::error::{classify, ApplyError};
use crate::object::{api_version_of, display_name, gvk_of, name_of};

/// Schema-less access to the cluster API.
///
/// `create`, `update` and `replace_status` take the identity from the
/// object itself; `get` and `delete` address by coordinates so callers can
/// probe without building a full object. All async methods must be `Send`
/// to work with Tokio's work-stealing runtime.
#[async_trait]
pub trait ObjectClient: Send + Sync {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject, ApplyError>;

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError>;

    /// Full replace (PUT). The object must carry the resource version of
    /// the live object it replaces for optimistic concurrency.
    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError>;

    async fn delete(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), ApplyError>;

    /// Replace the status sub-resource only.
    async fn replace_status(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError>;
}

/// [`ObjectClient`] backed by a real cluster connection.
#[derive(Clone)]
pub struct KubeObjectClient {
    client: Client,
}

impl KubeObjectClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn api_for(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
    ) -> Result<Api<DynamicObject>, ApplyError> {
        let (resource, capabilities) =
            pinned_kind(&self.client, gvk).await.map_err(|err| match &err {
                kube::Error::Api(resp) if resp.code == 404 => {
                    ApplyError::KindUnknown(format!("{}/{}", api_version_of(gvk), gvk.kind))
                }
                _ => ApplyError::Kube(err),
            })?;

        let api = match capabilities.scope {
            Scope::Cluster => Api::all_with(self.client.clone(), &resource),
            Scope::Namespaced => {
                let namespace =
                    namespace.ok_or_else(|| ApplyError::MissingNamespace(gvk.kind.clone()))?;
                Api::namespaced_with(self.client.clone(), namespace, &resource)
            }
        };

        Ok(api)
    }
}

#[async_trait]
impl ObjectClient for KubeObjectClient {
    async fn get(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<DynamicObject, ApplyError> {
        let api = self.api_for(gvk, namespace).await?;
        api.get(name)
            .await
            .map_err(|err| classify(err, &format!("{} {}", gvk.kind, name)))
    }

    async fn create(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        let api = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
        api.create(&PostParams::default(), obj)
            .await
            .map_err(|err| classify(err, &display_name(obj)))
    }

    async fn update(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        let name = name_of(obj)?;
        let api = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
        api.replace(name, &PostParams::default(), obj)
            .await
            .map_err(|err| classify(err, &display_name(obj)))
    }

    async fn delete(
        &self,
        gvk: &GroupVersionKind,
        namespace: Option<&str>,
        name: &str,
    ) -> Result<(), ApplyError> {
        let api = self.api_for(gvk, namespace).await?;
        api.delete(name, &DeleteParams::default())
            .await
            .map(|_| ())
            .map_err(|err| classify(err, &format!("{} {}", gvk.kind, name)))
    }

    async fn replace_status(&self, obj: &DynamicObject) -> Result<DynamicObject, ApplyError> {
        let gvk = gvk_of(obj)?;
        let name = name_of(obj)?;
        let api = self.api_for(&gvk, obj.metadata.namespace.as_deref()).await?;
        let data = serde_json::to_vec(obj)?;
        api.replace_status(name, &PostParams::default(), data)
            .await
            .map_err(|err| classify(err, &display_name(obj)))
    }
}
