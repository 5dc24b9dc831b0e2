//! Cluster access for reconciliation
//!
//! [`ClusterClient`] is the only seam between reconciliation and a real API
//! server. [`KubeClusterClient`] implements it with kube-rs dynamic objects,
//! resolving each object's apiVersion/kind through API discovery.

use async_trait::async_trait;
use kube::api::{Api, DynamicObject, GroupVersionKind, PostParams};
use kube::discovery::{ApiCapabilities, ApiResource, Discovery, Scope};
use kube::Client;
use tracing::{debug, trace};

#[cfg(test)]
use mockall::automock;

use kssh_common::kube_utils::{is_already_exists, is_not_found, parse_api_version};
use kssh_common::{Error, GenericObject, ObjectKey};

/// Field manager recorded on objects kssh creates
pub const FIELD_MANAGER: &str = "kssh";

/// Result of a create call
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CreateOutcome {
    /// The object was created
    Created,
    /// Another writer created it first
    AlreadyExists,
}

/// Minimal get/create surface over a cluster
#[cfg_attr(test, automock)]
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// Fetch an object. `Ok(None)` means it does not exist.
    async fn get(&self, key: &ObjectKey) -> Result<Option<GenericObject>, Error>;

    /// Create an object exactly as given
    async fn create(
        &self,
        key: &ObjectKey,
        object: &GenericObject,
    ) -> Result<CreateOutcome, Error>;
}

/// [`ClusterClient`] backed by a kube-rs client
pub struct KubeClusterClient {
    client: Client,
    discovery: Discovery,
}

impl KubeClusterClient {
    /// Wrap a client, running API discovery once up front
    pub async fn new(client: Client) -> Result<Self, Error> {
        let discovery = Discovery::new(client.clone())
            .run()
            .await
            .map_err(|e| Error::client("discovery", format!("API discovery failed: {}", e)))?;
        debug!(groups = discovery.groups().count(), "API discovery complete");
        Ok(Self { client, discovery })
    }

    fn resolve(
        &self,
        key: &ObjectKey,
        operation: &str,
    ) -> Result<(ApiResource, ApiCapabilities), Error> {
        let (group, version) = parse_api_version(&key.api_version);
        let gvk = GroupVersionKind {
            group,
            version,
            kind: key.kind.clone(),
        };
        self.discovery.resolve_gvk(&gvk).ok_or_else(|| {
            cluster_error(
                operation,
                key,
                format!("unknown resource type {}/{}", key.api_version, key.kind),
            )
        })
    }

    fn api(&self, key: &ObjectKey, operation: &str) -> Result<Api<DynamicObject>, Error> {
        let (resource, caps) = self.resolve(key, operation)?;
        let api = match (&caps.scope, key.namespace.as_deref()) {
            (Scope::Namespaced, Some(ns)) => Api::namespaced_with(self.client.clone(), ns, &resource),
            (Scope::Namespaced, None) => {
                Api::default_namespaced_with(self.client.clone(), &resource)
            }
            (Scope::Cluster, _) => Api::all_with(self.client.clone(), &resource),
        };
        Ok(api)
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    async fn get(&self, key: &ObjectKey) -> Result<Option<GenericObject>, Error> {
        let api = self.api(key, "get")?;
        match api.get(&key.name).await {
            Ok(found) => {
                trace!(object = %key, "found existing object");
                let value = serde_json::to_value(&found)
                    .map_err(|e| cluster_error("get", key, e.to_string()))?;
                Ok(GenericObject::from_value(value))
            }
            Err(e) if is_not_found(&e) => Ok(None),
            Err(e) => Err(cluster_error("get", key, e.to_string())),
        }
    }

    async fn create(
        &self,
        key: &ObjectKey,
        object: &GenericObject,
    ) -> Result<CreateOutcome, Error> {
        let api = self.api(key, "create")?;
        let dynamic: DynamicObject = serde_json::from_value(object.to_value())
            .map_err(|e| cluster_error("create", key, format!("invalid object: {}", e)))?;
        let params = PostParams {
            field_manager: Some(FIELD_MANAGER.to_string()),
            ..Default::default()
        };
        match api.create(&params, &dynamic).await {
            Ok(_) => Ok(CreateOutcome::Created),
            Err(e) if is_already_exists(&e) => Ok(CreateOutcome::AlreadyExists),
            Err(e) => Err(cluster_error("create", key, e.to_string())),
        }
    }
}

fn cluster_error(operation: &str, key: &ObjectKey, msg: impl Into<String>) -> Error {
    Error::cluster(operation, &key.kind, key.namespace.as_deref(), &key.name, msg)
}
