use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    Namespace, PersistentVolume, PersistentVolumeClaim, Pod, ReplicationController, Service,
};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use k8s_openapi::{ClusterResourceScope, NamespaceResourceScope};
use kube::{api::ListParams, Api, Client, Resource};
use serde::de::DeserializeOwned;
use std::fmt::Debug;
use tracing::debug;

use crate::error::ClusterError;

pub mod fake;

pub use fake::FakeCluster;

/// Read-only list access to the cluster API.
///
/// Namespaced listings treat an empty namespace as "all namespaces".
#[async_trait]
pub trait ClusterReader: Send + Sync {
    async fn deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError>;
    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>, ClusterError>;
    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<DaemonSet>, ClusterError>;
    async fn replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>, ClusterError>;
    async fn jobs(&self, namespace: &str) -> Result<Vec<Job>, ClusterError>;
    async fn cron_jobs(&self, namespace: &str) -> Result<Vec<CronJob>, ClusterError>;
    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError>;
    async fn replication_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReplicationController>, ClusterError>;
    async fn horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> Result<Vec<HorizontalPodAutoscaler>, ClusterError>;
    async fn roles(&self, namespace: &str) -> Result<Vec<Role>, ClusterError>;
    async fn role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, ClusterError>;
    async fn network_policies(&self, namespace: &str) -> Result<Vec<NetworkPolicy>, ClusterError>;
    async fn services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError>;
    async fn persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, ClusterError>;

    async fn namespaces(&self) -> Result<Vec<Namespace>, ClusterError>;
    async fn cluster_roles(&self) -> Result<Vec<ClusterRole>, ClusterError>;
    async fn cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, ClusterError>;
    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, ClusterError>;
}

/// `ClusterReader` backed by a live `kube::Client`
#[derive(Clone)]
pub struct KubeClusterReader {
    client: Client,
}

impl KubeClusterReader {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    async fn list_namespaced<K>(&self, namespace: &str) -> Result<Vec<K>, ClusterError>
    where
        K: Resource<Scope = NamespaceResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = if namespace.is_empty() {
            Api::all(self.client.clone())
        } else {
            Api::namespaced(self.client.clone(), namespace)
        };
        let list = api.list(&ListParams::default()).await?;
        debug!(
            "listed {} {} objects in {:?}",
            list.items.len(),
            K::kind(&Default::default()),
            namespace
        );
        Ok(list.items)
    }

    async fn list_cluster<K>(&self) -> Result<Vec<K>, ClusterError>
    where
        K: Resource<Scope = ClusterResourceScope> + Clone + DeserializeOwned + Debug,
        <K as Resource>::DynamicType: Default,
    {
        let api: Api<K> = Api::all(self.client.clone());
        let list = api.list(&ListParams::default()).await?;
        debug!(
            "listed {} cluster-scoped {} objects",
            list.items.len(),
            K::kind(&Default::default())
        );
        Ok(list.items)
    }
}

#[async_trait]
impl ClusterReader for KubeClusterReader {
    async fn deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<DaemonSet>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn jobs(&self, namespace: &str) -> Result<Vec<Job>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn cron_jobs(&self, namespace: &str) -> Result<Vec<CronJob>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn replication_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReplicationController>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> Result<Vec<HorizontalPodAutoscaler>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn roles(&self, namespace: &str) -> Result<Vec<Role>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn network_policies(&self, namespace: &str) -> Result<Vec<NetworkPolicy>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        self.list_namespaced(namespace).await
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        self.list_cluster().await
    }

    async fn cluster_roles(&self) -> Result<Vec<ClusterRole>, ClusterError> {
        self.list_cluster().await
    }

    async fn cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, ClusterError> {
        self.list_cluster().await
    }

    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, ClusterError> {
        self.list_cluster().await
    }
}

/// Fail fast when the API server cannot be reached
pub async fn ensure_cluster_reachable(reader: &dyn ClusterReader) -> Result<(), ClusterError> {
    let _ = reader.namespaces().await?;
    Ok(())
}
