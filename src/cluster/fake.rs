use async_trait::async_trait;
use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{
    Namespace, PersistentVolume, PersistentVolumeClaim, Pod, ReplicationController, Service,
};
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::api::rbac::v1::{ClusterRole, ClusterRoleBinding, Role, RoleBinding};
use kube::ResourceExt;
use std::collections::HashSet;

use super::ClusterReader;
use crate::error::ClusterError;

/// In-memory cluster snapshot.
///
/// Listings are keyed by the plural resource name (`"deployments"`,
/// `"clusterroles"`, ...); `fail_on` makes that listing return an error.
#[derive(Debug, Clone, Default)]
pub struct FakeCluster {
    pub deployments: Vec<Deployment>,
    pub stateful_sets: Vec<StatefulSet>,
    pub daemon_sets: Vec<DaemonSet>,
    pub replica_sets: Vec<ReplicaSet>,
    pub jobs: Vec<Job>,
    pub cron_jobs: Vec<CronJob>,
    pub pods: Vec<Pod>,
    pub replication_controllers: Vec<ReplicationController>,
    pub horizontal_pod_autoscalers: Vec<HorizontalPodAutoscaler>,
    pub roles: Vec<Role>,
    pub role_bindings: Vec<RoleBinding>,
    pub network_policies: Vec<NetworkPolicy>,
    pub services: Vec<Service>,
    pub persistent_volume_claims: Vec<PersistentVolumeClaim>,
    pub namespaces: Vec<Namespace>,
    pub cluster_roles: Vec<ClusterRole>,
    pub cluster_role_bindings: Vec<ClusterRoleBinding>,
    pub persistent_volumes: Vec<PersistentVolume>,
    /// Listings that return an error; see `fail_on`
    pub failing: HashSet<&'static str>,
}

impl FakeCluster {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_on(mut self, resource: &'static str) -> Self {
        self.failing.insert(resource);
        self
    }

    fn check(&self, resource: &'static str) -> Result<(), ClusterError> {
        if self.failing.contains(resource) {
            return Err(ClusterError::Unavailable(format!(
                "{} is forbidden: simulated failure",
                resource
            )));
        }
        Ok(())
    }

    fn scoped<K>(
        &self,
        resource: &'static str,
        items: &[K],
        namespace: &str,
    ) -> Result<Vec<K>, ClusterError>
    where
        K: kube::Resource + Clone,
    {
        self.check(resource)?;
        Ok(items
            .iter()
            .filter(|item| namespace.is_empty() || item.namespace().as_deref() == Some(namespace))
            .cloned()
            .collect())
    }

    fn all<K: Clone>(&self, resource: &'static str, items: &[K]) -> Result<Vec<K>, ClusterError> {
        self.check(resource)?;
        Ok(items.to_vec())
    }
}

#[async_trait]
impl ClusterReader for FakeCluster {
    async fn deployments(&self, namespace: &str) -> Result<Vec<Deployment>, ClusterError> {
        self.scoped("deployments", &self.deployments, namespace)
    }

    async fn stateful_sets(&self, namespace: &str) -> Result<Vec<StatefulSet>, ClusterError> {
        self.scoped("statefulsets", &self.stateful_sets, namespace)
    }

    async fn daemon_sets(&self, namespace: &str) -> Result<Vec<DaemonSet>, ClusterError> {
        self.scoped("daemonsets", &self.daemon_sets, namespace)
    }

    async fn replica_sets(&self, namespace: &str) -> Result<Vec<ReplicaSet>, ClusterError> {
        self.scoped("replicasets", &self.replica_sets, namespace)
    }

    async fn jobs(&self, namespace: &str) -> Result<Vec<Job>, ClusterError> {
        self.scoped("jobs", &self.jobs, namespace)
    }

    async fn cron_jobs(&self, namespace: &str) -> Result<Vec<CronJob>, ClusterError> {
        self.scoped("cronjobs", &self.cron_jobs, namespace)
    }

    async fn pods(&self, namespace: &str) -> Result<Vec<Pod>, ClusterError> {
        self.scoped("pods", &self.pods, namespace)
    }

    async fn replication_controllers(
        &self,
        namespace: &str,
    ) -> Result<Vec<ReplicationController>, ClusterError> {
        self.scoped(
            "replicationcontrollers",
            &self.replication_controllers,
            namespace,
        )
    }

    async fn horizontal_pod_autoscalers(
        &self,
        namespace: &str,
    ) -> Result<Vec<HorizontalPodAutoscaler>, ClusterError> {
        self.scoped(
            "horizontalpodautoscalers",
            &self.horizontal_pod_autoscalers,
            namespace,
        )
    }

    async fn roles(&self, namespace: &str) -> Result<Vec<Role>, ClusterError> {
        self.scoped("roles", &self.roles, namespace)
    }

    async fn role_bindings(&self, namespace: &str) -> Result<Vec<RoleBinding>, ClusterError> {
        self.scoped("rolebindings", &self.role_bindings, namespace)
    }

    async fn network_policies(&self, namespace: &str) -> Result<Vec<NetworkPolicy>, ClusterError> {
        self.scoped("networkpolicies", &self.network_policies, namespace)
    }

    async fn services(&self, namespace: &str) -> Result<Vec<Service>, ClusterError> {
        self.scoped("services", &self.services, namespace)
    }

    async fn persistent_volume_claims(
        &self,
        namespace: &str,
    ) -> Result<Vec<PersistentVolumeClaim>, ClusterError> {
        self.scoped(
            "persistentvolumeclaims",
            &self.persistent_volume_claims,
            namespace,
        )
    }

    async fn namespaces(&self) -> Result<Vec<Namespace>, ClusterError> {
        self.all("namespaces", &self.namespaces)
    }

    async fn cluster_roles(&self) -> Result<Vec<ClusterRole>, ClusterError> {
        self.all("clusterroles", &self.cluster_roles)
    }

    async fn cluster_role_bindings(&self) -> Result<Vec<ClusterRoleBinding>, ClusterError> {
        self.all("clusterrolebindings", &self.cluster_role_bindings)
    }

    async fn persistent_volumes(&self) -> Result<Vec<PersistentVolume>, ClusterError> {
        self.all("persistentvolumes", &self.persistent_volumes)
    }
}
