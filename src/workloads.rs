use k8s_openapi::api::apps::v1::{DaemonSet, Deployment, ReplicaSet, StatefulSet};
use k8s_openapi::api::batch::v1::{CronJob, Job};
use k8s_openapi::api::core::v1::{Container, Pod, PodSpec, ReplicationController};
use kube::{Resource, ResourceExt};
use std::fmt;
use tracing::debug;

use crate::cluster::ClusterReader;
use crate::error::{AuditError, ClusterError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum WorkloadKind {
    Deployment,
    StatefulSet,
    DaemonSet,
    Job,
    CronJob,
    ReplicaSet,
    Pod,
    ReplicationController,
}

impl WorkloadKind {
    /// Fetch order used when gathering
    pub const ALL: [WorkloadKind; 8] = [
        WorkloadKind::Deployment,
        WorkloadKind::StatefulSet,
        WorkloadKind::DaemonSet,
        WorkloadKind::Job,
        WorkloadKind::CronJob,
        WorkloadKind::ReplicaSet,
        WorkloadKind::Pod,
        WorkloadKind::ReplicationController,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WorkloadKind::Deployment => "Deployment",
            WorkloadKind::StatefulSet => "StatefulSet",
            WorkloadKind::DaemonSet => "DaemonSet",
            WorkloadKind::Job => "Job",
            WorkloadKind::CronJob => "CronJob",
            WorkloadKind::ReplicaSet => "ReplicaSet",
            WorkloadKind::Pod => "Pod",
            WorkloadKind::ReplicationController => "ReplicationController",
        }
    }
}

impl fmt::Display for WorkloadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Uniform view of any pod-producing resource
#[derive(Debug, Clone)]
pub struct Workload {
    pub kind: WorkloadKind,
    pub name: String,
    pub namespace: String,
    pub pod_spec: PodSpec,
}

impl Workload {
    pub fn containers(&self) -> impl Iterator<Item = &Container> {
        self.pod_spec.containers.iter()
    }

    /// Regular containers followed by init containers
    pub fn all_containers(&self) -> impl Iterator<Item = &Container> {
        self.pod_spec
            .containers
            .iter()
            .chain(self.pod_spec.init_containers.iter().flatten())
    }

    pub fn restart_policy(&self) -> Option<&str> {
        self.pod_spec.restart_policy.as_deref()
    }
}

/// A resource kind that embeds a pod template
pub trait PodTemplateSource: Resource + Sized {
    const KIND: WorkloadKind;

    fn into_pod_spec(self) -> Option<PodSpec>;
}

impl PodTemplateSource for Deployment {
    const KIND: WorkloadKind = WorkloadKind::Deployment;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template.spec)
    }
}

impl PodTemplateSource for StatefulSet {
    const KIND: WorkloadKind = WorkloadKind::StatefulSet;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template.spec)
    }
}

impl PodTemplateSource for DaemonSet {
    const KIND: WorkloadKind = WorkloadKind::DaemonSet;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template.spec)
    }
}

impl PodTemplateSource for Job {
    const KIND: WorkloadKind = WorkloadKind::Job;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template.spec)
    }
}

impl PodTemplateSource for CronJob {
    const KIND: WorkloadKind = WorkloadKind::CronJob;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec
            .and_then(|s| s.job_template.spec)
            .and_then(|j| j.template.spec)
    }
}

impl PodTemplateSource for ReplicaSet {
    const KIND: WorkloadKind = WorkloadKind::ReplicaSet;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template).and_then(|t| t.spec)
    }
}

impl PodTemplateSource for Pod {
    const KIND: WorkloadKind = WorkloadKind::Pod;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec
    }
}

impl PodTemplateSource for ReplicationController {
    const KIND: WorkloadKind = WorkloadKind::ReplicationController;

    fn into_pod_spec(self) -> Option<PodSpec> {
        self.spec.and_then(|s| s.template).and_then(|t| t.spec)
    }
}

/// Objects without a name or a pod template are skipped
pub fn normalize<T: PodTemplateSource>(items: Vec<T>) -> Vec<Workload> {
    items
        .into_iter()
        .filter_map(|item| {
            let name = item.meta().name.clone()?;
            let namespace = item.namespace().unwrap_or_default();
            let pod_spec = item.into_pod_spec()?;
            Some(Workload {
                kind: T::KIND,
                name,
                namespace,
                pod_spec,
            })
        })
        .collect()
}

async fn fetch_kind(
    reader: &dyn ClusterReader,
    kind: WorkloadKind,
    namespace: &str,
) -> Result<Vec<Workload>, ClusterError> {
    let workloads = match kind {
        WorkloadKind::Deployment => normalize(reader.deployments(namespace).await?),
        WorkloadKind::StatefulSet => normalize(reader.stateful_sets(namespace).await?),
        WorkloadKind::DaemonSet => normalize(reader.daemon_sets(namespace).await?),
        WorkloadKind::Job => normalize(reader.jobs(namespace).await?),
        WorkloadKind::CronJob => normalize(reader.cron_jobs(namespace).await?),
        WorkloadKind::ReplicaSet => normalize(reader.replica_sets(namespace).await?),
        WorkloadKind::Pod => normalize(reader.pods(namespace).await?),
        WorkloadKind::ReplicationController => {
            normalize(reader.replication_controllers(namespace).await?)
        }
    };
    Ok(workloads)
}

/// Gather workloads of the requested kinds, or of every kind when `kinds` is empty.
///
/// Any failing kind fails the whole call; partial results are never returned.
pub async fn gather_workloads(
    reader: &dyn ClusterReader,
    namespace: &str,
    kinds: &[WorkloadKind],
) -> Result<Vec<Workload>, AuditError> {
    let mut workloads = Vec::new();
    for kind in WorkloadKind::ALL
        .into_iter()
        .filter(|k| kinds.is_empty() || kinds.contains(k))
    {
        let batch = fetch_kind(reader, kind, namespace)
            .await
            .map_err(|source| AuditError::Gather { kind, source })?;
        debug!("gathered {} {} workloads", batch.len(), kind);
        workloads.extend(batch);
    }
    Ok(workloads)
}
