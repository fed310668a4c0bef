use k8s_openapi::api::core::v1::{Container, Probe as ContainerProbe};

use super::container_finding;
use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::parsing::parse_image_ref;
use crate::workloads::{gather_workloads, Workload, WorkloadKind};

async fn list_deployments(
    reader: &dyn ClusterReader,
    namespace: &str,
) -> Result<Vec<Workload>, AuditError> {
    gather_workloads(reader, namespace, &[WorkloadKind::Deployment]).await
}

/// Flag Deployment containers without resource limits or requests
pub async fn check_resource_limits(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let deployments = list_deployments(reader, namespace).await?;
    check_resource_limits_with_workloads(&deployments, auditor, filtering);
    Ok(())
}

pub fn check_resource_limits_with_workloads(
    workloads: &[Workload],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for workload in workloads {
        for container in workload.containers() {
            let missing = missing_resources(container);
            if missing.is_empty() {
                continue;
            }
            auditor.record(
                container_finding(
                    workload,
                    container,
                    format!("Missing resource {}", missing.join(" and ")),
                    "Add resource requests and limits to this container.",
                ),
                filtering,
            );
        }
    }
}

fn missing_resources(container: &Container) -> Vec<&'static str> {
    let resources = container.resources.as_ref();
    let mut missing = Vec::new();
    if resources
        .and_then(|r| r.limits.as_ref())
        .map_or(true, |l| l.is_empty())
    {
        missing.push("limits");
    }
    if resources
        .and_then(|r| r.requests.as_ref())
        .map_or(true, |r| r.is_empty())
    {
        missing.push("requests");
    }
    missing
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Probe {
    Liveness,
    Readiness,
}

impl Probe {
    fn of<'a>(&self, container: &'a Container) -> Option<&'a ContainerProbe> {
        match self {
            Probe::Liveness => container.liveness_probe.as_ref(),
            Probe::Readiness => container.readiness_probe.as_ref(),
        }
    }

    fn issue(&self) -> &'static str {
        match self {
            Probe::Liveness => "Missing Liveness Probe",
            Probe::Readiness => "Missing Readiness Probe",
        }
    }

    fn suggestion(&self, probably_safe: bool) -> &'static str {
        match (self, probably_safe) {
            (Probe::Liveness, true) => {
                "No liveness probe found. This container may be safe without one."
            }
            (Probe::Liveness, false) => {
                "Consider adding a liveness probe to ensure timely detection of unhealthy containers."
            }
            (Probe::Readiness, true) => {
                "No readiness probe found. This container may be safe without one."
            }
            (Probe::Readiness, false) => {
                "Consider adding a readiness probe so traffic only reaches containers that are ready."
            }
        }
    }
}

/// A container that serves nothing, or never restarts, can usually go without probes
pub fn is_probably_safe(container: &Container, restart_policy: Option<&str>) -> bool {
    let no_ports = container.ports.as_ref().map_or(true, |p| p.is_empty());
    (no_ports && container.readiness_probe.is_none()) || restart_policy == Some("Never")
}

/// Flag Deployment containers missing the given probe
pub async fn check_probes(
    reader: &dyn ClusterReader,
    namespace: &str,
    probe: Probe,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let deployments = list_deployments(reader, namespace).await?;
    check_probes_with_workloads(&deployments, probe, auditor, filtering);
    Ok(())
}

pub fn check_probes_with_workloads(
    workloads: &[Workload],
    probe: Probe,
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for workload in workloads {
        for container in workload.containers() {
            if probe.of(container).is_some() {
                continue;
            }
            let safe = is_probably_safe(container, workload.restart_policy());
            auditor.record(
                container_finding(workload, container, probe.issue(), probe.suggestion(safe)),
                filtering,
            );
        }
    }
}

/// Flag Deployment containers running untagged or `latest` images
pub async fn check_image_tags(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let deployments = list_deployments(reader, namespace).await?;
    check_image_tags_with_workloads(&deployments, auditor, filtering);
    Ok(())
}

pub fn check_image_tags_with_workloads(
    workloads: &[Workload],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for workload in workloads {
        for container in workload.containers() {
            let image = container.image.as_deref().unwrap_or_default();
            let image_ref = parse_image_ref(image);
            if !image_ref.is_floating() {
                continue;
            }
            auditor.record(
                container_finding(
                    workload,
                    container,
                    format!(
                        "Image '{}' resolves to tag '{}'",
                        image,
                        image_ref.effective_tag()
                    ),
                    "Use a specific version tag instead of 'latest' or untagged.",
                ),
                filtering,
            );
        }
    }
}
