// Audit checks
pub mod network;
pub mod rbac;
pub mod scaling;
pub mod security;
pub mod storage;
pub mod workload;

use k8s_openapi::api::core::v1::Container;
use std::fmt;
use std::str::FromStr;

use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::types::Finding;
use crate::workloads::Workload;

/// Every audit rule the runner knows about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Check {
    ResourceLimits,
    ReadinessProbes,
    LivenessProbes,
    ImageTags,
    HpaConflicts,
    NetworkPolicies,
    PortConflicts,
    PersistentVolumeClaims,
    UnclaimedVolumes,
    PrivilegedContainers,
    Rbac,
}

impl Check {
    /// Default run order
    pub const ALL: [Check; 11] = [
        Check::ResourceLimits,
        Check::ReadinessProbes,
        Check::LivenessProbes,
        Check::ImageTags,
        Check::HpaConflicts,
        Check::NetworkPolicies,
        Check::PortConflicts,
        Check::PersistentVolumeClaims,
        Check::UnclaimedVolumes,
        Check::PrivilegedContainers,
        Check::Rbac,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Check::ResourceLimits => "resource-limits",
            Check::ReadinessProbes => "readiness-probes",
            Check::LivenessProbes => "liveness-probes",
            Check::ImageTags => "image-tags",
            Check::HpaConflicts => "hpa-conflicts",
            Check::NetworkPolicies => "network-policies",
            Check::PortConflicts => "port-conflicts",
            Check::PersistentVolumeClaims => "pvc-phase",
            Check::UnclaimedVolumes => "unclaimed-pvs",
            Check::PrivilegedContainers => "privileged-containers",
            Check::Rbac => "rbac",
        }
    }

    /// Whether this check's findings pass through the exclusion policy by default
    pub fn default_filtering(&self) -> Filtering {
        match self {
            Check::ResourceLimits | Check::ReadinessProbes | Check::NetworkPolicies => {
                Filtering::Filtered
            }
            _ => Filtering::Unfiltered,
        }
    }

    pub async fn run(
        &self,
        reader: &dyn ClusterReader,
        namespace: &str,
        auditor: &mut Auditor,
        filtering: Filtering,
    ) -> Result<(), AuditError> {
        match self {
            Check::ResourceLimits => {
                workload::check_resource_limits(reader, namespace, auditor, filtering).await
            }
            Check::ReadinessProbes => {
                workload::check_probes(reader, namespace, workload::Probe::Readiness, auditor, filtering)
                    .await
            }
            Check::LivenessProbes => {
                workload::check_probes(reader, namespace, workload::Probe::Liveness, auditor, filtering)
                    .await
            }
            Check::ImageTags => workload::check_image_tags(reader, namespace, auditor, filtering).await,
            Check::HpaConflicts => {
                scaling::check_hpa_conflicts(reader, namespace, auditor, filtering).await
            }
            Check::NetworkPolicies => {
                network::check_network_policies(reader, namespace, auditor, filtering).await
            }
            Check::PortConflicts => {
                network::check_port_conflicts(reader, namespace, auditor, filtering).await
            }
            Check::PersistentVolumeClaims => {
                storage::check_pvc_phases(reader, namespace, auditor, filtering).await
            }
            Check::UnclaimedVolumes => storage::check_unclaimed_volumes(reader, auditor, filtering).await,
            Check::PrivilegedContainers => {
                security::check_privileged_containers(reader, namespace, auditor, filtering).await
            }
            Check::Rbac => rbac::check_rbac(reader, namespace, auditor, filtering).await,
        }
    }
}

impl fmt::Display for Check {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Check {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Check::ALL
            .into_iter()
            .find(|c| c.name().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| format!("unknown check '{}'", wanted))
    }
}

/// Finding attached to one container of a workload
pub(crate) fn container_finding(
    workload: &Workload,
    container: &Container,
    issue: impl Into<String>,
    suggestion: impl Into<String>,
) -> Finding {
    Finding {
        namespace: workload.namespace.clone(),
        resource: workload.name.clone(),
        kind: workload.kind.to_string(),
        container: container.name.clone(),
        issue: issue.into(),
        suggestion: suggestion.into(),
        subjects: Vec::new(),
    }
}
