use k8s_openapi::api::core::v1::Container;

use super::container_finding;
use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::workloads::{gather_workloads, Workload};

fn is_privileged(container: &Container) -> bool {
    container
        .security_context
        .as_ref()
        .and_then(|s| s.privileged)
        .unwrap_or(false)
}

/// Flag any container, init containers included, running privileged
pub async fn check_privileged_containers(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let workloads = gather_workloads(reader, namespace, &[]).await?;
    check_privileged_with_workloads(&workloads, auditor, filtering);
    Ok(())
}

pub fn check_privileged_with_workloads(
    workloads: &[Workload],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for workload in workloads {
        for container in workload.all_containers().filter(|c| is_privileged(c)) {
            auditor.record(
                container_finding(
                    workload,
                    container,
                    "Container is running with privileged mode enabled",
                    "Remove privileged mode from the container unless absolutely necessary.",
                ),
                filtering,
            );
        }
    }
}
