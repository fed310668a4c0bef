use chrono::{DateTime, Duration, Utc};
use k8s_openapi::api::core::v1::{PersistentVolume, PersistentVolumeClaim};
use kube::ResourceExt;

use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::parsing::round_to_hours;
use crate::types::Finding;

/// Minimum age before an Available volume counts as unclaimed
pub const UNCLAIMED_PV_GRACE_HOURS: i64 = 24;

/// Flag claims stuck in Pending or Lost
pub async fn check_pvc_phases(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let claims = reader
        .persistent_volume_claims(namespace)
        .await
        .map_err(AuditError::list("persistentvolumeclaims"))?;
    check_pvc_phases_with_claims(&claims, auditor, filtering);
    Ok(())
}

pub fn check_pvc_phases_with_claims(
    claims: &[PersistentVolumeClaim],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for pvc in claims {
        let phase = pvc
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            .unwrap_or("");
        let (issue, suggestion) = match phase {
            "Pending" => (
                "PersistentVolumeClaim is in a Pending state",
                "Check if the PersistentVolumeClaim has a matching PersistentVolume or if there are issues with the storage class.",
            ),
            "Lost" => (
                "PersistentVolumeClaim is in a Lost state",
                "Investigate the cause of the lost claim and consider recreating it if necessary.",
            ),
            _ => continue,
        };
        auditor.record(
            Finding {
                namespace: pvc.namespace().unwrap_or_default(),
                resource: pvc.name_any(),
                kind: "PersistentVolumeClaim".to_string(),
                container: String::new(),
                issue: issue.to_string(),
                suggestion: suggestion.to_string(),
                subjects: Vec::new(),
            },
            filtering,
        );
    }
}

/// Flag cluster-scoped volumes that have sat Available for a day or more
pub async fn check_unclaimed_volumes(
    reader: &dyn ClusterReader,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let volumes = reader
        .persistent_volumes()
        .await
        .map_err(AuditError::list("persistentvolumes"))?;
    check_unclaimed_volumes_with_volumes(&volumes, Utc::now(), auditor, filtering);
    Ok(())
}

pub fn check_unclaimed_volumes_with_volumes(
    volumes: &[PersistentVolume],
    now: DateTime<Utc>,
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    for pv in volumes {
        let available = pv
            .status
            .as_ref()
            .and_then(|s| s.phase.as_deref())
            == Some("Available");
        if !available {
            continue;
        }
        let created = match pv.metadata.creation_timestamp.as_ref() {
            Some(t) => t.0,
            None => continue,
        };
        let age = now - created;
        if age < Duration::hours(UNCLAIMED_PV_GRACE_HOURS) {
            continue;
        }
        auditor.record(
            Finding {
                // PersistentVolumes are cluster-scoped
                namespace: String::new(),
                resource: pv.name_any(),
                kind: "PersistentVolume".to_string(),
                container: String::new(),
                issue: format!(
                    "PersistentVolume has been unclaimed and available for {}h",
                    round_to_hours(age)
                ),
                suggestion: "Consider deleting or reusing this PersistentVolume if it is no longer needed."
                    .to_string(),
                subjects: Vec::new(),
            },
            filtering,
        );
    }
}
