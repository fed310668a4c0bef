use k8s_openapi::api::apps::v1::{Deployment, StatefulSet};
use k8s_openapi::api::autoscaling::v1::HorizontalPodAutoscaler;
use kube::ResourceExt;
use std::collections::HashSet;

use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::types::Finding;

/// (namespace, kind, name) of an HPA scale target
type TargetKey = (String, String, String);

pub fn hpa_targets(hpas: &[HorizontalPodAutoscaler]) -> HashSet<TargetKey> {
    hpas.iter()
        .filter_map(|hpa| {
            let target = &hpa.spec.as_ref()?.scale_target_ref;
            Some((
                hpa.namespace().unwrap_or_default(),
                target.kind.clone(),
                target.name.clone(),
            ))
        })
        .collect()
}

/// Flag HPA-managed Deployments and StatefulSets that also pin `spec.replicas`
pub async fn check_hpa_conflicts(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let hpas = reader
        .horizontal_pod_autoscalers(namespace)
        .await
        .map_err(AuditError::list("horizontalpodautoscalers"))?;
    let deployments = reader
        .deployments(namespace)
        .await
        .map_err(AuditError::list("deployments"))?;
    let stateful_sets = reader
        .stateful_sets(namespace)
        .await
        .map_err(AuditError::list("statefulsets"))?;

    check_hpa_conflicts_with_objects(&hpas, &deployments, &stateful_sets, auditor, filtering);
    Ok(())
}

pub fn check_hpa_conflicts_with_objects(
    hpas: &[HorizontalPodAutoscaler],
    deployments: &[Deployment],
    stateful_sets: &[StatefulSet],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    let targets = hpa_targets(hpas);
    if targets.is_empty() {
        return;
    }

    let scaled = deployments
        .iter()
        .map(|d| {
            let replicas = d.spec.as_ref().and_then(|s| s.replicas);
            ("Deployment", d.namespace(), d.name_any(), replicas)
        })
        .chain(stateful_sets.iter().map(|s| {
            let replicas = s.spec.as_ref().and_then(|s| s.replicas);
            ("StatefulSet", s.namespace(), s.name_any(), replicas)
        }));

    for (kind, namespace, name, replicas) in scaled {
        let namespace = namespace.unwrap_or_default();
        let key = (namespace.clone(), kind.to_string(), name.clone());
        if replicas.is_none() || !targets.contains(&key) {
            continue;
        }
        auditor.record(
            Finding {
                namespace,
                resource: name,
                kind: kind.to_string(),
                container: String::new(),
                issue: format!("{} has spec.replicas set while an HPA targets it", kind),
                suggestion: format!(
                    "Remove spec.replicas from the {} manifest and let the HPA own the replica count.",
                    kind
                ),
                subjects: Vec::new(),
            },
            filtering,
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::FakeCluster;
    use crate::findings::ExclusionPolicy;
    use k8s_openapi::api::apps::v1::{DeploymentSpec, StatefulSetSpec};
    use k8s_openapi::api::autoscaling::v1::{
        CrossVersionObjectReference, HorizontalPodAutoscalerSpec,
    };
    use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;

    fn meta(name: &str) -> ObjectMeta {
        ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("default".to_string()),
            ..Default::default()
        }
    }

    fn hpa(kind: &str, target: &str) -> HorizontalPodAutoscaler {
        HorizontalPodAutoscaler {
            metadata: meta(&format!("{}-hpa", target)),
            spec: Some(HorizontalPodAutoscalerSpec {
                max_replicas: 5,
                scale_target_ref: CrossVersionObjectReference {
                    api_version: Some("apps/v1".to_string()),
                    kind: kind.to_string(),
                    name: target.to_string(),
                },
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn deployment(name: &str, replicas: Option<i32>) -> Deployment {
        Deployment {
            metadata: meta(name),
            spec: Some(DeploymentSpec {
                replicas,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    fn stateful_set(name: &str, replicas: Option<i32>) -> StatefulSet {
        StatefulSet {
            metadata: meta(name),
            spec: Some(StatefulSetSpec {
                replicas,
                ..Default::default()
            }),
            ..Default::default()
        }
    }

    #[test]
    fn test_conflict_with_explicit_replicas() {
        let mut auditor = Auditor::new(ExclusionPolicy::empty());
        check_hpa_conflicts_with_objects(
            &[hpa("Deployment", "X")],
            &[deployment("X", Some(3)), deployment("Y", Some(3))],
            &[],
            &mut auditor,
            Filtering::Unfiltered,
        );

        assert_eq!(auditor.len(), 1);
        let f = &auditor.findings()[0];
        assert_eq!(f.resource, "X");
        assert_eq!(f.kind, "Deployment");
        assert!(f.container.is_empty());
    }

    #[test]
    fn test_no_conflict_without_replicas() {
        let mut auditor = Auditor::new(ExclusionPolicy::empty());
        check_hpa_conflicts_with_objects(
            &[hpa("Deployment", "X")],
            &[deployment("X", None)],
            &[],
            &mut auditor,
            Filtering::Unfiltered,
        );
        assert!(auditor.is_empty());
    }

    #[test]
    fn test_stateful_set_conflict_matches_kind() {
        let mut auditor = Auditor::new(ExclusionPolicy::empty());
        check_hpa_conflicts_with_objects(
            &[hpa("StatefulSet", "db")],
            // same name, different kind: not targeted
            &[deployment("db", Some(1))],
            &[stateful_set("db", Some(3))],
            &mut auditor,
            Filtering::Unfiltered,
        );

        assert_eq!(auditor.len(), 1);
        assert_eq!(auditor.findings()[0].kind, "StatefulSet");
        assert!(auditor.findings()[0].issue.starts_with("StatefulSet"));
    }

    #[tokio::test]
    async fn test_check_lists_through_reader() {
        let cluster = FakeCluster {
            horizontal_pod_autoscalers: vec![hpa("Deployment", "X")],
            deployments: vec![deployment("X", Some(2))],
            ..Default::default()
        };
        let mut auditor = Auditor::new(ExclusionPolicy::empty());
        check_hpa_conflicts(&cluster, "default", &mut auditor, Filtering::Unfiltered)
            .await
            .unwrap();
        assert_eq!(auditor.len(), 1);

        let failing = cluster.fail_on("horizontalpodautoscalers");
        let err = check_hpa_conflicts(&failing, "default", &mut auditor, Filtering::Unfiltered)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("horizontalpodautoscalers"));
    }
}
