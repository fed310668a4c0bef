use k8s_openapi::api::core::v1::Service;
use k8s_openapi::api::networking::v1::NetworkPolicy;
use k8s_openapi::apimachinery::pkg::util::intstr::IntOrString;
use kube::ResourceExt;
use std::collections::{HashMap, HashSet};
use tracing::warn;

use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::types::Finding;

/// Flag namespaces that have no NetworkPolicy at all
pub async fn check_network_policies(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    // a scoped audit only evaluates the namespace if it actually exists
    let targets: Vec<String> = reader
        .namespaces()
        .await
        .map_err(AuditError::list("namespaces"))?
        .iter()
        .map(|ns| ns.name_any())
        .filter(|name| namespace.is_empty() || name == namespace)
        .collect();
    if !namespace.is_empty() && targets.is_empty() {
        warn!("namespace {} not found, skipping NetworkPolicy check", namespace);
    }
    let policies = reader
        .network_policies(namespace)
        .await
        .map_err(AuditError::list("networkpolicies"))?;

    check_network_policies_with_objects(&targets, &policies, auditor, filtering);
    Ok(())
}

pub fn check_network_policies_with_objects(
    namespaces: &[String],
    policies: &[NetworkPolicy],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    let covered: HashSet<String> = policies
        .iter()
        .map(|p| p.namespace().unwrap_or_default())
        .collect();

    for namespace in namespaces.iter().filter(|ns| !covered.contains(*ns)) {
        auditor.record(
            Finding {
                namespace: namespace.clone(),
                resource: namespace.clone(),
                kind: "Namespace".to_string(),
                container: String::new(),
                issue: "No NetworkPolicies defined".to_string(),
                suggestion: "Define a default deny NetworkPolicy to restrict traffic by default."
                    .to_string(),
                subjects: Vec::new(),
            },
            filtering,
        );
    }
}

/// Flag Services whose numeric target port is already taken by another Service
pub async fn check_port_conflicts(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let services = reader
        .services(namespace)
        .await
        .map_err(AuditError::list("services"))?;
    check_port_conflicts_with_services(&services, auditor, filtering);
    Ok(())
}

pub fn check_port_conflicts_with_services(
    services: &[Service],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    // (target port, protocol) -> (namespace, name) of the first owning service
    let mut seen: HashMap<(i32, String), (String, String)> = HashMap::new();

    for svc in services {
        let owner_key = (svc.namespace().unwrap_or_default(), svc.name_any());
        let name = &owner_key.1;
        let ports = svc
            .spec
            .as_ref()
            .and_then(|s| s.ports.as_ref())
            .into_iter()
            .flatten();

        for port in ports {
            // named ports need pod resolution, skip them
            let target = match port.target_port {
                Some(IntOrString::Int(p)) if p != 0 => p,
                _ => continue,
            };
            let protocol = port.protocol.clone().unwrap_or_else(|| "TCP".to_string());
            let key = (target, protocol.clone());

            match seen.get(&key) {
                Some(owner) if *owner == owner_key => {}
                Some((owner_ns, owner_name)) => auditor.record(
                    Finding {
                        namespace: owner_key.0.clone(),
                        resource: name.clone(),
                        kind: "Service".to_string(),
                        container: String::new(),
                        issue: format!(
                            "Target port {}/{} is already used by service '{}'",
                            target,
                            protocol,
                            if *owner_ns == owner_key.0 {
                                owner_name.clone()
                            } else {
                                format!("{}/{}", owner_ns, owner_name)
                            }
                        ),
                        suggestion: "Ensure unique target ports across services if required by application behavior."
                            .to_string(),
                        subjects: Vec::new(),
                    },
                    filtering,
                ),
                None => {
                    seen.insert(key, owner_key.clone());
                }
            }
        }
    }
}
