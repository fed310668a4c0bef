use k8s_openapi::api::rbac::v1::{
    ClusterRole, ClusterRoleBinding, PolicyRule, Role, RoleBinding, Subject as RbacSubject,
};
use kube::ResourceExt;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::cluster::ClusterReader;
use crate::error::AuditError;
use crate::findings::{Auditor, Filtering};
use crate::types::Finding;

/// Subjects shown inline in the issue text before collapsing to "+N more"
pub const MAX_PREVIEW_SUBJECTS: usize = 5;

/// A principal bound to a role
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    User(String),
    Group(String),
    ServiceAccount { namespace: String, name: String },
    Other { kind: String, name: String },
}

impl From<&RbacSubject> for Subject {
    fn from(s: &RbacSubject) -> Self {
        match s.kind.as_str() {
            "User" => Subject::User(s.name.clone()),
            "Group" => Subject::Group(s.name.clone()),
            "ServiceAccount" => Subject::ServiceAccount {
                namespace: s.namespace.clone().unwrap_or_default(),
                name: s.name.clone(),
            },
            other => Subject::Other {
                kind: other.to_string(),
                name: s.name.clone(),
            },
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::User(name) => write!(f, "User:{}", name),
            Subject::Group(name) => write!(f, "Group:{}", name),
            Subject::ServiceAccount { namespace, name } => write!(f, "SA:{}/{}", namespace, name),
            Subject::Other { kind, name } => write!(f, "{}:{}", kind, name),
        }
    }
}

/// Rendered, deduplicated and lexicographically sorted subject labels
pub fn render_subjects(subjects: &[RbacSubject]) -> Vec<String> {
    subjects
        .iter()
        .map(|s| Subject::from(s).to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

/// Join up to `max` labels, noting how many were left out.
///
/// A `max` of zero disables truncation.
pub fn format_subject_preview(labels: &[String], max: usize) -> String {
    if max > 0 && labels.len() > max {
        format!("{}, +{} more", labels[..max].join(", "), labels.len() - max)
    } else {
        labels.join(", ")
    }
}

/// One risky-permission condition evaluated against every policy rule
pub struct RiskRule {
    pub field: &'static str,
    pub detail: &'static str,
    pub matches: fn(&PolicyRule) -> bool,
}

fn contains_any(values: &[String], targets: &[&str]) -> bool {
    values.iter().any(|v| targets.contains(&v.as_str()))
}

fn resources(rule: &PolicyRule) -> &[String] {
    rule.resources.as_deref().unwrap_or(&[])
}

fn api_groups(rule: &PolicyRule) -> &[String] {
    rule.api_groups.as_deref().unwrap_or(&[])
}

pub static RISK_RULES: [RiskRule; 7] = [
    RiskRule {
        field: "verbs",
        detail: "*",
        matches: |r| contains_any(&r.verbs, &["*"]),
    },
    RiskRule {
        field: "resources",
        detail: "*",
        matches: |r| contains_any(resources(r), &["*"]),
    },
    RiskRule {
        field: "API groups",
        detail: "*",
        matches: |r| contains_any(api_groups(r), &["*"]),
    },
    RiskRule {
        field: "permissions",
        detail: "Secrets read access (get/list/watch)",
        matches: |r| {
            contains_any(resources(r), &["secrets"]) && contains_any(&r.verbs, &["get", "list", "watch"])
        },
    },
    RiskRule {
        field: "permissions",
        detail: "Impersonation",
        matches: |r| contains_any(&r.verbs, &["impersonate"]),
    },
    RiskRule {
        field: "permissions",
        detail: "Pod exec creation",
        matches: |r| contains_any(resources(r), &["pods/exec"]) && contains_any(&r.verbs, &["create"]),
    },
    RiskRule {
        field: "permissions",
        detail: "RBAC privilege escalation (bind/escalate)",
        matches: |r| {
            contains_any(
                resources(r),
                &["roles", "clusterroles", "rolebindings", "clusterrolebindings"],
            ) && contains_any(&r.verbs, &["bind", "escalate"])
        },
    },
];

/// Every risk condition a single rule trips, in table order
pub fn risky_conditions(rule: &PolicyRule) -> impl Iterator<Item = &'static RiskRule> + '_ {
    RISK_RULES.iter().filter(move |risk| (risk.matches)(rule))
}

fn record_role_findings(
    kind: &str,
    namespace: String,
    name: String,
    rules: &[PolicyRule],
    bound_to: &[RbacSubject],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    let subjects = render_subjects(bound_to);
    let preview = format_subject_preview(&subjects, MAX_PREVIEW_SUBJECTS);

    for risk in rules.iter().flat_map(risky_conditions) {
        let mut issue = format!("{} has risky {}: {}", kind, risk.field, risk.detail);
        if !preview.is_empty() {
            issue.push_str(&format!(" (bound to: {})", preview));
        }
        auditor.record(
            Finding {
                namespace: namespace.clone(),
                resource: name.clone(),
                kind: kind.to_string(),
                container: String::new(),
                issue,
                suggestion: format!(
                    "Restrict the {} to only those necessary for this {}.",
                    risk.field, kind
                ),
                subjects: subjects.clone(),
            },
            filtering,
        );
    }
}

/// Analyze already-listed RBAC objects.
///
/// RoleBindings only contribute subjects to Roles and ClusterRoleBindings only
/// to ClusterRoles; a RoleBinding that references a ClusterRole is ignored.
pub fn analyze_rbac(
    roles: &[Role],
    role_bindings: &[RoleBinding],
    cluster_roles: &[ClusterRole],
    cluster_role_bindings: &[ClusterRoleBinding],
    auditor: &mut Auditor,
    filtering: Filtering,
) {
    let mut role_subjects: HashMap<(String, String), Vec<RbacSubject>> = HashMap::new();
    for rb in role_bindings.iter().filter(|rb| rb.role_ref.kind == "Role") {
        role_subjects
            .entry((rb.namespace().unwrap_or_default(), rb.role_ref.name.clone()))
            .or_default()
            .extend(rb.subjects.iter().flatten().cloned());
    }

    for role in roles {
        let namespace = role.namespace().unwrap_or_default();
        let name = role.name_any();
        let bound_to = role_subjects
            .get(&(namespace.clone(), name.clone()))
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let rules = role.rules.as_deref().unwrap_or(&[]);
        record_role_findings("Role", namespace, name, rules, bound_to, auditor, filtering);
    }

    let mut cluster_role_subjects: HashMap<String, Vec<RbacSubject>> = HashMap::new();
    for crb in cluster_role_bindings
        .iter()
        .filter(|crb| crb.role_ref.kind == "ClusterRole")
    {
        cluster_role_subjects
            .entry(crb.role_ref.name.clone())
            .or_default()
            .extend(crb.subjects.iter().flatten().cloned());
    }

    for cluster_role in cluster_roles {
        let name = cluster_role.name_any();
        let bound_to = cluster_role_subjects
            .get(&name)
            .map(Vec::as_slice)
            .unwrap_or(&[]);
        let rules = cluster_role.rules.as_deref().unwrap_or(&[]);
        record_role_findings(
            "ClusterRole",
            String::new(),
            name,
            rules,
            bound_to,
            auditor,
            filtering,
        );
    }
}

/// Flag risky permissions on Roles in scope and on every ClusterRole
pub async fn check_rbac(
    reader: &dyn ClusterReader,
    namespace: &str,
    auditor: &mut Auditor,
    filtering: Filtering,
) -> Result<(), AuditError> {
    let role_bindings = reader
        .role_bindings(namespace)
        .await
        .map_err(AuditError::list("rolebindings"))?;
    let cluster_role_bindings = reader
        .cluster_role_bindings()
        .await
        .map_err(AuditError::list("clusterrolebindings"))?;
    let roles = reader
        .roles(namespace)
        .await
        .map_err(AuditError::list("roles"))?;
    let cluster_roles = reader
        .cluster_roles()
        .await
        .map_err(AuditError::list("clusterroles"))?;

    analyze_rbac(
        &roles,
        &role_bindings,
        &cluster_roles,
        &cluster_role_bindings,
        auditor,
        filtering,
    );
    Ok(())
}
