pub mod exclusions;

pub use exclusions::ExclusionPolicy;

use tracing::debug;

use crate::types::Finding;

/// Whether a finding goes through the exclusion policy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Filtering {
    Filtered,
    Unfiltered,
}

/// Append-only sink for the findings of one audit run
#[derive(Debug, Default)]
pub struct Auditor {
    exclusions: ExclusionPolicy,
    findings: Vec<Finding>,
}

impl Auditor {
    pub fn new(exclusions: ExclusionPolicy) -> Self {
        Self {
            exclusions,
            findings: Vec::new(),
        }
    }

    pub fn add_finding(&mut self, finding: Finding) {
        self.findings.push(finding);
    }

    /// Returns false when the policy dropped the finding
    pub fn add_finding_with_filter(&mut self, finding: Finding) -> bool {
        if self.exclusions.is_excluded(&finding.namespace, &finding.resource) {
            debug!(
                "dropping excluded finding for {}/{}",
                finding.namespace, finding.resource
            );
            return false;
        }
        self.add_finding(finding);
        true
    }

    pub fn record(&mut self, finding: Finding, filtering: Filtering) {
        match filtering {
            Filtering::Filtered => {
                self.add_finding_with_filter(finding);
            }
            Filtering::Unfiltered => self.add_finding(finding),
        }
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn into_findings(self) -> Vec<Finding> {
        self.findings
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finding(namespace: &str, resource: &str) -> Finding {
        Finding {
            namespace: namespace.to_string(),
            resource: resource.to_string(),
            kind: "Deployment".to_string(),
            container: "app".to_string(),
            issue: "Missing resource limits".to_string(),
            suggestion: "Add resource requests and limits to this container.".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_filtered_path_drops_excluded_namespace() {
        let mut auditor = Auditor::new(ExclusionPolicy::builtin());
        assert!(!auditor.add_finding_with_filter(finding("kube-system", "coredns")));
        assert!(auditor.is_empty());

        auditor.add_finding(finding("kube-system", "coredns"));
        assert_eq!(auditor.len(), 1);
        assert_eq!(auditor.findings()[0].namespace, "kube-system");
    }

    #[test]
    fn test_filtered_path_drops_excluded_resource() {
        let mut auditor = Auditor::new(ExclusionPolicy::builtin());
        auditor.record(finding("default", "local-path-provisioner"), Filtering::Filtered);
        auditor.record(finding("default", "web"), Filtering::Filtered);
        assert_eq!(auditor.len(), 1);
        assert_eq!(auditor.findings()[0].resource, "web");
    }

    #[test]
    fn test_findings_keep_insertion_order() {
        let mut auditor = Auditor::default();
        auditor.record(finding("a", "one"), Filtering::Unfiltered);
        auditor.record(finding("b", "two"), Filtering::Filtered);
        auditor.record(finding("a", "one"), Filtering::Unfiltered);

        let findings = auditor.into_findings();
        let resources: Vec<_> = findings.iter().map(|f| f.resource.as_str()).collect();
        assert_eq!(resources, vec!["one", "two", "one"]);
    }
}
