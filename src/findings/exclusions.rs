use std::collections::HashSet;

const BUILTIN_NAMESPACES: &[&str] = &["kube-system", "local-path-storage", "istio-system"];
const BUILTIN_RESOURCES: &[&str] = &["local-path-provisioner"];

/// Namespaces and resource names that never produce filtered findings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExclusionPolicy {
    namespaces: HashSet<String>,
    resources: HashSet<String>,
}

impl ExclusionPolicy {
    pub fn new<N, R>(namespaces: N, resources: R) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        Self {
            namespaces: namespaces.into_iter().map(Into::into).collect(),
            resources: resources.into_iter().map(Into::into).collect(),
        }
    }

    pub fn builtin() -> Self {
        Self::new(BUILTIN_NAMESPACES.iter().copied(), BUILTIN_RESOURCES.iter().copied())
    }

    pub fn empty() -> Self {
        Self::new(Vec::<String>::new(), Vec::<String>::new())
    }

    pub fn with_namespaces<N>(mut self, namespaces: N) -> Self
    where
        N: IntoIterator,
        N::Item: Into<String>,
    {
        self.namespaces = namespaces.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_resources<R>(mut self, resources: R) -> Self
    where
        R: IntoIterator,
        R::Item: Into<String>,
    {
        self.resources = resources.into_iter().map(Into::into).collect();
        self
    }

    pub fn is_excluded(&self, namespace: &str, resource: &str) -> bool {
        self.namespaces.contains(namespace) || self.resources.contains(resource)
    }
}

impl Default for ExclusionPolicy {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_policy() {
        let policy = ExclusionPolicy::builtin();
        assert!(policy.is_excluded("kube-system", "coredns"));
        assert!(policy.is_excluded("istio-system", "istiod"));
        assert!(policy.is_excluded("local-path-storage", "anything"));
        assert!(policy.is_excluded("default", "local-path-provisioner"));
        assert!(!policy.is_excluded("default", "web"));
        // cluster-scoped findings carry an empty namespace
        assert!(!policy.is_excluded("", "pv-1"));
    }

    #[test]
    fn test_overrides_replace_sets() {
        let policy = ExclusionPolicy::builtin()
            .with_namespaces(["monitoring"])
            .with_resources(Vec::<String>::new());
        assert!(policy.is_excluded("monitoring", "prometheus"));
        assert!(!policy.is_excluded("kube-system", "coredns"));
        assert!(!policy.is_excluded("default", "local-path-provisioner"));
    }

    #[test]
    fn test_empty_policy_excludes_nothing() {
        let policy = ExclusionPolicy::empty();
        assert!(!policy.is_excluded("kube-system", "local-path-provisioner"));
    }
}
