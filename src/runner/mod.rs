use std::collections::{HashMap, HashSet};
use tracing::{error, info};

use crate::checks::Check;
use crate::cluster::ClusterReader;
use crate::error::CheckFailure;
use crate::findings::{Auditor, Filtering};
use crate::report::AuditReport;
use crate::types::Config;

/// Runs the configured checks against one cluster snapshot
pub struct AuditRunner<'a> {
    reader: &'a dyn ClusterReader,
    config: &'a Config,
    filtering: HashMap<Check, Filtering>,
}

impl<'a> AuditRunner<'a> {
    pub fn new(reader: &'a dyn ClusterReader, config: &'a Config) -> Self {
        Self {
            reader,
            config,
            filtering: HashMap::new(),
        }
    }

    /// Route a check's findings through (or around) the exclusion policy
    pub fn with_filtering(mut self, check: Check, filtering: Filtering) -> Self {
        self.filtering.insert(check, filtering);
        self
    }

    pub fn filtering_for(&self, check: Check) -> Filtering {
        self.filtering
            .get(&check)
            .copied()
            .unwrap_or_else(|| check.default_filtering())
    }

    /// Configured checks in order, duplicates dropped. No selection means all.
    pub fn selected_checks(&self) -> Vec<Check> {
        if self.config.checks.is_empty() {
            return Check::ALL.to_vec();
        }
        let mut seen = HashSet::new();
        self.config
            .checks
            .iter()
            .copied()
            .filter(|c| seen.insert(*c))
            .collect()
    }

    /// Run every selected check sequentially.
    ///
    /// A failing check is recorded in the report and the run moves on.
    pub async fn run(&self) -> AuditReport {
        let namespace = self.config.namespace.as_str();
        let scope = if namespace.is_empty() { "all namespaces" } else { namespace };
        let mut auditor = Auditor::new(self.config.exclusions.clone());
        let mut failures = Vec::new();

        for check in self.selected_checks() {
            info!("Running check {} on {}", check, scope);
            let before = auditor.len();
            match check
                .run(self.reader, namespace, &mut auditor, self.filtering_for(check))
                .await
            {
                Ok(()) => info!("Check {} produced {} findings", check, auditor.len() - before),
                Err(e) => {
                    error!("Check {} failed: {}", check, e);
                    failures.push(CheckFailure {
                        check: check.name(),
                        error: e,
                    });
                }
            }
        }

        AuditReport::new(auditor.into_findings(), failures)
    }
}
