pub mod export;

pub use export::{render_json, render_yaml, write_report, OutputFormat};

use std::collections::BTreeMap;

use crate::error::CheckFailure;
use crate::types::Finding;

/// Outcome of one audit run
#[derive(Debug, Default)]
pub struct AuditReport {
    pub findings: Vec<Finding>,
    pub failures: Vec<CheckFailure>,
}

impl AuditReport {
    pub fn new(findings: Vec<Finding>, failures: Vec<CheckFailure>) -> Self {
        Self { findings, failures }
    }

    /// True when at least one check could not complete
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    pub fn summary(&self) -> ReportSummary {
        let mut findings_by_kind = BTreeMap::new();
        for finding in &self.findings {
            *findings_by_kind.entry(finding.kind.clone()).or_insert(0) += 1;
        }
        ReportSummary {
            total_findings: self.findings.len(),
            findings_by_kind,
            failed_checks: self.failures.iter().map(|f| f.check).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSummary {
    pub total_findings: usize,
    pub findings_by_kind: BTreeMap<String, usize>,
    pub failed_checks: Vec<&'static str>,
}
