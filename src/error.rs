use thiserror::Error;

use crate::workloads::WorkloadKind;

/// Failure reaching the cluster API for a single list call
#[derive(Debug, Error)]
pub enum ClusterError {
    #[error(transparent)]
    Kube(#[from] kube::Error),
    #[error("{0}")]
    Unavailable(String),
}

/// Error surfaced by a single check
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("failed to list {kind}: {source}")]
    List {
        kind: &'static str,
        #[source]
        source: ClusterError,
    },
    #[error("failed to gather {kind} workloads: {source}")]
    Gather {
        kind: WorkloadKind,
        #[source]
        source: ClusterError,
    },
}

impl AuditError {
    pub fn list(kind: &'static str) -> impl FnOnce(ClusterError) -> AuditError {
        move |source| AuditError::List { kind, source }
    }
}

/// A check that could not complete; sibling checks still run
#[derive(Debug, Error)]
#[error("check {check} failed: {error}")]
pub struct CheckFailure {
    pub check: &'static str,
    #[source]
    pub error: AuditError,
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),
    #[error("encode subjects: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to marshal findings as JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("failed to marshal findings as YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("failed to write report file {path}: {source}")]
    Write {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
