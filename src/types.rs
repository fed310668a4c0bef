use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::checks::Check;
use crate::findings::ExclusionPolicy;

/// One detected issue
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Finding {
    pub namespace: String,
    pub resource: String,
    pub kind: String,
    pub container: String,
    pub issue: String,
    pub suggestion: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Empty means every namespace
    pub namespace: String,
    pub checks: Vec<Check>,
    pub exclusions: ExclusionPolicy,
    pub output: OutputOptions,
    pub db_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutputOptions {
    pub json: bool,
    pub yaml: bool,
    pub file: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub bind_addr: String,
    pub db_path: PathBuf,
}

/// A stored finding as returned by the query service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FindingView {
    pub namespace: String,
    pub resource: String,
    pub kind: String,
    pub container: String,
    pub issue: String,
    pub suggestion: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindingsResponse {
    pub findings: Vec<FindingView>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthScore {
    pub score: f64,
    pub status: String,
}
