// Public modules
pub mod types;
pub mod error;
pub mod config;
pub mod parsing;
pub mod cluster;
pub mod workloads;
pub mod findings;
pub mod checks;
pub mod runner;
pub mod report;
pub mod store;
pub mod service;

// Re-export commonly used items
pub use types::*;
pub use error::{AuditError, CheckFailure, ClusterError, ExportError, StoreError};
pub use config::{
    load_config, load_config_with_env, load_server_config, load_server_config_with_env,
    EnvironmentProvider, MockEnvironment, SystemEnvironment,
};
pub use parsing::{parse_image_ref, round_to_hours, ImageRef};
pub use cluster::{ensure_cluster_reachable, ClusterReader, FakeCluster, KubeClusterReader};
pub use workloads::{gather_workloads, Workload, WorkloadKind};
pub use findings::{Auditor, ExclusionPolicy, Filtering};
pub use checks::Check;
pub use runner::AuditRunner;
pub use report::{AuditReport, OutputFormat, ReportSummary};
pub use store::FindingsStore;
pub use service::{build_router, AppState};
