use anyhow::{bail, Context, Result};
use kube::Client;
use tracing::{error, info, warn};

use cluster_auditor::report::write_report;
use cluster_auditor::{
    ensure_cluster_reachable, load_config, AuditRunner, FindingsStore, KubeClusterReader,
    OutputFormat,
};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_config()?;
    let scope = if cfg.namespace.is_empty() { "<all>" } else { cfg.namespace.as_str() };
    info!("namespace = {}, checks = {:?}", scope, cfg.checks);

    let client = Client::try_default()
        .await
        .context("Failed to build Kubernetes client")?;
    let reader = KubeClusterReader::new(client);

    // Fail fast before running any check
    ensure_cluster_reachable(&reader)
        .await
        .context("Kubernetes API is not reachable")?;

    let report = AuditRunner::new(&reader, &cfg).run().await;

    let mut formats = Vec::new();
    if cfg.output.json {
        formats.push(OutputFormat::Json);
    }
    if cfg.output.yaml {
        formats.push(OutputFormat::Yaml);
    }
    if formats.is_empty() {
        warn!("No output format enabled; set AUDIT_OUTPUT_JSON and/or AUDIT_OUTPUT_YAML");
    }
    for format in formats {
        if let Err(e) = write_report(&report.findings, format, cfg.output.file.as_deref()) {
            error!("Failed to write {} audit report: {}", format, e);
        }
    }

    if let Some(db_path) = &cfg.db_path {
        let store = FindingsStore::open(db_path)
            .with_context(|| format!("Failed to open findings store {}", db_path.display()))?;
        store.insert_all(&report.findings);
        store.close().context("Failed to close findings store")?;
    }

    let summary = report.summary();
    info!(
        "Audit finished: {} findings {:?}",
        summary.total_findings, summary.findings_by_kind
    );

    if report.has_failures() {
        for failure in &report.failures {
            error!("{}", failure);
        }
        bail!("{} check(s) failed: {:?}", summary.failed_checks.len(), summary.failed_checks);
    }

    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
