use anyhow::{Context, Result};
use tokio::net::TcpListener;
use tracing::info;

use cluster_auditor::service::{serve, AppState};
use cluster_auditor::load_server_config;

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cfg = load_server_config()?;
    info!("serving findings from {}", cfg.db_path.display());

    let listener = TcpListener::bind(&cfg.bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", cfg.bind_addr))?;
    serve(listener, AppState::new(cfg.db_path))
        .await
        .context("Query service stopped with an error")?;
    Ok(())
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .try_init();
}
