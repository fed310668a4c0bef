use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use http::StatusCode;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing::{error, info};

use crate::error::StoreError;
use crate::store::FindingsStore;
use crate::types::{FindingView, FindingsResponse, HealthScore};

/// Placeholder health score until a real computation exists
pub const STUB_HEALTH_SCORE: f64 = 87.3;
pub const STUB_HEALTH_STATUS: &str = "Healthy";

#[derive(Debug, Clone)]
pub struct AppState {
    pub db_path: Arc<PathBuf>,
}

impl AppState {
    pub fn new(db_path: impl Into<PathBuf>) -> Self {
        Self {
            db_path: Arc::new(db_path.into()),
        }
    }
}

type ApiError = (StatusCode, String);

fn internal(e: impl std::fmt::Display) -> ApiError {
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

/// Every request gets its own read-only connection on a blocking thread
async fn load_views(db_path: Arc<PathBuf>) -> Result<Vec<FindingView>, ApiError> {
    tokio::task::spawn_blocking(move || -> Result<Vec<FindingView>, StoreError> {
        FindingsStore::open_readonly(db_path.as_path())?.list_finding_views()
    })
    .await
    .map_err(internal)?
    .map_err(|e| {
        error!("failed to read findings: {}", e);
        internal(e)
    })
}

pub async fn get_findings(
    State(state): State<AppState>,
) -> Result<Json<FindingsResponse>, ApiError> {
    let findings = load_views(state.db_path.clone()).await?;
    Ok(Json(FindingsResponse { findings }))
}

pub async fn get_health_score() -> Json<HealthScore> {
    Json(HealthScore {
        score: STUB_HEALTH_SCORE,
        status: STUB_HEALTH_STATUS.to_string(),
    })
}

pub async fn healthz() -> &'static str {
    "ok"
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/v1/findings", get(get_findings))
        .route("/v1/health-score", get(get_health_score))
        .with_state(state)
}

/// Serve the query API until ctrl-c
pub async fn serve(listener: TcpListener, state: AppState) -> std::io::Result<()> {
    if let Ok(addr) = listener.local_addr() {
        info!("query service listening on {}", addr);
    }
    axum::serve(listener, build_router(state))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            info!("shutting down query service");
        })
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Finding;

    #[tokio::test]
    async fn test_health_score_stub() {
        let Json(score) = get_health_score().await;
        assert_eq!(score.score, 87.3);
        assert_eq!(score.status, "Healthy");
    }

    #[tokio::test]
    async fn test_findings_handler_reads_store() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("audit.db");
        let store = FindingsStore::open(&path).unwrap();
        store
            .insert(&Finding {
                namespace: "default".to_string(),
                resource: "web".to_string(),
                kind: "Deployment".to_string(),
                container: "app".to_string(),
                issue: "Missing resource limits".to_string(),
                suggestion: "Add resource requests and limits to this container.".to_string(),
                subjects: Vec::new(),
            })
            .unwrap();
        store.close().unwrap();

        let Json(body) = get_findings(State(AppState::new(&path))).await.unwrap();
        assert_eq!(body.findings.len(), 1);
        assert_eq!(body.findings[0].container, "app");
    }

    #[tokio::test]
    async fn test_missing_database_is_server_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = get_findings(State(AppState::new(dir.path().join("nope.db"))))
            .await
            .unwrap_err();
        assert_eq!(err.0, StatusCode::INTERNAL_SERVER_ERROR);
    }
}
