use axum::{Json, Router, extract::State, routing::get};
use std::sync::Arc;

use crate::AppState;
use crate::constants::{SERVICE_NAME, SERVICE_VERSION};
use crate::models::{HealthResponse, RootResponse};
use crate::storage;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
}

/// GET / - Service name and version
async fn root() -> Json<RootResponse> {
    Json(RootResponse {
        message: SERVICE_NAME,
        version: SERVICE_VERSION,
    })
}

/// GET /health - Liveness plus model and upload directory checks
async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    let model_file_exists = tokio::fs::try_exists(&state.config.model_path)
        .await
        .unwrap_or(false);
    let uploads_directory = storage::is_writable_dir(&state.config.uploads_dir).await;

    Json(HealthResponse {
        status: "healthy",
        model_loaded: false,
        model_file_exists,
        uploads_directory,
        strategy: state.config.strategy.to_string(),
    })
}
