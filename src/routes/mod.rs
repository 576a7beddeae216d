pub mod diagnostics;
pub mod predict;
pub mod system;
pub mod upload;

use axum::Router;
use std::sync::Arc;

use crate::AppState;

/// Build all routes for the API, served both at the root and under `/api`
pub fn build_routes() -> Router<Arc<AppState>> {
    let api = Router::new()
        .merge(system::routes())
        .merge(upload::routes())
        .merge(predict::routes())
        .merge(diagnostics::routes());

    Router::new().nest("/api", api.clone()).merge(api)
}
