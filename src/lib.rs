//! VerifiAI: deepfake-likelihood scoring for uploaded images and videos.

pub mod analysis;
pub mod config;
pub mod constants;
pub mod frames;
pub mod logging;
pub mod media;
pub mod models;
pub mod routes;
pub mod services;
pub mod storage;
pub mod thumbnails;

use axum::{Router, extract::DefaultBodyLimit, http::HeaderValue};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use config::{Config, CorsOrigins};
use constants::UPLOADS_URL_PREFIX;
use services::cache::PredictionCache;

pub struct AppState {
    pub config: Config,
    pub cache: PredictionCache,
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        let cache = PredictionCache::new(config.cache_capacity);
        Self {
            config,
            cache,
            started_at: Utc::now(),
        }
    }
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    match origins {
        CorsOrigins::Any => CorsLayer::permissive(),
        CorsOrigins::List(list) => {
            let origins: Vec<HeaderValue> = list
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!("Ignoring invalid CORS origin: {}", o);
                        None
                    }
                })
                .collect();

            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    }
}

/// Router with every route, the `/uploads` static mount and the shared layers
pub fn build_app(state: Arc<AppState>) -> Router {
    let uploads = ServeDir::new(&state.config.uploads_dir);

    routes::build_routes()
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(DefaultBodyLimit::max(state.config.body_limit()))
        .layer(cors_layer(&state.config.cors_origins))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
