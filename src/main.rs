use std::sync::Arc;

use verifai_api::config::Config;
use verifai_api::services::cleanup;
use verifai_api::{AppState, build_app, logging, storage};

#[tokio::main]
async fn main() {
    logging::init();

    let config = Config::from_env();
    storage::ensure_upload_dirs(&config.uploads_dir)
        .await
        .unwrap_or_else(|e| {
            panic!(
                "Failed to create upload directories under {}: {}",
                config.uploads_dir.display(),
                e
            )
        });

    if config.retention_hours > 0 {
        tokio::spawn(cleanup::run_cleanup_worker(
            config.uploads_dir.clone(),
            config.retention_hours,
            config.cleanup_interval_secs,
        ));
    }

    let addr = config.bind_addr();
    tracing::info!(
        strategy = %config.strategy,
        uploads = %config.uploads_dir.display(),
        "Starting VerifiAI API"
    );

    let state = Arc::new(AppState::new(config));
    let app = build_app(state);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind to {}: {}", addr, e));

    tracing::info!("Listening on http://{}", addr);
    axum::serve(listener, app).await.expect("Server failed");
}
