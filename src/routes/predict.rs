use axum::{
    Json, Router,
    extract::{
        Multipart, Query, State,
        multipart::MultipartRejection,
        rejection::QueryRejection,
    },
    routing::post,
};
use serde::Deserialize;
use std::sync::Arc;

use super::upload::read_file_field;
use crate::AppState;
use crate::analysis::{Detector, ScoringStrategy, VideoSettings, hash};
use crate::constants::THUMBNAILS_DIR;
use crate::media::{self, MediaKind};
use crate::models::AnalysisResult;
use crate::services::error::{ApiError, LogErr};
use crate::{storage, thumbnails};

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/predict", post(predict))
        .route("/predict/", post(predict))
}

#[derive(Debug, Deserialize)]
struct PredictParams {
    strategy: Option<String>,
}

/// POST /predict - Score an uploaded image or video
async fn predict(
    State(state): State<Arc<AppState>>,
    params: Result<Query<PredictParams>, QueryRejection>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<AnalysisResult>, ApiError> {
    let config = &state.config;
    let Query(params) = params.log_400("Invalid query string")?;
    let mut multipart = multipart.log_400("Invalid multipart body")?;
    let strategy = match params.strategy.as_deref() {
        Some(raw) => raw.parse::<ScoringStrategy>().map_err(ApiError::BadRequest)?,
        None => config.strategy,
    };

    let part = read_file_field(&mut multipart).await?;
    let classified = media::classify(part.filename.as_deref(), part.content_type.as_deref())?;
    media::validate_size(
        classified.kind,
        part.data.len(),
        config.max_image_bytes,
        config.max_video_bytes,
    )?;

    let root = &config.uploads_dir;
    let path = storage::media_path(root, classified.kind, &classified.extension);
    storage::save_upload(&path, &part.data)
        .await
        .log_500("Failed to save file")?;

    tracing::info!(
        original = part.filename.as_deref().unwrap_or(""),
        kind = classified.kind.as_str(),
        bytes = part.data.len(),
        %strategy,
        "Saved upload to {}",
        path.display()
    );

    let digest = hash::content_digest(&part.data);
    let report = match state.cache.get(&digest, strategy) {
        Some(cached) => {
            tracing::info!(digest = %digest, "Using cached prediction");
            cached
        }
        None => {
            let detector = Detector::new(
                strategy,
                VideoSettings {
                    max_frames: config.max_frames,
                    ffmpeg_threads: config.ffmpeg_threads,
                },
            );
            match detector.analyze(classified.kind, &path, part.data).await {
                Ok(report) => {
                    state.cache.insert(digest, strategy, report.clone());
                    report
                }
                Err(e) => {
                    tracing::error!("Analysis failed for {}: {}", path.display(), e);
                    storage::remove_file(&path).await;
                    return Err(e.into());
                }
            }
        }
    };

    let thumbnail_path = match classified.kind {
        MediaKind::Video => {
            match thumbnails::generate_video_thumbnail(
                &path,
                report.total_frames,
                &root.join(THUMBNAILS_DIR),
                config.ffmpeg_threads,
            )
            .await
            {
                Ok(thumb) => Some(storage::public_path(root, &thumb)),
                Err(e) => {
                    tracing::warn!("Thumbnail generation failed for {}: {}", path.display(), e);
                    None
                }
            }
        }
        MediaKind::Image => None,
    };

    tracing::info!(
        score = report.score,
        category = %report.category,
        "Prediction complete for {}",
        path.display()
    );

    Ok(Json(AnalysisResult::from_report(
        &report,
        classified.kind,
        storage::public_path(root, &path),
        thumbnail_path,
    )))
}
