//! Self-test and environment inspection endpoints

use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::{get, post},
};
use chrono::Utc;
use image::{DynamicImage, ImageBuffer, ImageFormat, Rgb};
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::Arc;

use super::upload::read_file_field;
use crate::AppState;
use crate::analysis::FrameScorer;
use crate::analysis::detector::decode_image;
use crate::constants::{SERVICE_NAME, SERVICE_VERSION, TEST_DIR};
use crate::frames;
use crate::media;
use crate::services::error::{ApiError, LogErr};
use crate::storage::{self, UPLOAD_SUBDIRS};

const REPORTED_ENV_VARS: &[&str] = &[
    "HOST",
    "PORT",
    "UPLOADS_DIR",
    "MODEL_PATH",
    "SCORING_STRATEGY",
    "MAX_FRAMES",
    "FFMPEG_THREADS",
    "RUST_LOG",
];

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/predict/test", get(self_test))
        .route("/predict/diagnostics", get(diagnostics))
        .route("/predict/test-upload", post(test_upload))
}

#[derive(Serialize)]
struct SelfTestResponse {
    status: &'static str,
    message: String,
    test_file_written: bool,
    width: u32,
    height: u32,
    score: f64,
}

/// GET /predict/test - Round-trip a generated image through the test directory and score it
async fn self_test(State(state): State<Arc<AppState>>) -> Result<Json<SelfTestResponse>, ApiError> {
    let image = DynamicImage::ImageRgb8(ImageBuffer::from_fn(64, 64, |x, y| {
        Rgb([(x * 4) as u8, (y * 4) as u8, ((x + y) * 2) as u8])
    }));
    let mut encoded = Cursor::new(Vec::new());
    image
        .write_to(&mut encoded, ImageFormat::Png)
        .log_500("Failed to encode test image")?;

    let path = state
        .config
        .uploads_dir
        .join(TEST_DIR)
        .join(storage::unique_name(".png"));
    storage::save_upload(&path, encoded.get_ref())
        .await
        .log_500("Failed to write test image")?;

    let read_back = tokio::fs::read(&path).await;
    storage::remove_file(&path).await;
    let data = read_back.log_500("Failed to read test image")?;

    let (width, height, score) = tokio::task::spawn_blocking(move || {
        decode_image(&data).map(|img| {
            let frame = FrameScorer::Hybrid.score(&img);
            (img.width(), img.height(), frame.score)
        })
    })
    .await
    .log_500("Self-test worker failed")?
    .log_500("Failed to decode test image")?;

    Ok(Json(SelfTestResponse {
        status: "success",
        message: "Image encode, storage and decode are working".into(),
        test_file_written: true,
        width,
        height,
        score: crate::analysis::scoring::round2(score),
    }))
}

#[derive(Serialize)]
struct DirectoryStatus {
    path: String,
    exists: bool,
    writable: bool,
}

#[derive(Serialize)]
struct ModelStatus {
    path: String,
    exists: bool,
    loaded: bool,
}

#[derive(Serialize)]
struct ToolStatus {
    ffmpeg: bool,
    ffprobe: bool,
}

#[derive(Serialize)]
struct DiagnosticsResponse {
    timestamp: String,
    service: &'static str,
    version: &'static str,
    strategy: String,
    uptime_secs: i64,
    cwd: String,
    directories: Vec<DirectoryStatus>,
    model: ModelStatus,
    tools: ToolStatus,
    image_codecs: Vec<String>,
    cached_predictions: usize,
    environment: BTreeMap<String, Option<String>>,
}

async fn directory_status(dir: &Path) -> DirectoryStatus {
    let exists = tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    let writable = exists && storage::is_writable(dir).await;
    DirectoryStatus {
        path: dir.display().to_string(),
        exists,
        writable,
    }
}

/// GET /predict/diagnostics - Directories, tools, codecs and settings
async fn diagnostics(State(state): State<Arc<AppState>>) -> Json<DiagnosticsResponse> {
    let config = &state.config;

    let mut directories = vec![directory_status(&config.uploads_dir).await];
    for sub in UPLOAD_SUBDIRS {
        directories.push(directory_status(&config.uploads_dir.join(sub)).await);
    }

    let (ffmpeg, ffprobe) = tokio::join!(
        frames::tool_available("ffmpeg"),
        frames::tool_available("ffprobe")
    );

    let image_codecs = ImageFormat::all()
        .filter(|f| f.reading_enabled())
        .map(|f| format!("{:?}", f))
        .collect();

    let environment = REPORTED_ENV_VARS
        .iter()
        .map(|key| (key.to_string(), std::env::var(key).ok()))
        .collect();

    let cwd = std::env::current_dir()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|e| format!("unavailable: {}", e));

    let now = Utc::now();
    Json(DiagnosticsResponse {
        timestamp: now.to_rfc3339(),
        service: SERVICE_NAME,
        version: SERVICE_VERSION,
        strategy: config.strategy.to_string(),
        uptime_secs: (now - state.started_at).num_seconds(),
        cwd,
        directories,
        model: ModelStatus {
            path: config.model_path.display().to_string(),
            exists: tokio::fs::try_exists(&config.model_path)
                .await
                .unwrap_or(false),
            loaded: false,
        },
        tools: ToolStatus { ffmpeg, ffprobe },
        image_codecs,
        cached_predictions: state.cache.len(),
        environment,
    })
}

#[derive(Serialize)]
struct TestUploadResponse {
    status: &'static str,
    filename: Option<String>,
    content_type: Option<String>,
    size: usize,
    file_type: Option<&'static str>,
    saved_path: String,
    decoded: Option<bool>,
    width: Option<u32>,
    height: Option<u32>,
    error: Option<String>,
}

/// POST /predict/test-upload - Store a file in the test directory and try to decode it
async fn test_upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<TestUploadResponse>, ApiError> {
    let mut multipart = multipart.log_400("Invalid multipart body")?;
    let part = read_file_field(&mut multipart).await?;
    if part.data.is_empty() {
        return Err(media::MediaError::Empty.into());
    }

    let classified = media::classify(part.filename.as_deref(), part.content_type.as_deref()).ok();
    let extension = classified
        .as_ref()
        .map(|c| c.extension.clone())
        .unwrap_or_else(|| ".bin".to_string());

    let root = &state.config.uploads_dir;
    let path = root.join(TEST_DIR).join(storage::unique_name(&extension));
    storage::save_upload(&path, &part.data)
        .await
        .log_500("Failed to save test upload")?;

    let mut response = TestUploadResponse {
        status: "success",
        filename: part.filename.clone(),
        content_type: part.content_type.clone(),
        size: part.data.len(),
        file_type: classified.as_ref().map(|c| c.kind.as_str()),
        saved_path: storage::public_path(root, &path),
        decoded: None,
        width: None,
        height: None,
        error: None,
    };

    if classified.map(|c| c.kind) == Some(media::MediaKind::Image) {
        let data = part.data.clone();
        let decoded = tokio::task::spawn_blocking(move || {
            decode_image(&data).map(|img| (img.width(), img.height()))
        })
        .await
        .log_500("Decode worker failed")?;

        match decoded {
            Ok((width, height)) => {
                response.decoded = Some(true);
                response.width = Some(width);
                response.height = Some(height);
            }
            Err(e) => {
                tracing::warn!("Test upload did not decode: {}", e);
                response.decoded = Some(false);
                response.error = Some(e.to_string());
            }
        }
    }

    Ok(Json(response))
}
