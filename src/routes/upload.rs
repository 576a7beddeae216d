use axum::{
    Json, Router,
    extract::{Multipart, State, multipart::MultipartRejection},
    routing::post,
};
use bytes::Bytes;
use std::sync::Arc;

use crate::AppState;
use crate::media::{self, MediaError};
use crate::models::UploadResponse;
use crate::services::error::{ApiError, LogErr};
use crate::storage;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/upload", post(upload))
        .route("/upload/", post(upload))
}

/// The `file` part of a multipart body
pub struct FilePart {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub data: Bytes,
}

/// Pull the `file` field out of the body, ignoring any other fields.
pub async fn read_file_field(multipart: &mut Multipart) -> Result<FilePart, ApiError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .log_400("Invalid multipart body")?
    {
        if field.name() != Some("file") {
            continue;
        }

        let filename = field.file_name().map(str::to_string);
        let content_type = field.content_type().map(str::to_string);
        let data = field.bytes().await.log_400("Failed to read uploaded file")?;

        return Ok(FilePart {
            filename,
            content_type,
            data,
        });
    }

    Err(ApiError::BadRequest("No file provided in field 'file'".into()))
}

/// POST /upload - Store a file as-is without analysis
async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<UploadResponse>, ApiError> {
    let mut multipart = multipart.log_400("Invalid multipart body")?;
    let part = read_file_field(&mut multipart).await?;
    if part.data.is_empty() {
        return Err(MediaError::Empty.into());
    }

    let limit = state.config.max_image_bytes.max(state.config.max_video_bytes);
    if part.data.len() > limit {
        return Err(MediaError::TooLarge {
            kind: "Uploaded",
            max_mb: limit / (1024 * 1024),
        }
        .into());
    }

    let mut extension = part
        .filename
        .as_deref()
        .map(media::file_extension)
        .unwrap_or_default();
    if extension.is_empty() {
        extension = media::get_extension(part.content_type.as_deref().unwrap_or("")).to_string();
    }

    let root = &state.config.uploads_dir;
    let path = root.join(storage::unique_name(&extension));
    storage::save_upload(&path, &part.data)
        .await
        .log_500("Failed to save file")?;

    tracing::info!(
        original = part.filename.as_deref().unwrap_or(""),
        bytes = part.data.len(),
        "Stored upload at {}",
        path.display()
    );

    let filename = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    Ok(Json(UploadResponse {
        message: "File uploaded successfully",
        filename,
        file_path: storage::public_path(root, &path),
    }))
}
