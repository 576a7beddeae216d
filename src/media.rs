//! Classification and validation of uploaded media

use serde::Serialize;
use std::path::Path;
use thiserror::Error;

use crate::constants::{IMAGES_DIR, VIDEOS_DIR};

const IMAGE_EXTENSIONS: &[&str] = &[".jpg", ".jpeg", ".png", ".gif", ".bmp", ".webp"];
const VIDEO_EXTENSIONS: &[&str] = &[".mp4", ".avi", ".mov", ".wmv", ".flv", ".mkv", ".webm"];

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MediaError {
    #[error("File must be an image or video. Got extension: {extension}, content-type: {content_type}")]
    Unsupported {
        extension: String,
        content_type: String,
    },

    #[error("Empty file content")]
    Empty,

    #[error("{kind} file too large. Maximum size is {max_mb}MB.")]
    TooLarge { kind: &'static str, max_mb: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaKind {
    Image,
    Video,
}

impl MediaKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaKind::Image => "image",
            MediaKind::Video => "video",
        }
    }

    /// Upload sub-directory for this kind
    pub fn dir_name(&self) -> &'static str {
        match self {
            MediaKind::Image => IMAGES_DIR,
            MediaKind::Video => VIDEOS_DIR,
        }
    }
}

/// A classified upload: what it is and the extension it is stored under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Classified {
    pub kind: MediaKind,
    pub extension: String,
}

/// Lower-cased extension with its leading dot, or "" when there is none
pub fn file_extension(filename: &str) -> String {
    Path::new(filename)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}

/// Extension used when only the content type is known
pub fn get_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => ".png",
        "image/jpeg" | "image/jpg" => ".jpg",
        "image/webp" => ".webp",
        "image/gif" => ".gif",
        "image/bmp" => ".bmp",
        "video/mp4" => ".mp4",
        "video/webm" => ".webm",
        "video/quicktime" => ".mov",
        "video/x-msvideo" => ".avi",
        "video/x-matroska" => ".mkv",
        _ => ".bin",
    }
}

/// Classify by extension first, falling back to the declared content type.
pub fn classify(filename: Option<&str>, content_type: Option<&str>) -> Result<Classified, MediaError> {
    let extension = filename.map(file_extension).unwrap_or_default();

    if IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Classified {
            kind: MediaKind::Image,
            extension,
        });
    }
    if VIDEO_EXTENSIONS.contains(&extension.as_str()) {
        return Ok(Classified {
            kind: MediaKind::Video,
            extension,
        });
    }

    let content_type = content_type.unwrap_or("").to_lowercase();
    let kind = if content_type.starts_with("image/") {
        MediaKind::Image
    } else if content_type.starts_with("video/") {
        MediaKind::Video
    } else {
        return Err(MediaError::Unsupported {
            extension,
            content_type,
        });
    };

    let extension = if extension.is_empty() {
        get_extension(&content_type).to_string()
    } else {
        extension
    };

    Ok(Classified { kind, extension })
}

/// Reject empty or oversized content for the given kind.
pub fn validate_size(
    kind: MediaKind,
    len: usize,
    max_image_bytes: usize,
    max_video_bytes: usize,
) -> Result<(), MediaError> {
    if len == 0 {
        return Err(MediaError::Empty);
    }

    let (limit, label) = match kind {
        MediaKind::Image => (max_image_bytes, "Image"),
        MediaKind::Video => (max_video_bytes, "Video"),
    };

    if len > limit {
        return Err(MediaError::TooLarge {
            kind: label,
            max_mb: limit / (1024 * 1024),
        });
    }
    Ok(())
}
