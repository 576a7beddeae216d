//! Local upload storage.
//!
//! Everything lives under one upload root that is also served statically at
//! `/uploads`, so a stored file's public path is its path relative to the root.

use std::io;
use std::path::{Path, PathBuf};

use crate::constants::{IMAGES_DIR, TEST_DIR, THUMBNAILS_DIR, UPLOADS_URL_PREFIX, VIDEOS_DIR};
use crate::media::MediaKind;

pub const UPLOAD_SUBDIRS: &[&str] = &[IMAGES_DIR, VIDEOS_DIR, THUMBNAILS_DIR, TEST_DIR];

/// Create the upload root and its sub-directories.
pub async fn ensure_upload_dirs(root: &Path) -> io::Result<()> {
    tokio::fs::create_dir_all(root).await?;
    for sub in UPLOAD_SUBDIRS {
        tokio::fs::create_dir_all(root.join(sub)).await?;
    }
    Ok(())
}

/// Fresh `<uuid><ext>` file name
pub fn unique_name(extension: &str) -> String {
    format!("{}{}", uuid::Uuid::new_v4(), extension)
}

/// Where an upload of this kind is stored
pub fn media_path(root: &Path, kind: MediaKind, extension: &str) -> PathBuf {
    root.join(kind.dir_name()).join(unique_name(extension))
}

/// Write `data` and confirm it landed with a non-zero length.
pub async fn save_upload(path: &Path, data: &[u8]) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await?;
    }
    tokio::fs::write(path, data).await?;

    let meta = tokio::fs::metadata(path).await?;
    if meta.len() == 0 {
        return Err(io::Error::other("Failed to save file properly"));
    }
    Ok(())
}

/// URL path under the static mount, e.g. `/uploads/images/<uuid>.png`
pub fn public_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    let parts: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    format!("{}/{}", UPLOADS_URL_PREFIX, parts.join("/"))
}

/// Best-effort removal; a missing file is not an error.
pub async fn remove_file(path: &Path) {
    match tokio::fs::remove_file(path).await {
        Ok(()) => tracing::info!("Removed {}", path.display()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => tracing::warn!("Failed to remove {}: {}", path.display(), e),
    }
}

/// Write then delete a probe file to check the directory accepts writes.
pub async fn is_writable(dir: &Path) -> bool {
    let probe = dir.join(format!(".write_probe_{}", rand::random::<u64>()));
    match tokio::fs::write(&probe, b"probe").await {
        Ok(()) => {
            let _ = tokio::fs::remove_file(&probe).await;
            true
        }
        Err(_) => false,
    }
}

/// Exists, is a directory, and accepts a new file.
pub async fn is_writable_dir(dir: &Path) -> bool {
    let is_dir = tokio::fs::metadata(dir)
        .await
        .map(|m| m.is_dir())
        .unwrap_or(false);
    is_dir && is_writable(dir).await
}
