//! Video thumbnails for prediction responses
//!
//! Takes the middle frame, falling back to the first one when that fails.

use std::path::{Path, PathBuf};

use crate::analysis::AnalysisError;
use crate::frames;

const THUMBNAIL_WIDTH: u32 = 300;

/// Write `<uuid>.jpg` into `thumbnails_dir` and return its path.
pub async fn generate_video_thumbnail(
    video_path: &Path,
    frame_count: Option<u64>,
    thumbnails_dir: &Path,
    ffmpeg_threads: usize,
) -> Result<PathBuf, AnalysisError> {
    let output_path = thumbnails_dir.join(format!("{}.jpg", uuid::Uuid::new_v4()));
    let scale = format!("scale={}:-1", THUMBNAIL_WIDTH);
    let middle = middle_position(frame_count);

    let first_attempt = frames::write_frame(
        video_path,
        middle,
        &output_path,
        ffmpeg_threads,
        Some(&scale),
    )
    .await;

    if let Err(e) = first_attempt {
        if middle == 0 {
            return Err(e);
        }
        tracing::warn!(
            "Thumbnail from frame {} failed (trying first frame): {}",
            middle,
            e
        );
        frames::write_frame(video_path, 0, &output_path, ffmpeg_threads, Some(&scale)).await?;
    }

    Ok(output_path)
}

fn middle_position(frame_count: Option<u64>) -> u64 {
    frame_count.map(|n| n / 2).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn picks_middle_frame() {
        assert_eq!(middle_position(Some(301)), 150);
        assert_eq!(middle_position(Some(1)), 0);
        assert_eq!(middle_position(None), 0);
    }

    #[tokio::test]
    async fn unreadable_video_yields_error() {
        let dir = tempfile::tempdir().unwrap();
        let video = dir.path().join("broken.mp4");
        tokio::fs::write(&video, b"not a video").await.unwrap();

        let result = generate_video_thumbnail(&video, Some(10), dir.path(), 1).await;
        assert!(result.is_err());
    }
}
