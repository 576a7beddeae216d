//! Runs a scoring strategy over a saved upload

use bytes::Bytes;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use std::path::Path;

use super::scoring::{self, FrameScore, FrameScorer};
use super::{AnalysisError, Report, ScoringStrategy, video};
use crate::frames::{FfmpegFrames, FrameSource};
use crate::media::MediaKind;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoSettings {
    pub max_frames: usize,
    pub ffmpeg_threads: usize,
}

pub struct Detector<S = FfmpegFrames> {
    strategy: ScoringStrategy,
    max_frames: usize,
    frames: S,
}

impl Detector {
    pub fn new(strategy: ScoringStrategy, video: VideoSettings) -> Self {
        Self::with_frame_source(
            strategy,
            video.max_frames,
            FfmpegFrames {
                threads: video.ffmpeg_threads,
            },
        )
    }
}

impl<S: FrameSource> Detector<S> {
    pub fn with_frame_source(strategy: ScoringStrategy, max_frames: usize, frames: S) -> Self {
        Self {
            strategy,
            max_frames,
            frames,
        }
    }

    /// Score an upload. `path` is where `data` was saved; videos are read from there.
    pub async fn analyze(
        &self,
        kind: MediaKind,
        path: &Path,
        data: Bytes,
    ) -> Result<Report, AnalysisError> {
        match (self.strategy.frame_scorer(), kind) {
            (None, MediaKind::Image) => Ok(self.content_hash(data, 0)),
            (None, MediaKind::Video) => Ok(self.content_hash(data, self.max_frames)),
            (Some(scorer), MediaKind::Image) => self.analyze_image(scorer, data).await,
            (Some(scorer), MediaKind::Video) => self.analyze_video(scorer, path).await,
        }
    }

    fn content_hash(&self, data: Bytes, synthetic_frames: usize) -> Report {
        let scored = scoring::content_hash(&data, synthetic_frames);
        let report = Report::new(self.strategy, scored.score, scored.features);
        if synthetic_frames > 0 {
            report.with_frames(scored.frame_scores, None)
        } else {
            report
        }
    }

    async fn analyze_image(&self, scorer: FrameScorer, data: Bytes) -> Result<Report, AnalysisError> {
        let frame = tokio::task::spawn_blocking(move || -> Result<FrameScore, AnalysisError> {
            let image = decode_image(&data)?;
            Ok(scorer.score(&image))
        })
        .await
        .map_err(|e| AnalysisError::Worker(e.to_string()))??;

        Ok(Report::new(self.strategy, frame.score, frame.features))
    }

    async fn analyze_video(&self, scorer: FrameScorer, path: &Path) -> Result<Report, AnalysisError> {
        let probe = self.frames.probe(path).await?;
        let positions = video::sample_positions(probe.frame_count, self.max_frames);

        let mut scored = Vec::with_capacity(positions.len());
        for position in positions {
            match self.score_frame(scorer, path, position).await {
                Ok(frame) => scored.push(frame),
                Err(e) => {
                    tracing::warn!(position, "Skipping frame: {}", e);
                }
            }
        }

        let summary = video::summarize(&scored)?;
        tracing::info!(
            path = %path.display(),
            frames_analyzed = summary.frame_scores.len(),
            score = summary.score,
            "Video analyzed"
        );

        Ok(Report::new(self.strategy, summary.score, summary.features)
            .with_frames(summary.frame_scores, Some(probe.frame_count)))
    }

    async fn score_frame(
        &self,
        scorer: FrameScorer,
        path: &Path,
        position: u64,
    ) -> Result<FrameScore, AnalysisError> {
        let image = self.frames.read_frame(path, position).await?;
        tokio::task::spawn_blocking(move || scorer.score(&image))
            .await
            .map_err(|e| AnalysisError::Worker(e.to_string()))
    }
}

pub fn decode_image(data: &[u8]) -> Result<DynamicImage, AnalysisError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()
        .map_err(|e| AnalysisError::Decode(format!("Could not read image file: {}", e)))
}
