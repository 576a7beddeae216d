//! Frame sampling and per-video aggregation

use super::AnalysisError;
use super::scoring::{FeatureScores, FrameScore};

/// Frame indices to score: at most `max_frames`, evenly strided from frame 0.
pub fn sample_positions(frame_count: u64, max_frames: usize) -> Vec<u64> {
    let max_frames = max_frames.max(1) as u64;
    let to_analyze = frame_count.min(max_frames);
    let interval = if frame_count <= max_frames {
        1
    } else {
        frame_count / max_frames
    };

    (0..to_analyze).map(|i| i * interval).collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct VideoSummary {
    pub score: f64,
    pub features: FeatureScores,
    pub frame_scores: Vec<f64>,
}

/// Mean score and per-feature means over the frames that scored.
pub fn summarize(frames: &[FrameScore]) -> Result<VideoSummary, AnalysisError> {
    let features: Vec<FeatureScores> = frames.iter().map(|f| f.features).collect();
    let features = FeatureScores::mean(&features).ok_or(AnalysisError::NoFramesAnalyzed)?;

    let frame_scores: Vec<f64> = frames.iter().map(|f| f.score).collect();
    let score = frame_scores.iter().sum::<f64>() / frame_scores.len() as f64;

    Ok(VideoSummary {
        score,
        features,
        frame_scores,
    })
}
