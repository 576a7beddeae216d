//! Deepfake likelihood scoring
//!
//! There is no trained network behind any of this. Scores come from content
//! hashes, shallow signal statistics, or both, combined with fixed weights.
//! Which combination is used is picked by [`ScoringStrategy`].

pub mod detector;
pub mod features;
pub mod hash;
pub mod scoring;
pub mod video;

use serde::Serialize;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

pub use detector::{Detector, VideoSettings};
pub use scoring::{Category, FeatureScores, FrameScore, FrameScorer};

#[derive(Error, Debug)]
pub enum AnalysisError {
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    InvalidVideo(String),

    #[error("Failed to analyze any frames in the video")]
    NoFramesAnalyzed,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{0}")]
    Tool(String),

    #[error("Analysis worker failed: {0}")]
    Worker(String),
}

/// How a score is derived from an upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScoringStrategy {
    /// Pixel hash blended with signal statistics
    #[default]
    Hybrid,
    /// Salted pixel hashes scaled into fixed bands
    Simulated,
    /// Hash of the raw upload, no decoding
    ContentHash,
}

impl ScoringStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            ScoringStrategy::Hybrid => "hybrid",
            ScoringStrategy::Simulated => "simulated",
            ScoringStrategy::ContentHash => "content-hash",
        }
    }

    /// Pixel scorer, if this strategy decodes frames at all
    pub fn frame_scorer(&self) -> Option<FrameScorer> {
        match self {
            ScoringStrategy::Hybrid => Some(FrameScorer::Hybrid),
            ScoringStrategy::Simulated => Some(FrameScorer::Simulated),
            ScoringStrategy::ContentHash => None,
        }
    }

    pub fn category(&self, score: f64) -> Category {
        match self {
            ScoringStrategy::Simulated => scoring::deepfake_category(score),
            ScoringStrategy::Hybrid | ScoringStrategy::ContentHash => {
                scoring::manipulation_category(score)
            }
        }
    }
}

impl fmt::Display for ScoringStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScoringStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "hybrid" => Ok(ScoringStrategy::Hybrid),
            "simulated" => Ok(ScoringStrategy::Simulated),
            "content-hash" | "content_hash" => Ok(ScoringStrategy::ContentHash),
            other => Err(format!(
                "Unknown scoring strategy: {}. Expected one of: hybrid, simulated, content-hash",
                other
            )),
        }
    }
}

/// Outcome of scoring one upload, independent of where it was stored
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub strategy: ScoringStrategy,
    pub score: f64,
    pub category: Category,
    pub is_deepfake: bool,
    pub features: FeatureScores,
    /// Per-frame scores, videos only
    pub frame_scores: Option<Vec<f64>>,
    /// Frame count reported by the probe, when the video was probed
    pub total_frames: Option<u64>,
}

impl Report {
    pub fn new(strategy: ScoringStrategy, score: f64, features: FeatureScores) -> Self {
        Self {
            strategy,
            score,
            category: strategy.category(score),
            is_deepfake: score > 50.0,
            features,
            frame_scores: None,
            total_frames: None,
        }
    }

    pub fn with_frames(mut self, frame_scores: Vec<f64>, total_frames: Option<u64>) -> Self {
        self.frame_scores = Some(frame_scores);
        self.total_frames = total_frames;
        self
    }
}
