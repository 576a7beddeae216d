//! Response bodies shared across routes

use serde::Serialize;

use crate::analysis::scoring::round2;
use crate::analysis::{Category, FeatureScores, Report};
use crate::media::MediaKind;

/// Body returned by `POST /predict`
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisResult {
    pub score: f64,
    pub category: Category,
    pub is_deepfake: bool,
    pub file_path: String,
    pub file_type: MediaKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thumbnail_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_scores: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frames_analyzed: Option<usize>,
    pub feature_contributions: FeatureScores,
}

impl AnalysisResult {
    /// Round every number to two places and attach storage paths.
    pub fn from_report(
        report: &Report,
        file_type: MediaKind,
        file_path: String,
        thumbnail_path: Option<String>,
    ) -> Self {
        let frame_scores = report
            .frame_scores
            .as_ref()
            .map(|scores| scores.iter().copied().map(round2).collect::<Vec<_>>());

        Self {
            score: round2(report.score),
            category: report.category,
            is_deepfake: report.is_deepfake,
            file_path,
            file_type,
            thumbnail_path,
            frames_analyzed: frame_scores.as_ref().map(Vec::len),
            frame_scores,
            feature_contributions: report.features.rounded(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct RootResponse {
    pub message: &'static str,
    pub version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub model_loaded: bool,
    pub model_file_exists: bool,
    pub uploads_directory: bool,
    pub strategy: String,
}

/// Body returned by `POST /upload`
#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    pub filename: String,
    pub file_path: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ScoringStrategy;

    fn features() -> FeatureScores {
        FeatureScores {
            cnn_score: 12.3456,
            fft_score: 1.0,
            noise_score: 2.0,
            edge_score: 3.0,
            texture_score: 4.0,
        }
    }

    #[test]
    fn image_result_omits_video_fields() {
        let report = Report::new(ScoringStrategy::Hybrid, 61.237, features());
        let result = AnalysisResult::from_report(
            &report,
            MediaKind::Image,
            "/uploads/images/a.png".into(),
            None,
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["score"], 61.24);
        assert_eq!(json["category"], "Potentially Manipulated");
        assert_eq!(json["is_deepfake"], true);
        assert_eq!(json["file_type"], "image");
        assert_eq!(json["feature_contributions"]["cnn_score"], 12.35);
        assert!(json.get("thumbnail_path").is_none());
        assert!(json.get("frame_scores").is_none());
        assert!(json.get("frames_analyzed").is_none());
    }

    #[test]
    fn video_result_counts_frames() {
        let report = Report::new(ScoringStrategy::Simulated, 20.0, features())
            .with_frames(vec![10.004, 29.996], Some(120));
        let result = AnalysisResult::from_report(
            &report,
            MediaKind::Video,
            "/uploads/videos/b.mp4".into(),
            Some("/uploads/thumbnails/c.jpg".into()),
        );
        let json = serde_json::to_value(&result).unwrap();

        assert_eq!(json["frames_analyzed"], 2);
        assert_eq!(json["frame_scores"], serde_json::json!([10.0, 30.0]));
        assert_eq!(json["thumbnail_path"], "/uploads/thumbnails/c.jpg");
        assert_eq!(json["category"], "Likely Authentic");
    }
}
