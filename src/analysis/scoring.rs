//! Per-frame scorers and the weighted combination of sub-scores

use image::DynamicImage;
use rand::Rng;
use serde::Serialize;
use std::fmt;

use super::features::SignalFeatures;
use super::hash::{deterministic_score, salted_unit, seeded_rng};

/// The five named sub-scores behind every reported score
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct FeatureScores {
    pub cnn_score: f64,
    pub fft_score: f64,
    pub noise_score: f64,
    pub edge_score: f64,
    pub texture_score: f64,
}

impl FeatureScores {
    pub fn weighted(&self, w: &Weights) -> f64 {
        w.cnn * self.cnn_score
            + w.fft * self.fft_score
            + w.noise * self.noise_score
            + w.edge * self.edge_score
            + w.texture * self.texture_score
    }

    /// Per-feature mean; `None` for an empty slice
    pub fn mean(items: &[FeatureScores]) -> Option<FeatureScores> {
        if items.is_empty() {
            return None;
        }
        let n = items.len() as f64;
        let sum = items.iter().fold(FeatureScores::default(), |acc, f| FeatureScores {
            cnn_score: acc.cnn_score + f.cnn_score,
            fft_score: acc.fft_score + f.fft_score,
            noise_score: acc.noise_score + f.noise_score,
            edge_score: acc.edge_score + f.edge_score,
            texture_score: acc.texture_score + f.texture_score,
        });
        Some(FeatureScores {
            cnn_score: sum.cnn_score / n,
            fft_score: sum.fft_score / n,
            noise_score: sum.noise_score / n,
            edge_score: sum.edge_score / n,
            texture_score: sum.texture_score / n,
        })
    }

    pub fn rounded(&self) -> FeatureScores {
        FeatureScores {
            cnn_score: round2(self.cnn_score),
            fft_score: round2(self.fft_score),
            noise_score: round2(self.noise_score),
            edge_score: round2(self.edge_score),
            texture_score: round2(self.texture_score),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Weights {
    pub cnn: f64,
    pub fft: f64,
    pub noise: f64,
    pub edge: f64,
    pub texture: f64,
}

pub const HYBRID_WEIGHTS: Weights = Weights {
    cnn: 0.6,
    fft: 0.1,
    noise: 0.1,
    edge: 0.1,
    texture: 0.1,
};

pub const SIMULATED_WEIGHTS: Weights = Weights {
    cnn: 0.4,
    fft: 0.2,
    noise: 0.15,
    edge: 0.15,
    texture: 0.1,
};

/// Verdict label attached to a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    #[serde(rename = "Likely Authentic")]
    LikelyAuthentic,
    #[serde(rename = "Possibly Manipulated")]
    PossiblyManipulated,
    #[serde(rename = "Potentially Manipulated")]
    PotentiallyManipulated,
    #[serde(rename = "Likely Manipulated")]
    LikelyManipulated,
    #[serde(rename = "Likely Deepfake")]
    LikelyDeepfake,
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Category::LikelyAuthentic => "Likely Authentic",
            Category::PossiblyManipulated => "Possibly Manipulated",
            Category::PotentiallyManipulated => "Potentially Manipulated",
            Category::LikelyManipulated => "Likely Manipulated",
            Category::LikelyDeepfake => "Likely Deepfake",
        };
        f.write_str(label)
    }
}

/// Labels used by the hybrid and content-hash strategies
pub fn manipulation_category(score: f64) -> Category {
    if score > 80.0 {
        Category::LikelyManipulated
    } else if score > 50.0 {
        Category::PotentiallyManipulated
    } else {
        Category::LikelyAuthentic
    }
}

/// Labels used by the simulated strategy
pub fn deepfake_category(score: f64) -> Category {
    if score < 30.0 {
        Category::LikelyAuthentic
    } else if score < 70.0 {
        Category::PossiblyManipulated
    } else {
        Category::LikelyDeepfake
    }
}

/// One scored frame (or still image)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameScore {
    /// Combined score on the 0-100 scale
    pub score: f64,
    pub features: FeatureScores,
}

/// Scorers that look at decoded pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameScorer {
    Hybrid,
    Simulated,
}

impl FrameScorer {
    pub fn score(&self, image: &DynamicImage) -> FrameScore {
        match self {
            FrameScorer::Hybrid => hybrid(image),
            FrameScorer::Simulated => simulated(image),
        }
    }
}

fn clamp_percent(v: f64) -> f64 {
    v.clamp(0.0, 100.0)
}

pub fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Content hash stands in for the network output; signal statistics fill the rest.
fn hybrid(image: &DynamicImage) -> FrameScore {
    let pixels = image.to_rgb8();
    let cnn_score = deterministic_score(pixels.as_raw());

    let signal = SignalFeatures::extract(&image.to_luma8());
    let features = FeatureScores {
        cnn_score,
        fft_score: clamp_percent(signal.std * 2.0),
        noise_score: clamp_percent(signal.noise_std * 20.0),
        edge_score: clamp_percent((1.0 - signal.edge_density) * 100.0),
        texture_score: clamp_percent(signal.texture_contrast * 50.0),
    };

    FrameScore {
        score: features.weighted(&HYBRID_WEIGHTS),
        features,
    }
}

/// Five salted hashes of the pixels, each scaled into its own fixed band.
fn simulated(image: &DynamicImage) -> FrameScore {
    let pixels = image.to_rgb8();
    let raw = pixels.as_raw();

    let features = FeatureScores {
        cnn_score: 0.3 + salted_unit(raw, b"cnn") * 0.5,
        fft_score: 0.2 + salted_unit(raw, b"fft") * 0.7,
        noise_score: 0.1 + salted_unit(raw, b"noise") * 0.6,
        edge_score: 0.2 + salted_unit(raw, b"edge") * 0.6,
        texture_score: 0.3 + salted_unit(raw, b"texture") * 0.6,
    };

    FrameScore {
        score: clamp_percent(features.weighted(&SIMULATED_WEIGHTS) * 100.0),
        features,
    }
}

/// Whole-file score plus seeded jitter for the secondary features and frames.
pub struct ContentHashScore {
    pub score: f64,
    pub features: FeatureScores,
    pub frame_scores: Vec<f64>,
}

pub fn content_hash(data: &[u8], synthetic_frames: usize) -> ContentHashScore {
    let score = deterministic_score(data);
    let mut rng = seeded_rng(data);
    let mut jitter = |spread: f64| clamp_percent(score + (rng.random::<f64>() * 2.0 - 1.0) * spread);

    let features = FeatureScores {
        cnn_score: score,
        fft_score: jitter(10.0),
        noise_score: jitter(10.0),
        edge_score: jitter(10.0),
        texture_score: jitter(10.0),
    };
    let frame_scores = (0..synthetic_frames).map(|_| jitter(5.0)).collect();

    ContentHashScore {
        score,
        features,
        frame_scores,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Rgb};

    fn gradient(size: u32) -> DynamicImage {
        DynamicImage::ImageRgb8(ImageBuffer::from_fn(size, size, |x, y| {
            Rgb([(x * 4 % 256) as u8, (y * 4 % 256) as u8, 90])
        }))
    }

    #[test]
    fn weights_sum_to_one() {
        for w in [HYBRID_WEIGHTS, SIMULATED_WEIGHTS] {
            let total = w.cnn + w.fft + w.noise + w.edge + w.texture;
            assert!((total - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn manipulation_thresholds() {
        assert_eq!(manipulation_category(50.0), Category::LikelyAuthentic);
        assert_eq!(manipulation_category(50.01), Category::PotentiallyManipulated);
        assert_eq!(manipulation_category(80.0), Category::PotentiallyManipulated);
        assert_eq!(manipulation_category(80.5), Category::LikelyManipulated);
    }

    #[test]
    fn deepfake_thresholds() {
        assert_eq!(deepfake_category(29.9), Category::LikelyAuthentic);
        assert_eq!(deepfake_category(30.0), Category::PossiblyManipulated);
        assert_eq!(deepfake_category(69.9), Category::PossiblyManipulated);
        assert_eq!(deepfake_category(70.0), Category::LikelyDeepfake);
    }

    #[test]
    fn category_serializes_as_label() {
        let json = serde_json::to_string(&Category::PotentiallyManipulated).unwrap();
        assert_eq!(json, "\"Potentially Manipulated\"");
        assert_eq!(Category::LikelyDeepfake.to_string(), "Likely Deepfake");
    }

    #[test]
    fn hybrid_combines_with_fixed_weights() {
        let frame = FrameScorer::Hybrid.score(&gradient(64));
        let f = frame.features;
        let expected = 0.6 * f.cnn_score
            + 0.1 * (f.fft_score + f.noise_score + f.edge_score + f.texture_score);
        assert!((frame.score - expected).abs() < 1e-9);
        assert!((0.0..=100.0).contains(&frame.score));
        for v in [f.cnn_score, f.fft_score, f.noise_score, f.edge_score, f.texture_score] {
            assert!((0.0..=100.0).contains(&v));
        }
    }

    #[test]
    fn scorers_are_deterministic() {
        let image = gradient(48);
        for scorer in [FrameScorer::Hybrid, FrameScorer::Simulated] {
            assert_eq!(scorer.score(&image), scorer.score(&image));
        }
    }

    #[test]
    fn simulated_features_stay_in_bands() {
        let frame = FrameScorer::Simulated.score(&gradient(32));
        let f = frame.features;
        assert!((0.3..0.8).contains(&f.cnn_score));
        assert!((0.2..0.9).contains(&f.fft_score));
        assert!((0.1..0.7).contains(&f.noise_score));
        assert!((0.2..0.8).contains(&f.edge_score));
        assert!((0.3..0.9).contains(&f.texture_score));
        // Band limits put the combined score between 23.5 and 81.5
        assert!(frame.score >= 23.5 && frame.score <= 81.5);
    }

    #[test]
    fn content_hash_jitter_is_bounded_and_repeatable() {
        let data = b"uploaded video bytes";
        let a = content_hash(data, 10);
        let b = content_hash(data, 10);
        assert_eq!(a.features, b.features);
        assert_eq!(a.frame_scores, b.frame_scores);
        assert_eq!(a.features.cnn_score, a.score);
        assert_eq!(a.frame_scores.len(), 10);

        for v in [a.features.fft_score, a.features.noise_score, a.features.edge_score] {
            assert!((v - a.score).abs() <= 10.0);
            assert!((0.0..=100.0).contains(&v));
        }
        for v in &a.frame_scores {
            assert!((v - a.score).abs() <= 5.0);
        }
    }

    #[test]
    fn mean_of_features() {
        let a = FeatureScores {
            cnn_score: 10.0,
            fft_score: 20.0,
            noise_score: 30.0,
            edge_score: 40.0,
            texture_score: 50.0,
        };
        let b = FeatureScores {
            cnn_score: 30.0,
            ..a
        };
        let mean = FeatureScores::mean(&[a, b]).unwrap();
        assert_eq!(mean.cnn_score, 20.0);
        assert_eq!(mean.texture_score, 50.0);
        assert!(FeatureScores::mean(&[]).is_none());
    }

    #[test]
    fn rounding_to_two_places() {
        assert_eq!(round2(12.345_67), 12.35);
        assert_eq!(round2(50.0), 50.0);
    }
}
