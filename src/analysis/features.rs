//! Signal statistics extracted from a grayscale frame.
//!
//! These are shallow measures of the kind manipulation artefacts tend to
//! disturb: intensity spread, the residual left by a median filter, Canny
//! edge density, 8-pixel block discontinuities and a sampled diagonal
//! contrast.

use image::GrayImage;
use imageproc::edges::canny;
use imageproc::filter::median_filter;

const CANNY_LOW: f32 = 100.0;
const CANNY_HIGH: f32 = 200.0;
const BLOCK_SIZE: usize = 8;
const TEXTURE_SAMPLES_PER_AXIS: u32 = 100;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SignalFeatures {
    pub mean: f64,
    pub std: f64,
    /// Mean absolute median-filter residual
    pub noise_level: f64,
    pub noise_std: f64,
    /// Fraction of pixels marked as Canny edges (0-1)
    pub edge_density: f64,
    pub blockiness: f64,
    /// Sampled diagonal contrast, capped at 1.0
    pub texture_contrast: f64,
}

impl SignalFeatures {
    pub fn extract(gray: &GrayImage) -> Self {
        let (mean, std) = mean_std(gray.as_raw().iter().map(|&p| p as f64));
        let (noise_level, noise_std) = noise_residual(gray);

        Self {
            mean,
            std,
            noise_level,
            noise_std,
            edge_density: edge_density(gray),
            blockiness: blockiness(gray),
            texture_contrast: texture_contrast(gray),
        }
    }
}

/// Population mean and standard deviation
fn mean_std<I: Iterator<Item = f64>>(values: I) -> (f64, f64) {
    let mut n = 0usize;
    let mut sum = 0.0;
    let mut sum_sq = 0.0;
    for v in values {
        n += 1;
        sum += v;
        sum_sq += v * v;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let mean = sum / n as f64;
    let variance = (sum_sq / n as f64 - mean * mean).max(0.0);
    (mean, variance.sqrt())
}

fn noise_residual(gray: &GrayImage) -> (f64, f64) {
    let filtered = median_filter(gray, 1, 1);
    let residual: Vec<f64> = gray
        .as_raw()
        .iter()
        .zip(filtered.as_raw())
        .map(|(&g, &m)| g as f64 - m as f64)
        .collect();

    if residual.is_empty() {
        return (0.0, 0.0);
    }
    let mean_abs = residual.iter().map(|r| r.abs()).sum::<f64>() / residual.len() as f64;
    let (_, std) = mean_std(residual.into_iter());
    (mean_abs, std)
}

fn edge_density(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    if w < 3 || h < 3 {
        return 0.0;
    }
    let total = w as usize * h as usize;
    let edges = canny(gray, CANNY_LOW, CANNY_HIGH);
    let marked = edges.as_raw().iter().filter(|&&p| p > 0).count();
    marked as f64 / total as f64
}

/// Average of the mean absolute step between every 8th column and every 8th row.
fn blockiness(gray: &GrayImage) -> f64 {
    let (w, h) = (gray.width() as usize, gray.height() as usize);
    let raw = gray.as_raw();
    let at = |x: usize, y: usize| raw[y * w + x] as f64;

    let mut horizontal = Vec::new();
    for y in 0..h {
        let mut x = BLOCK_SIZE;
        while x < w {
            horizontal.push((at(x, y) - at(x - BLOCK_SIZE, y)).abs());
            x += BLOCK_SIZE;
        }
    }

    let mut vertical = Vec::new();
    let mut y = BLOCK_SIZE;
    while y < h {
        for x in 0..w {
            vertical.push((at(x, y) - at(x, y - BLOCK_SIZE)).abs());
        }
        y += BLOCK_SIZE;
    }

    (mean_or_zero(&horizontal) + mean_or_zero(&vertical)) / 2.0
}

fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

fn texture_contrast(gray: &GrayImage) -> f64 {
    let (w, h) = gray.dimensions();
    let step = (w.min(h) / TEXTURE_SAMPLES_PER_AXIS).max(1);

    let mut contrast = 0.0;
    let mut y = step;
    while y < h {
        let mut x = step;
        while x < w {
            let diff = gray.get_pixel(x, y)[0] as f64 - gray.get_pixel(x - 1, y - 1)[0] as f64;
            contrast += diff * diff / 1000.0;
            x += step;
        }
        y += step;
    }

    let samples = (h / step) as f64 * (w / step) as f64;
    let contrast = if samples > 0.0 { contrast / samples } else { 0.0 };
    contrast.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageBuffer, Luma};

    fn uniform(value: u8, size: u32) -> GrayImage {
        ImageBuffer::from_fn(size, size, |_, _| Luma([value]))
    }

    fn checkerboard(size: u32) -> GrayImage {
        ImageBuffer::from_fn(size, size, |x, y| {
            if (x + y) % 2 == 0 { Luma([0]) } else { Luma([255]) }
        })
    }

    #[test]
    fn uniform_image_is_flat() {
        let features = SignalFeatures::extract(&uniform(128, 64));
        assert!((features.mean - 128.0).abs() < 1e-9);
        assert_eq!(features.std, 0.0);
        assert_eq!(features.noise_level, 0.0);
        assert_eq!(features.noise_std, 0.0);
        assert_eq!(features.edge_density, 0.0);
        assert_eq!(features.blockiness, 0.0);
        assert_eq!(features.texture_contrast, 0.0);
    }

    #[test]
    fn checkerboard_has_full_spread() {
        let features = SignalFeatures::extract(&checkerboard(32));
        assert!((features.mean - 127.5).abs() < 1e-9);
        assert!((features.std - 127.5).abs() < 1e-9);
    }

    #[test]
    fn isolated_specks_show_up_as_noise() {
        let specks: GrayImage = ImageBuffer::from_fn(40, 40, |x, y| {
            if x % 10 == 5 && y % 10 == 5 { Luma([250]) } else { Luma([100]) }
        });
        let features = SignalFeatures::extract(&specks);
        // 16 specks of +150 survive as residual once the median removes them
        assert!((features.noise_level - 16.0 * 150.0 / 1600.0).abs() < 1e-9);
        assert!(features.noise_std > 0.0);
    }

    #[test]
    fn diagonal_neighbours_match_on_checkerboard() {
        // (x, y) and (x-1, y-1) always share a colour on a 1-pixel checkerboard
        assert_eq!(texture_contrast(&checkerboard(32)), 0.0);
    }

    #[test]
    fn texture_contrast_is_capped() {
        let stripes: GrayImage =
            ImageBuffer::from_fn(32, 32, |x, _| if x % 2 == 0 { Luma([0]) } else { Luma([255]) });
        assert_eq!(texture_contrast(&stripes), 1.0);
    }

    #[test]
    fn blockiness_sees_block_steps() {
        // Vertical bands 8 pixels wide alternating between 0 and 80
        let bands: GrayImage =
            ImageBuffer::from_fn(32, 32, |x, _| Luma([if (x / 8) % 2 == 0 { 0 } else { 80 }]));
        // Every horizontal 8-step crosses a band edge; vertical steps are flat
        assert!((blockiness(&bands) - 40.0).abs() < 1e-9);
    }

    #[test]
    fn sharp_edge_is_detected() {
        let half: GrayImage =
            ImageBuffer::from_fn(64, 64, |x, _| Luma([if x < 32 { 0 } else { 255 }]));
        let density = edge_density(&half);
        assert!(density > 0.0);
        assert!(density < 0.2);
    }

    #[test]
    fn tiny_images_do_not_panic() {
        let features = SignalFeatures::extract(&uniform(10, 1));
        assert_eq!(features.texture_contrast, 0.0);
        assert_eq!(features.blockiness, 0.0);
    }
}
