//! Runtime configuration read from environment variables.
//!
//! Every setting has a default so the service starts with no environment at
//! all. Values that fail to parse fall back to the default with a warning.

use std::path::PathBuf;
use std::str::FromStr;

use crate::analysis::ScoringStrategy;
use crate::constants::{
    DEFAULT_MAX_FRAMES, DEFAULT_MODEL_PATH, MAX_IMAGE_UPLOAD_SIZE, MAX_VIDEO_UPLOAD_SIZE,
};

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 8000;
const DEFAULT_UPLOADS_DIR: &str = "uploads";
const DEFAULT_FFMPEG_THREADS: usize = 1;
const DEFAULT_CACHE_CAPACITY: usize = 512;
const DEFAULT_RETENTION_HOURS: u64 = 24;
const DEFAULT_CLEANUP_INTERVAL_SECS: u64 = 3600;

/// Origins allowed by the CORS layer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CorsOrigins {
    Any,
    List(Vec<String>),
}

impl CorsOrigins {
    fn parse(raw: &str) -> Self {
        let origins: Vec<String> = raw
            .split(',')
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect();

        if origins.is_empty() || origins.iter().any(|o| o == "*") {
            CorsOrigins::Any
        } else {
            CorsOrigins::List(origins)
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: String,
    pub port: u16,
    /// Root of the upload tree, also served under `/uploads`
    pub uploads_dir: PathBuf,
    pub model_path: PathBuf,
    pub strategy: ScoringStrategy,
    pub max_image_bytes: usize,
    pub max_video_bytes: usize,
    pub max_frames: usize,
    pub ffmpeg_threads: usize,
    pub cache_capacity: usize,
    /// Uploads older than this are swept; 0 disables the sweeper
    pub retention_hours: u64,
    pub cleanup_interval_secs: u64,
    pub cors_origins: CorsOrigins,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            uploads_dir: PathBuf::from(DEFAULT_UPLOADS_DIR),
            model_path: PathBuf::from(DEFAULT_MODEL_PATH),
            strategy: ScoringStrategy::default(),
            max_image_bytes: MAX_IMAGE_UPLOAD_SIZE,
            max_video_bytes: MAX_VIDEO_UPLOAD_SIZE,
            max_frames: DEFAULT_MAX_FRAMES,
            ffmpeg_threads: DEFAULT_FFMPEG_THREADS,
            cache_capacity: DEFAULT_CACHE_CAPACITY,
            retention_hours: DEFAULT_RETENTION_HOURS,
            cleanup_interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
            cors_origins: CorsOrigins::Any,
        }
    }
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup (the environment in production).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: parse_or(&lookup, "PORT", defaults.port),
            uploads_dir: lookup("UPLOADS_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.uploads_dir),
            model_path: lookup("MODEL_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.model_path),
            strategy: parse_or(&lookup, "SCORING_STRATEGY", defaults.strategy),
            max_image_bytes: positive_or(&lookup, "MAX_IMAGE_BYTES", defaults.max_image_bytes),
            max_video_bytes: positive_or(&lookup, "MAX_VIDEO_BYTES", defaults.max_video_bytes),
            max_frames: positive_or(&lookup, "MAX_FRAMES", defaults.max_frames),
            ffmpeg_threads: positive_or(&lookup, "FFMPEG_THREADS", defaults.ffmpeg_threads),
            cache_capacity: parse_or(&lookup, "PREDICTION_CACHE_CAPACITY", defaults.cache_capacity),
            retention_hours: parse_or(&lookup, "UPLOAD_RETENTION_HOURS", defaults.retention_hours),
            cleanup_interval_secs: positive_or(
                &lookup,
                "CLEANUP_INTERVAL_SECS",
                defaults.cleanup_interval_secs,
            ),
            cors_origins: lookup("CORS_ALLOWED_ORIGINS")
                .map(|raw| CorsOrigins::parse(&raw))
                .unwrap_or(defaults.cors_origins),
        }
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Largest request body the router accepts
    pub fn body_limit(&self) -> usize {
        self.max_image_bytes.max(self.max_video_bytes) + crate::constants::MULTIPART_OVERHEAD
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(raw) => match raw.trim().parse() {
            Ok(value) => value,
            Err(_) => {
                tracing::warn!(key, value = %raw, "Ignoring unparseable setting, using default");
                default
            }
        },
        None => default,
    }
}

fn positive_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: FromStr + PartialOrd + Default + Copy,
{
    let value = parse_or(lookup, key, default);
    if value > T::default() { value } else { default }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Config {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn empty_environment_uses_defaults() {
        let config = config_from(&[]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.uploads_dir, PathBuf::from("uploads"));
        assert_eq!(config.strategy, ScoringStrategy::Hybrid);
        assert_eq!(config.max_frames, 10);
        assert_eq!(config.cors_origins, CorsOrigins::Any);
    }

    #[test]
    fn reads_overrides() {
        let config = config_from(&[
            ("PORT", "9100"),
            ("UPLOADS_DIR", "/var/lib/verifai"),
            ("SCORING_STRATEGY", "content-hash"),
            ("MAX_FRAMES", "4"),
            ("UPLOAD_RETENTION_HOURS", "0"),
        ]);
        assert_eq!(config.port, 9100);
        assert_eq!(config.uploads_dir, PathBuf::from("/var/lib/verifai"));
        assert_eq!(config.strategy, ScoringStrategy::ContentHash);
        assert_eq!(config.max_frames, 4);
        assert_eq!(config.retention_hours, 0);
        assert_eq!(config.bind_addr(), "0.0.0.0:9100");
    }

    #[test]
    fn invalid_values_fall_back() {
        let config = config_from(&[
            ("PORT", "not-a-port"),
            ("MAX_FRAMES", "0"),
            ("SCORING_STRATEGY", "neural"),
        ]);
        assert_eq!(config.port, 8000);
        assert_eq!(config.max_frames, 10);
        assert_eq!(config.strategy, ScoringStrategy::Hybrid);
    }

    #[test]
    fn cors_origin_list_is_parsed() {
        let config = config_from(&[(
            "CORS_ALLOWED_ORIGINS",
            "https://verifiai.tech, http://localhost:5173,",
        )]);
        assert_eq!(
            config.cors_origins,
            CorsOrigins::List(vec![
                "https://verifiai.tech".to_string(),
                "http://localhost:5173".to_string()
            ])
        );

        let wildcard = config_from(&[("CORS_ALLOWED_ORIGINS", "https://a.example,*")]);
        assert_eq!(wildcard.cors_origins, CorsOrigins::Any);
    }
}
