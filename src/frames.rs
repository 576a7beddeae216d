//! Video probing and single-frame extraction via ffprobe/ffmpeg
//!
//! Frames are pulled one position at a time into a throwaway temp dir, so at
//! most one decoded frame is held in memory per call.

use image::{DynamicImage, ImageReader};
use serde::Deserialize;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

use crate::analysis::AnalysisError;

/// Stream facts needed for sampling; the rest is only logged.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VideoProbe {
    pub frame_count: u64,
    pub fps: Option<f64>,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct ProbeOutput {
    #[serde(default)]
    streams: Vec<ProbeStream>,
}

#[derive(Debug, Deserialize)]
struct ProbeStream {
    width: Option<u32>,
    height: Option<u32>,
    r_frame_rate: Option<String>,
    nb_read_packets: Option<String>,
}

/// Count frames of the first video stream and read its rate and size.
pub async fn probe(input_path: &Path) -> Result<VideoProbe, AnalysisError> {
    let output = Command::new("ffprobe")
        .args(["-v", "error"])
        .args(["-select_streams", "v:0"])
        .arg("-count_packets")
        .args([
            "-show_entries",
            "stream=nb_read_packets,r_frame_rate,width,height",
        ])
        .args(["-of", "json"])
        .arg(input_path)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| AnalysisError::Tool(format!("Failed to spawn ffprobe: {}", e)))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        tracing::warn!(path = %input_path.display(), "ffprobe failed: {}", stderr.trim());
        return Err(AnalysisError::InvalidVideo("Could not open video file".into()));
    }

    let probe = parse_probe(&String::from_utf8_lossy(&output.stdout))?;
    tracing::info!(
        path = %input_path.display(),
        frames = probe.frame_count,
        fps = ?probe.fps,
        width = ?probe.width,
        height = ?probe.height,
        "Probed video"
    );
    Ok(probe)
}

fn parse_probe(json: &str) -> Result<VideoProbe, AnalysisError> {
    let parsed: ProbeOutput = serde_json::from_str(json)
        .map_err(|e| AnalysisError::Tool(format!("Unreadable ffprobe output: {}", e)))?;

    let stream = parsed
        .streams
        .into_iter()
        .next()
        .ok_or_else(|| AnalysisError::InvalidVideo("Could not open video file".into()))?;

    let frame_count = stream
        .nb_read_packets
        .as_deref()
        .and_then(|n| n.trim().parse::<u64>().ok())
        .unwrap_or(0);

    if frame_count == 0 {
        return Err(AnalysisError::InvalidVideo("Video file is empty".into()));
    }

    Ok(VideoProbe {
        frame_count,
        fps: stream.r_frame_rate.as_deref().and_then(parse_rate),
        width: stream.width,
        height: stream.height,
    })
}

/// ffprobe reports rates as a fraction, e.g. "30000/1001"
fn parse_rate(rate: &str) -> Option<f64> {
    let (num, den) = rate.split_once('/')?;
    let num: f64 = num.trim().parse().ok()?;
    let den: f64 = den.trim().parse().ok()?;
    (den > 0.0 && num > 0.0).then(|| num / den)
}

fn select_filter(position: u64) -> String {
    format!("select=eq(n\\,{})", position)
}

/// Write the frame at `position` to `output_path`, encoded by the output extension.
pub async fn write_frame(
    input_path: &Path,
    position: u64,
    output_path: &Path,
    ffmpeg_threads: usize,
    extra_filter: Option<&str>,
) -> Result<(), AnalysisError> {
    let mut vf = select_filter(position);
    if let Some(extra) = extra_filter {
        vf.push(',');
        vf.push_str(extra);
    }

    let output = Command::new("ffmpeg")
        .args(["-hide_banner", "-loglevel", "error", "-nostdin"])
        .args(["-threads", &ffmpeg_threads.to_string()])
        .arg("-i")
        .arg(input_path)
        .args(["-an", "-sn"])
        .args(["-vf", &vf])
        .args(["-vsync", "vfr"])
        .args(["-frames:v", "1"])
        .arg("-y")
        .arg(output_path)
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| AnalysisError::Tool(format!("Failed to spawn ffmpeg: {}", e)))?;

    // ffmpeg exits 0 without writing anything when the position is past the end
    if !output.status.success() || !output_path.exists() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(AnalysisError::Tool(format!(
            "ffmpeg could not read frame {}: {}",
            position,
            stderr.trim()
        )));
    }
    Ok(())
}

/// Decode the frame at `position` of the video.
pub async fn read_frame(
    input_path: &Path,
    position: u64,
    ffmpeg_threads: usize,
) -> Result<DynamicImage, AnalysisError> {
    let temp_dir = std::env::temp_dir().join(format!("verifai_frame_{}", rand::random::<u64>()));
    tokio::fs::create_dir_all(&temp_dir).await?;
    let frame_path = temp_dir.join("frame.png");

    let result: Result<DynamicImage, AnalysisError> = async {
        write_frame(input_path, position, &frame_path, ffmpeg_threads, None).await?;
        let data = tokio::fs::read(&frame_path).await?;
        decode_frame(&data)
    }
    .await;

    cleanup_temp_dir(&temp_dir).await;
    result
}

fn decode_frame(data: &[u8]) -> Result<DynamicImage, AnalysisError> {
    ImageReader::new(Cursor::new(data))
        .with_guessed_format()?
        .decode()
        .map_err(|e| AnalysisError::Decode(format!("Could not decode frame: {}", e)))
}

async fn cleanup_temp_dir(temp_dir: &PathBuf) {
    if let Err(e) = tokio::fs::remove_dir_all(temp_dir).await {
        tracing::warn!("Failed to cleanup temp dir {:?}: {}", temp_dir, e);
    }
}

/// Where a video's frame count and decoded frames come from
pub trait FrameSource: Send + Sync {
    fn probe(
        &self,
        input_path: &Path,
    ) -> impl Future<Output = Result<VideoProbe, AnalysisError>> + Send;

    fn read_frame(
        &self,
        input_path: &Path,
        position: u64,
    ) -> impl Future<Output = Result<DynamicImage, AnalysisError>> + Send;
}

/// ffprobe for counting, one ffmpeg run per frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FfmpegFrames {
    pub threads: usize,
}

impl FrameSource for FfmpegFrames {
    async fn probe(&self, input_path: &Path) -> Result<VideoProbe, AnalysisError> {
        probe(input_path).await
    }

    async fn read_frame(&self, input_path: &Path, position: u64) -> Result<DynamicImage, AnalysisError> {
        read_frame(input_path, position, self.threads).await
    }
}

/// Whether `binary -version` runs; used by diagnostics.
pub async fn tool_available(binary: &str) -> bool {
    Command::new(binary)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await
        .map(|s| s.success())
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_ffprobe_json() {
        let json = r#"{
            "programs": [],
            "streams": [
                {"width": 1280, "height": 720, "r_frame_rate": "30000/1001", "nb_read_packets": "300"}
            ]
        }"#;
        let probe = parse_probe(json).unwrap();
        assert_eq!(probe.frame_count, 300);
        assert_eq!(probe.width, Some(1280));
        assert_eq!(probe.height, Some(720));
        assert!((probe.fps.unwrap() - 29.97).abs() < 0.01);
    }

    #[test]
    fn missing_stream_cannot_be_opened() {
        let err = parse_probe(r#"{"streams": []}"#).unwrap_err();
        assert_eq!(err.to_string(), "Could not open video file");
    }

    #[test]
    fn zero_frames_is_empty() {
        let err = parse_probe(r#"{"streams": [{"nb_read_packets": "0"}]}"#).unwrap_err();
        assert_eq!(err.to_string(), "Video file is empty");
    }

    #[test]
    fn frame_rate_fractions() {
        assert_eq!(parse_rate("25/1"), Some(25.0));
        assert_eq!(parse_rate("0/0"), None);
        assert_eq!(parse_rate("garbage"), None);
    }

    #[test]
    fn select_filter_escapes_comma() {
        assert_eq!(select_filter(42), "select=eq(n\\,42)");
    }

    #[test]
    fn garbage_frame_bytes_fail_to_decode() {
        assert!(decode_frame(b"not an image").is_err());
    }
}
