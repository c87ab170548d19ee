//! Source-video metadata via ffprobe.
//!
//! The core requires of its media stack only the ability to report a video's
//! natural pixel size, orientation-correcting rotation, frame rate, duration,
//! and track layout. ffprobe's JSON output covers all of it; parsing is a
//! pure function so it is testable without ffmpeg installed.

use std::collections::HashMap;
use std::path::Path;
use std::process::Stdio;

use serde::Deserialize;
use tracing::debug;

use crate::error::{ExportError, Result};
use crate::geometry::Orientation;

/// Render rate used when the source reports no usable frame rate.
pub const FALLBACK_FPS: f64 = 30.0;

/// Everything the pipeline needs to know about a source video.
#[derive(Debug, Clone)]
pub struct VideoMetadata {
    /// Natural (stored) pixel width, before orientation correction.
    pub width: u32,

    /// Natural (stored) pixel height, before orientation correction.
    pub height: u32,

    /// Nominal frame rate; 0.0 when the container does not report one.
    pub fps: f64,

    /// Duration in seconds.
    pub duration: f64,

    /// Rotation the player must apply for upright display.
    pub orientation: Orientation,

    /// Whether an audio track is present (passthrough-only).
    pub has_audio: bool,
}

impl VideoMetadata {
    /// Pixel size after resolving the orientation transform. All fit math
    /// uses this, never the stored size.
    pub fn upright_size(&self) -> (u32, u32) {
        self.orientation.apply_to_size(self.width, self.height)
    }

    /// Frame rate to render at, substituting the fallback for a zero report.
    pub fn nominal_fps(&self) -> f64 {
        if self.fps > 0.0 {
            self.fps
        } else {
            FALLBACK_FPS
        }
    }
}

/// Probe a video file with ffprobe.
///
/// Fails with [`ExportError::SessionFailed`] when ffprobe cannot be spawned,
/// [`ExportError::AssetUnreadable`] when the file cannot be opened or parsed,
/// and [`ExportError::NoVideoTrack`] when no video stream exists.
pub async fn probe<P: AsRef<Path>>(path: P) -> Result<VideoMetadata> {
    let path = path.as_ref();

    let output = tokio::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .stdin(Stdio::null())
        .output()
        .await
        .map_err(|e| ExportError::SessionFailed {
            reason: format!("failed to run ffprobe: {}", e),
        })?;

    if !output.status.success() {
        return Err(ExportError::AssetUnreadable {
            path: path.display().to_string(),
        }
        .into());
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let metadata = parse_ffprobe_output(&stdout, path)?;
    debug!(
        "Probed {:?}: {}x{} @ {:.2} fps, {:.2}s, rotation {:?}, audio: {}",
        path,
        metadata.width,
        metadata.height,
        metadata.fps,
        metadata.duration,
        metadata.orientation,
        metadata.has_audio
    );
    Ok(metadata)
}

/// Parse ffprobe JSON into [`VideoMetadata`].
pub fn parse_ffprobe_output(json: &str, path: &Path) -> Result<VideoMetadata> {
    let parsed: FfprobeOutput =
        serde_json::from_str(json).map_err(|_| ExportError::AssetUnreadable {
            path: path.display().to_string(),
        })?;

    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| ExportError::NoVideoTrack {
            path: path.display().to_string(),
        })?;

    let has_audio = parsed
        .streams
        .iter()
        .any(|s| s.codec_type.as_deref() == Some("audio"));

    let (width, height) = match (video.width, video.height) {
        (Some(w), Some(h)) if w > 0 && h > 0 => (w, h),
        _ => {
            return Err(ExportError::AssetUnreadable {
                path: path.display().to_string(),
            }
            .into())
        }
    };

    let fps = video
        .avg_frame_rate
        .as_deref()
        .map(parse_fraction)
        .filter(|f| *f > 0.0)
        .or_else(|| video.r_frame_rate.as_deref().map(parse_fraction))
        .unwrap_or(0.0)
        .max(0.0);

    let duration = video
        .duration
        .as_deref()
        .and_then(|d| d.parse::<f64>().ok())
        .or_else(|| {
            parsed
                .format
                .as_ref()
                .and_then(|f| f.duration.as_deref())
                .and_then(|d| d.parse::<f64>().ok())
        })
        .unwrap_or(0.0);

    Ok(VideoMetadata {
        width,
        height,
        fps,
        duration,
        orientation: Orientation::from_degrees(rotation_degrees(video)),
        has_audio,
    })
}

/// Rotation from stream side data (modern ffprobe) or the legacy rotate tag.
fn rotation_degrees(stream: &FfprobeStream) -> i32 {
    if let Some(rotation) = stream
        .side_data_list
        .iter()
        .find_map(|sd| sd.rotation)
    {
        return rotation.round() as i32;
    }

    stream
        .tags
        .as_ref()
        .and_then(|tags| tags.get("rotate"))
        .and_then(|r| r.parse::<i32>().ok())
        .unwrap_or(0)
}

/// Parse ffprobe's fractional rates ("30000/1001") or plain numbers.
fn parse_fraction(value: &str) -> f64 {
    match value.split_once('/') {
        Some((num, den)) => {
            let num: f64 = num.trim().parse().unwrap_or(0.0);
            let den: f64 = den.trim().parse().unwrap_or(0.0);
            if den > 0.0 {
                num / den
            } else {
                0.0
            }
        }
        None => value.trim().parse().unwrap_or(0.0),
    }
}

#[derive(Debug, Deserialize)]
struct FfprobeOutput {
    #[serde(default)]
    streams: Vec<FfprobeStream>,
    format: Option<FfprobeFormat>,
}

#[derive(Debug, Deserialize)]
struct FfprobeStream {
    codec_type: Option<String>,
    width: Option<u32>,
    height: Option<u32>,
    avg_frame_rate: Option<String>,
    r_frame_rate: Option<String>,
    duration: Option<String>,
    #[serde(default)]
    side_data_list: Vec<FfprobeSideData>,
    tags: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct FfprobeSideData {
    rotation: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct FfprobeFormat {
    duration: Option<String>,
}
