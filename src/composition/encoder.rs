//! ffmpeg invocations for the export pipeline: trimmed frame extraction,
//! sequence encoding with audio passthrough, and a cancellable child-process
//! runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tracing::debug;

use crate::config::OutputFormat;
use crate::error::{ExportError, Result};
use crate::geometry::TrimRange;

/// Cooperative cancellation for an in-flight export.
///
/// Cancellation kills the running ffmpeg child and makes the pipeline remove
/// any partial output before returning [`ExportError::Cancelled`].
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }

    /// Error out early if cancellation was requested.
    pub fn check(&self) -> Result<()> {
        if self.is_cancelled() {
            Err(ExportError::Cancelled.into())
        } else {
            Ok(())
        }
    }
}

/// Whether ffmpeg is on PATH.
pub fn check_ffmpeg_available() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|status| status.success())
        .unwrap_or(false)
}

/// Decode the trimmed range `[start, end)` of the source into an upright PNG
/// sequence at a constant frame rate. Returns the frame paths in order.
///
/// ffmpeg applies the source's rotation metadata during decode, so the
/// written frames are already orientation-corrected.
pub async fn extract_frames(
    source: &Path,
    trim: TrimRange,
    fps: f64,
    dir: &Path,
    cancel: &CancelToken,
) -> Result<Vec<PathBuf>> {
    let pattern = dir.join("in_%06d.png");

    let args = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-ss".to_string(),
        format!("{:.6}", trim.start),
        "-t".to_string(),
        format!("{:.6}", trim.duration()),
        "-i".to_string(),
        source.display().to_string(),
        "-r".to_string(),
        format!("{:.6}", fps),
        pattern.display().to_string(),
    ];

    run_ffmpeg(&args, cancel).await?;

    let mut frames: Vec<PathBuf> = std::fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|name| name.to_str())
                .map(|name| name.starts_with("in_") && name.ends_with(".png"))
                .unwrap_or(false)
        })
        .collect();
    frames.sort();

    if frames.is_empty() {
        return Err(ExportError::EncodeFailed {
            reason: "frame extraction produced no frames".to_string(),
        }
        .into());
    }

    debug!("Extracted {} frames from {:?}", frames.len(), source);
    Ok(frames)
}

/// Encode a composited PNG sequence to the destination container.
///
/// When the source carries audio, the identical trim range is carved from it
/// and passed through with `-c:a copy`; there is no transcoding, mixing, or
/// volume change. Any existing file at the destination is overwritten.
pub async fn encode_sequence(
    frames_pattern: &Path,
    fps: f64,
    audio_source: Option<(&Path, TrimRange)>,
    format: OutputFormat,
    quality: u8,
    destination: &Path,
    cancel: &CancelToken,
) -> Result<()> {
    let mut args = vec![
        "-y".to_string(),
        "-v".to_string(),
        "error".to_string(),
        "-framerate".to_string(),
        format!("{:.6}", fps),
        "-i".to_string(),
        frames_pattern.display().to_string(),
    ];

    if let Some((source, trim)) = audio_source {
        args.extend([
            "-ss".to_string(),
            format!("{:.6}", trim.start),
            "-t".to_string(),
            format!("{:.6}", trim.duration()),
            "-i".to_string(),
            source.display().to_string(),
            "-map".to_string(),
            "0:v:0".to_string(),
            "-map".to_string(),
            "1:a:0".to_string(),
            "-c:a".to_string(),
            "copy".to_string(),
            "-shortest".to_string(),
        ]);
    }

    args.extend([
        "-c:v".to_string(),
        "libx264".to_string(),
        "-pix_fmt".to_string(),
        "yuv420p".to_string(),
        "-crf".to_string(),
        quality_to_crf(quality).to_string(),
        "-movflags".to_string(),
        "+faststart".to_string(),
        "-f".to_string(),
        format.ffmpeg_format().to_string(),
        destination.display().to_string(),
    ]);

    run_ffmpeg(&args, cancel).await
}

/// Map a 0-100 quality knob to an x264 CRF (lower CRF = higher quality).
fn quality_to_crf(quality: u8) -> u8 {
    (51 - ((quality.min(100) as f32 / 100.0) * 51.0) as u8).clamp(0, 51)
}

/// Run ffmpeg to completion, polling the cancel token. On cancellation the
/// child is killed and [`ExportError::Cancelled`] is returned; on a non-zero
/// exit the collected stderr becomes the `EncodeFailed` reason.
async fn run_ffmpeg(args: &[String], cancel: &CancelToken) -> Result<()> {
    debug!("ffmpeg {}", args.join(" "));

    let mut child = tokio::process::Command::new("ffmpeg")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(|e| ExportError::SessionFailed {
            reason: format!("failed to spawn ffmpeg: {}", e),
        })?;

    // Drain stderr concurrently so a chatty child can never fill the pipe
    // while we poll for exit.
    let mut stderr = child.stderr.take();
    let stderr_task = tokio::spawn(async move {
        let mut buffer = String::new();
        if let Some(stderr) = stderr.as_mut() {
            let _ = stderr.read_to_string(&mut buffer).await;
        }
        buffer
    });

    let status = loop {
        if cancel.is_cancelled() {
            let _ = child.start_kill();
            let _ = child.wait().await;
            return Err(ExportError::Cancelled.into());
        }

        match child.try_wait() {
            Ok(Some(status)) => break status,
            Ok(None) => tokio::time::sleep(Duration::from_millis(50)).await,
            Err(e) => {
                return Err(ExportError::EncodeFailed {
                    reason: format!("failed to wait on ffmpeg: {}", e),
                }
                .into())
            }
        }
    };

    let stderr_text = stderr_task.await.unwrap_or_default();

    if !status.success() {
        return Err(ExportError::EncodeFailed {
            reason: if stderr_text.trim().is_empty() {
                format!("ffmpeg exited with {}", status)
            } else {
                stderr_text.trim().to_string()
            },
        }
        .into());
    }

    Ok(())
}
