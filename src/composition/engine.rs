use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::{
    composition::{compositor, encoder, encoder::CancelToken, mask},
    config::CompositionConfig,
    error::{ExportError, Result},
    frame::FrameImage,
    geometry::{self, PixelRect, PlacementTransform, ScreenRect},
    video,
};

/// A finished export
#[derive(Debug, Clone)]
pub struct EncodedVideo {
    pub path: PathBuf,
    pub duration: f64,
    pub frame_count: usize,
    pub file_size: u64,
}

/// Everything geometric about a composition, derived once per render.
///
/// The plan is a pure function of the resolved configuration and the probed
/// source metadata, which is what makes repeated exports with identical
/// inputs identical: same canvas, same transform, same mask geometry, same
/// frame count.
#[derive(Debug, Clone, PartialEq)]
pub struct CompositionPlan {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Screen region in canvas pixels, top-left origin (raster space).
    pub screen_px: PixelRect,

    /// Video placement in the canvas's bottom-left space.
    pub transform: PlacementTransform,

    /// Render frame rate (fallback already substituted).
    pub fps: f64,

    /// Frames the trimmed range spans at `fps`.
    pub expected_frames: usize,
}

impl CompositionPlan {
    /// Derive the plan from an upright source size, the source frame rate,
    /// the frame artwork size (if any), and the composition config.
    ///
    /// With artwork the canvas follows the artwork's aspect ratio; without it
    /// the configured canvas is used and the full canvas is the screen rect.
    pub fn build(
        upright_source: (u32, u32),
        source_fps: f64,
        frame_size: Option<(u32, u32)>,
        config: &CompositionConfig,
    ) -> Self {
        let (canvas_width, canvas_height) =
            geometry::canvas_size(frame_size, config.canvas_width, config.canvas_height);

        let screen_rect = if frame_size.is_some() {
            config.screen_rect.clamped()
        } else {
            ScreenRect::full()
        };
        let screen_px = screen_rect.to_pixel_rect(canvas_width, canvas_height);

        // Placement runs in the compositor's bottom-left space.
        let target = screen_px.flip_y(canvas_height);
        let transform = geometry::compute_placement(
            upright_source.0,
            upright_source.1,
            target,
            config.fit,
            config.zoom,
            config.offset,
        );

        let fps = if source_fps > 0.0 {
            source_fps
        } else {
            video::FALLBACK_FPS
        };

        Self {
            canvas_width,
            canvas_height,
            screen_px,
            transform,
            fps,
            expected_frames: (config.trim.duration() * fps).round().max(1.0) as usize,
        }
    }
}

/// The export pipeline: trims the source, composites every frame behind the
/// frame artwork, and encodes the result.
///
/// Steps run strictly in sequence with no mid-pipeline retries; the first
/// failure aborts the export, removes any partial output, and is returned to
/// the caller. One export runs per engine instance at a time (`&mut self`
/// enforces it); the preview side is pure geometry and needs no engine.
pub struct ExportEngine {
    temp_dir: Option<PathBuf>,
}

impl ExportEngine {
    pub fn new() -> Self {
        Self { temp_dir: None }
    }

    /// Export `source` composited behind `frame` to `output_path`.
    ///
    /// Cancellation through `cancel` tears down the in-progress encode and
    /// deletes any partial output file rather than leaving a corrupt
    /// artifact.
    pub async fn export(
        &mut self,
        source: &Path,
        frame: Option<&FrameImage>,
        config: &CompositionConfig,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<EncodedVideo> {
        info!("🎬 Starting export");
        info!("   Source: {:?}", source);
        info!("   Frame: {}", frame.map(|f| format!("{}x{}", f.width(), f.height())).unwrap_or_else(|| "none".to_string()));
        info!("   Output: {:?}", output_path);

        let result = self
            .run_pipeline(source, frame, config, output_path, cancel)
            .await;

        self.cleanup();

        if result.is_err() {
            // Never leave a corrupt artifact behind a failed or cancelled
            // export.
            if output_path.exists() {
                if let Err(e) = std::fs::remove_file(output_path) {
                    warn!("Failed to remove partial output {:?}: {}", output_path, e);
                }
            }
        }

        result
    }

    async fn run_pipeline(
        &mut self,
        source: &Path,
        frame: Option<&FrameImage>,
        config: &CompositionConfig,
        output_path: &Path,
        cancel: &CancelToken,
    ) -> Result<EncodedVideo> {
        cancel.check()?;

        if !encoder::check_ffmpeg_available() {
            return Err(ExportError::SessionFailed {
                reason: "ffmpeg not found on PATH".to_string(),
            }
            .into());
        }

        info!("📼 Step 1: Probing source video...");
        let metadata = video::probe(source).await?;
        info!(
            "   {}x{} @ {:.2} fps, {:.2}s, audio: {}",
            metadata.width, metadata.height, metadata.fps, metadata.duration, metadata.has_audio
        );

        // Reject a bad trim range before anything is built.
        config.trim.validate(metadata.duration)?;

        let plan = CompositionPlan::build(
            metadata.upright_size(),
            metadata.fps,
            frame.map(|f| f.size()),
            config,
        );
        info!(
            "⏱️  Step 2: Planned {}x{} canvas, {} frames at {:.2} fps",
            plan.canvas_width, plan.canvas_height, plan.expected_frames, plan.fps
        );
        debug!("   Transform: {:?}", plan.transform);

        let temp_dir = self.ensure_temp_dir()?;

        info!("🎞️  Step 3: Extracting {:.2}s of source...", config.trim.duration());
        let input_frames =
            encoder::extract_frames(source, config.trim, plan.fps, &temp_dir, cancel).await?;

        info!("🎨 Step 4: Compositing {} frames...", input_frames.len());
        let artwork = frame.map(|f| {
            compositor::fit_artwork_to_canvas(f.raster(), plan.canvas_width, plan.canvas_height)
        });
        let layer_mask = mask::build_mask(
            artwork.as_ref(),
            plan.screen_px,
            plan.canvas_width,
            plan.canvas_height,
        );

        let frame_count = self
            .composite_sequence(&input_frames, &temp_dir, &plan, layer_mask.as_ref(), artwork.as_ref(), cancel)?;

        info!("📦 Step 5: Encoding to {:?}...", config.format);
        let audio = metadata.has_audio.then_some((source, config.trim));
        encoder::encode_sequence(
            &temp_dir.join("out_%06d.png"),
            plan.fps,
            audio,
            config.format,
            config.quality,
            output_path,
            cancel,
        )
        .await?;

        let file_size = std::fs::metadata(output_path)?.len();
        info!(
            "🎉 Export complete: {:?} ({:.1} MB)",
            output_path,
            file_size as f64 / 1024.0 / 1024.0
        );

        Ok(EncodedVideo {
            path: output_path.to_path_buf(),
            duration: config.trim.duration(),
            frame_count,
            file_size,
        })
    }

    /// Composite every extracted frame onto the canvas, in parallel.
    fn composite_sequence(
        &self,
        input_frames: &[PathBuf],
        temp_dir: &Path,
        plan: &CompositionPlan,
        layer_mask: Option<&image::GrayImage>,
        artwork: Option<&image::RgbaImage>,
        cancel: &CancelToken,
    ) -> Result<usize> {
        input_frames
            .par_iter()
            .enumerate()
            .try_for_each(|(index, input_path)| -> Result<()> {
                cancel.check()?;

                let source = image::open(input_path)
                    .map_err(|e| ExportError::EncodeFailed {
                        reason: format!("failed to read extracted frame {:?}: {}", input_path, e),
                    })?
                    .to_rgba8();

                let composited = compositor::composite_frame(
                    &source,
                    &plan.transform,
                    layer_mask,
                    artwork,
                    plan.canvas_width,
                    plan.canvas_height,
                );

                let out_path = temp_dir.join(format!("out_{:06}.png", index + 1));
                composited
                    .save(&out_path)
                    .map_err(|e| ExportError::EncodeFailed {
                        reason: format!("failed to write composited frame {:?}: {}", out_path, e),
                    })?;
                Ok(())
            })?;

        Ok(input_frames.len())
    }

    fn ensure_temp_dir(&mut self) -> Result<PathBuf> {
        if let Some(ref temp_dir) = self.temp_dir {
            return Ok(temp_dir.clone());
        }

        let temp_dir =
            std::env::temp_dir().join(format!("screenframer_{}", std::process::id()));
        std::fs::create_dir_all(&temp_dir)?;
        self.temp_dir = Some(temp_dir.clone());
        Ok(temp_dir)
    }

    fn cleanup(&mut self) {
        if let Some(temp_dir) = self.temp_dir.take() {
            if let Err(e) = std::fs::remove_dir_all(&temp_dir) {
                warn!("Failed to remove temporary directory {:?}: {}", temp_dir, e);
            }
        }
    }
}

impl Default for ExportEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for ExportEngine {
    fn drop(&mut self) {
        self.cleanup();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, OutputFormat};
    use crate::geometry::{FitMode, NormalizedOffset, TrimRange};
    use tempfile::tempdir;

    fn test_config(trim: TrimRange) -> CompositionConfig {
        CompositionConfig {
            format: OutputFormat::Mp4,
            canvas_width: 1080,
            canvas_height: 1920,
            quality: 90,
            trim,
            screen_rect: ScreenRect::new(10.0, 5.0, 80.0, 90.0),
            zoom: 1.0,
            offset: NormalizedOffset::default(),
            fit: FitMode::Fit,
        }
    }

    #[test]
    fn test_plan_trim_duration_maps_to_frame_count() {
        // A 2.0..7.0 trim at 30 fps spans 5.0 seconds and 150 frames.
        let config = test_config(TrimRange::new(2.0, 7.0));
        let plan = CompositionPlan::build((1920, 1080), 30.0, Some((1000, 2000)), &config);

        assert_eq!(plan.expected_frames, 150);
        assert_eq!(config.trim.duration(), 5.0);
    }

    #[test]
    fn test_plan_is_deterministic() {
        let config = test_config(TrimRange::new(0.0, 4.0));
        let a = CompositionPlan::build((1920, 1080), 60.0, Some((1000, 2000)), &config);
        let b = CompositionPlan::build((1920, 1080), 60.0, Some((1000, 2000)), &config);
        assert_eq!(a, b);
    }

    #[test]
    fn test_plan_canvas_follows_frame_aspect() {
        let config = test_config(TrimRange::new(0.0, 1.0));
        let plan = CompositionPlan::build((1920, 1080), 30.0, Some((1000, 2000)), &config);

        assert_eq!((plan.canvas_width, plan.canvas_height), (1080, 2160));
        // Screen rect percentages resolve against the derived canvas.
        assert_eq!(plan.screen_px.x, 108.0);
        assert_eq!(plan.screen_px.y, 108.0);
    }

    #[test]
    fn test_plan_without_frame_uses_full_canvas() {
        let config = test_config(TrimRange::new(0.0, 1.0));
        let plan = CompositionPlan::build((1080, 1920), 30.0, None, &config);

        assert_eq!((plan.canvas_width, plan.canvas_height), (1080, 1920));
        assert_eq!(plan.screen_px, PixelRect::new(0.0, 0.0, 1080.0, 1920.0));
        // Same-size source in Fit lands exactly on the canvas.
        assert_eq!(plan.transform.scale_x, 1.0);
        assert_eq!(plan.transform.translate_x, 0.0);
        assert_eq!(plan.transform.translate_y, 0.0);
    }

    #[test]
    fn test_plan_zero_fps_uses_fallback() {
        let config = test_config(TrimRange::new(0.0, 2.0));
        let plan = CompositionPlan::build((640, 480), 0.0, None, &config);

        assert_eq!(plan.fps, video::FALLBACK_FPS);
        assert_eq!(plan.expected_frames, 60);
    }

    #[tokio::test]
    async fn test_cancelled_before_start_exports_nothing() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");

        let cancel = CancelToken::new();
        cancel.cancel();

        let config = Config::default()
            .resolve(10.0, None, ScreenRect::full())
            .unwrap();
        let mut engine = ExportEngine::new();
        let result = engine
            .export(Path::new("missing.mov"), None, &config, &output, &cancel)
            .await;

        assert!(matches!(
            result,
            Err(crate::error::FramerError::Export(ExportError::Cancelled))
        ));
        assert!(!output.exists());
    }
}
