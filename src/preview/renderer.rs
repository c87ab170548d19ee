//! Live preview of the composition.
//!
//! The preview reproduces the pipeline's placement, masking, and layering
//! stages against a single decoded video frame, deriving its geometry from
//! the same [`CompositionPlan`] the exporter runs, so what the preview shows
//! is what export encodes. Recomputation is pure geometry and cheap enough to
//! run on every slider tick; no debouncing is needed for correctness.

use image::RgbaImage;

use crate::{
    composition::{compositor, mask, CompositionPlan},
    config::CompositionConfig,
    frame::FrameImage,
    geometry::{PixelRect, PlacementTransform},
    video::VideoMetadata,
};

/// Geometry of one preview pass.
#[derive(Debug, Clone, PartialEq)]
pub struct PreviewLayout {
    pub canvas_width: u32,
    pub canvas_height: u32,

    /// Screen region in canvas pixels, top-left origin.
    pub screen_px: PixelRect,

    /// Video placement, bottom-left space.
    pub transform: PlacementTransform,
}

impl From<CompositionPlan> for PreviewLayout {
    fn from(plan: CompositionPlan) -> Self {
        Self {
            canvas_width: plan.canvas_width,
            canvas_height: plan.canvas_height,
            screen_px: plan.screen_px,
            transform: plan.transform,
        }
    }
}

/// Stateless preview renderer. Call again whenever any of screen rect, zoom,
/// offset, fit mode, frame image, or canvas changes.
pub struct PreviewRenderer;

impl PreviewRenderer {
    /// Compute the preview geometry for the current configuration.
    pub fn layout(
        config: &CompositionConfig,
        frame: Option<&FrameImage>,
        source: &VideoMetadata,
    ) -> PreviewLayout {
        CompositionPlan::build(
            source.upright_size(),
            source.fps,
            frame.map(|f| f.size()),
            config,
        )
        .into()
    }

    /// Composite one upright video frame exactly as export would.
    pub fn render_still(
        video_frame: &RgbaImage,
        frame: Option<&FrameImage>,
        config: &CompositionConfig,
    ) -> RgbaImage {
        let plan = CompositionPlan::build(
            (video_frame.width(), video_frame.height()),
            0.0,
            frame.map(|f| f.size()),
            config,
        );

        let artwork = frame.map(|f| {
            compositor::fit_artwork_to_canvas(f.raster(), plan.canvas_width, plan.canvas_height)
        });
        let layer_mask = mask::build_mask(
            artwork.as_ref(),
            plan.screen_px,
            plan.canvas_width,
            plan.canvas_height,
        );

        compositor::composite_frame(
            video_frame,
            &plan.transform,
            layer_mask.as_ref(),
            artwork.as_ref(),
            plan.canvas_width,
            plan.canvas_height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OutputFormat;
    use crate::geometry::{FitMode, NormalizedOffset, Orientation, ScreenRect, TrimRange};
    use image::{Rgba, RgbaImage};

    const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);

    fn is_red(pixel: &Rgba<u8>) -> bool {
        pixel[0] > 200 && pixel[1] < 50 && pixel[2] < 50
    }

    fn config() -> CompositionConfig {
        CompositionConfig {
            format: OutputFormat::Mp4,
            canvas_width: 200,
            canvas_height: 200,
            quality: 90,
            trim: TrimRange::new(0.0, 1.0),
            screen_rect: ScreenRect::new(25.0, 20.0, 50.0, 60.0),
            zoom: 1.0,
            offset: NormalizedOffset::default(),
            fit: FitMode::Stretch,
        }
    }

    /// Square artwork with a transparent hole matching the screen rect.
    fn frame_artwork() -> FrameImage {
        FrameImage::from_raster(RgbaImage::from_fn(400, 400, |x, y| {
            if (100..300).contains(&x) && (80..320).contains(&y) {
                Rgba([0, 0, 0, 0])
            } else {
                Rgba([50, 50, 50, 255])
            }
        }))
    }

    fn metadata() -> VideoMetadata {
        VideoMetadata {
            width: 1920,
            height: 1080,
            fps: 60.0,
            duration: 10.0,
            orientation: Orientation::R90,
            has_audio: false,
        }
    }

    #[test]
    fn test_layout_matches_export_plan() {
        // Preview and export must never diverge in framing: the layout is
        // the export plan's geometry, field for field.
        let frame = frame_artwork();
        let layout = PreviewRenderer::layout(&config(), Some(&frame), &metadata());
        let plan = CompositionPlan::build(
            metadata().upright_size(),
            metadata().fps,
            Some(frame.size()),
            &config(),
        );

        assert_eq!(layout, PreviewLayout::from(plan));
    }

    #[test]
    fn test_layout_uses_upright_source_size() {
        let rotated = metadata();
        let layout = PreviewRenderer::layout(&config(), None, &rotated);

        let mut unrotated = metadata();
        unrotated.orientation = Orientation::R0;
        unrotated.width = 1080;
        unrotated.height = 1920;
        let layout_b = PreviewRenderer::layout(&config(), None, &unrotated);

        assert_eq!(layout, layout_b);
    }

    #[test]
    fn test_layout_canvas_policy_without_frame() {
        let layout = PreviewRenderer::layout(&config(), None, &metadata());
        assert_eq!((layout.canvas_width, layout.canvas_height), (200, 200));
        assert_eq!(layout.screen_px, PixelRect::new(0.0, 0.0, 200.0, 200.0));
    }

    #[test]
    fn test_render_still_masks_video_outside_screen_rect() {
        // Masking containment: no pixel strictly outside the screen region
        // may show source video; it must match the frame artwork instead.
        let frame = frame_artwork();
        let video = RgbaImage::from_pixel(400, 300, RED);
        let rendered = PreviewRenderer::render_still(&video, Some(&frame), &config());

        assert_eq!((rendered.width(), rendered.height()), (200, 200));

        // Inside the screen rect (canvas 200x200, rect 50,40,100,120).
        assert!(is_red(rendered.get_pixel(100, 100)));

        // Comfortably outside the screen region on all sides and corners.
        for (x, y) in [(25, 100), (175, 100), (100, 15), (100, 185), (5, 5), (195, 195)] {
            let pixel = rendered.get_pixel(x, y);
            assert!(
                !is_red(pixel),
                "video leaked outside the screen rect at ({}, {}): {:?}",
                x,
                y,
                pixel
            );
        }
    }

    #[test]
    fn test_render_still_without_frame_fills_canvas() {
        let video = RgbaImage::from_pixel(100, 100, RED);
        let rendered = PreviewRenderer::render_still(&video, None, &config());

        assert!(is_red(rendered.get_pixel(0, 0)));
        assert!(is_red(rendered.get_pixel(199, 199)));
    }
}
