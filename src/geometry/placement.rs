//! Pure placement math: fit policies, zoom, offset displacement, and the
//! canvas sizing policy shared by preview and export.

use crate::geometry::types::{FitMode, NormalizedOffset, PixelRect, PlacementTransform};

/// Floor for the zoom factor. Keeps the scale strictly positive so the
/// transform never degenerates.
pub const MIN_ZOOM: f64 = 0.1;

/// Compute the transform that places upright source content inside `target`.
///
/// `source_width`/`source_height` must already be orientation-corrected (see
/// [`Orientation::apply_to_size`](crate::geometry::Orientation::apply_to_size)).
/// `target` and the returned translation are in the canvas's
/// bottom-left-origin space.
///
/// The offset displaces the centred content by `offset * (target dim / 2)`
/// per axis, so an offset of +/-1.0 moves the content centre to the screen
/// edge. Positive `offset.y` moves content downward on screen, which in
/// bottom-left space decreases the translation.
///
/// This is a pure function; inputs are clamped rather than rejected, so it
/// always produces some transform.
pub fn compute_placement(
    source_width: u32,
    source_height: u32,
    target: PixelRect,
    fit: FitMode,
    zoom: f64,
    offset: NormalizedOffset,
) -> PlacementTransform {
    let src_w = (source_width.max(1)) as f64;
    let src_h = (source_height.max(1)) as f64;
    let zoom = zoom.max(MIN_ZOOM);
    let offset = offset.clamped();

    let (scale_x, scale_y) = match fit {
        FitMode::Fit => {
            let s = (target.w / src_w).min(target.h / src_h) * zoom;
            (s, s)
        }
        FitMode::Fill => {
            let s = (target.w / src_w).max(target.h / src_h) * zoom;
            (s, s)
        }
        // Zoom applies under Stretch as well: every fit policy responds to
        // the same zoom control.
        FitMode::Stretch => (target.w / src_w * zoom, target.h / src_h * zoom),
    };

    let scaled_w = src_w * scale_x;
    let scaled_h = src_h * scale_y;

    let translate_x = target.x + (target.w - scaled_w) / 2.0 + offset.x * target.w / 2.0;
    let translate_y = target.y + (target.h - scaled_h) / 2.0 - offset.y * target.h / 2.0;

    PlacementTransform {
        scale_x,
        scale_y,
        translate_x,
        translate_y,
    }
}

/// Round to the nearest even integer. Video encoders require even dimensions.
pub fn round_even(value: f64) -> u32 {
    let n = (value / 2.0).round() as u32 * 2;
    n.max(2)
}

/// Output canvas dimensions for a composition.
///
/// With frame artwork the canvas matches the frame's aspect ratio (width fixed
/// from configuration, height derived) so the artwork itself is never
/// letterboxed. Without a frame the configured canvas is used as-is. Both
/// dimensions are forced even.
pub fn canvas_size(
    frame_size: Option<(u32, u32)>,
    config_width: u32,
    config_height: u32,
) -> (u32, u32) {
    match frame_size {
        Some((fw, fh)) => {
            let width = round_even(config_width as f64);
            let height = round_even(width as f64 * fh as f64 / fw.max(1) as f64);
            (width, height)
        }
        None => (
            round_even(config_width as f64),
            round_even(config_height as f64),
        ),
    }
}
