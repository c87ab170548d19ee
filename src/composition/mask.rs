//! Clipping masks restricting the video layer to the screen region.
//!
//! The preferred mask is derived from the frame artwork itself: inverting its
//! alpha channel turns the screen hole into opaque mask and the frame body
//! into transparent mask, so the video follows the artwork's true silhouette
//! (notches, rounded corners, non-rectangular cutouts). A rounded-rectangle
//! mask exists only as the fallback for artwork whose alpha yields no hole.

use image::{GrayImage, RgbaImage};
use tracing::debug;

use crate::geometry::PixelRect;

/// Corner radius of the fallback mask as a fraction of the smaller screen
/// dimension.
const FALLBACK_CORNER_RADIUS_FRACTION: f64 = 0.12;

/// How far beyond the screen rect the alpha mask may extend, as a fraction of
/// each canvas dimension. The detected rect is inset from the true hole edge
/// to dodge anti-aliased pixels; the clip region must re-cover that margin or
/// the mask would crop the hole's own border.
const CLIP_INFLATION_FRACTION: f64 = 0.025;

/// Build the video-layer mask for a composition. 255 shows video, 0 hides it.
///
/// * No artwork: `None` — the full canvas is the screen region and the video
///   layer needs no clipping.
/// * Artwork with a transparent hole inside the screen rect: inverted-alpha
///   mask, clipped to the slightly-inflated screen rect so unrelated
///   transparent margins (outside the device body) never leak video.
/// * Artwork without a usable hole: rounded-rectangle mask over the screen
///   rect.
pub fn build_mask(
    artwork_canvas: Option<&RgbaImage>,
    screen_px: PixelRect,
    canvas_width: u32,
    canvas_height: u32,
) -> Option<GrayImage> {
    let artwork = artwork_canvas?;

    let clip = inflate_clip(screen_px, canvas_width, canvas_height);
    if has_hole_within(artwork, &clip) {
        Some(inverted_alpha_mask(artwork, &clip))
    } else {
        debug!("Frame artwork has no transparent hole; using rounded-rect mask");
        Some(rounded_rect_mask(canvas_width, canvas_height, screen_px))
    }
}

fn inflate_clip(rect: PixelRect, canvas_width: u32, canvas_height: u32) -> PixelRect {
    let dx = canvas_width as f64 * CLIP_INFLATION_FRACTION;
    let dy = canvas_height as f64 * CLIP_INFLATION_FRACTION;
    let x = (rect.x - dx).max(0.0);
    let y = (rect.y - dy).max(0.0);
    PixelRect {
        x,
        y,
        w: (rect.w + dx * 2.0).min(canvas_width as f64 - x),
        h: (rect.h + dy * 2.0).min(canvas_height as f64 - y),
    }
}

fn has_hole_within(artwork: &RgbaImage, clip: &PixelRect) -> bool {
    artwork
        .enumerate_pixels()
        .any(|(x, y, p)| p[3] == 0 && clip.contains(x as f64, y as f64))
}

/// Screen hole (alpha 0) becomes fully opaque mask; frame body becomes
/// transparent. Semi-transparent anti-aliased edges blend proportionally.
fn inverted_alpha_mask(artwork: &RgbaImage, clip: &PixelRect) -> GrayImage {
    GrayImage::from_fn(artwork.width(), artwork.height(), |x, y| {
        if clip.contains(x as f64, y as f64) {
            image::Luma([255 - artwork.get_pixel(x, y)[3]])
        } else {
            image::Luma([0])
        }
    })
}

/// Binary rounded-rectangle mask over the screen rect. Corner radius is a
/// fixed fraction of the smaller screen dimension.
pub fn rounded_rect_mask(canvas_width: u32, canvas_height: u32, rect: PixelRect) -> GrayImage {
    let radius = rect.w.min(rect.h) * FALLBACK_CORNER_RADIUS_FRACTION;

    GrayImage::from_fn(canvas_width, canvas_height, |x, y| {
        let px = x as f64 + 0.5;
        let py = y as f64 + 0.5;
        if inside_rounded_rect(px, py, &rect, radius) {
            image::Luma([255])
        } else {
            image::Luma([0])
        }
    })
}

fn inside_rounded_rect(px: f64, py: f64, rect: &PixelRect, radius: f64) -> bool {
    if !rect.contains(px, py) {
        return false;
    }

    // Distance from the nearest corner centre decides the rounded region.
    let left = rect.x + radius;
    let right = rect.x + rect.w - radius;
    let top = rect.y + radius;
    let bottom = rect.y + rect.h - radius;

    let cx = px.clamp(left, right);
    let cy = py.clamp(top, bottom);
    let dx = px - cx;
    let dy = py - cy;
    dx * dx + dy * dy <= radius * radius
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const OPAQUE: Rgba<u8> = Rgba([30, 30, 30, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    /// Canvas-sized artwork: opaque body with a transparent hole, plus
    /// transparent corners like rounded device artwork has.
    fn artwork() -> RgbaImage {
        RgbaImage::from_fn(200, 200, |x, y| {
            let in_hole = (50..150).contains(&x) && (40..160).contains(&y);
            let in_corner = x < 12 && y < 12;
            if in_hole || in_corner {
                CLEAR
            } else {
                OPAQUE
            }
        })
    }

    fn screen_px() -> PixelRect {
        PixelRect::new(52.0, 42.0, 96.0, 116.0)
    }

    #[test]
    fn test_no_artwork_means_no_mask() {
        assert!(build_mask(None, screen_px(), 200, 200).is_none());
    }

    #[test]
    fn test_alpha_mask_opens_hole_and_covers_body() {
        let mask = build_mask(Some(&artwork()), screen_px(), 200, 200).unwrap();

        // Centre of the hole: video shows.
        assert_eq!(mask.get_pixel(100, 100)[0], 255);
        // Frame body: video hidden.
        assert_eq!(mask.get_pixel(20, 100)[0], 0);
        assert_eq!(mask.get_pixel(100, 20)[0], 0);
    }

    #[test]
    fn test_alpha_mask_clip_excludes_corner_transparency() {
        // The transparent corner of the artwork is outside the clip region
        // and must stay masked even though its alpha is zero.
        let mask = build_mask(Some(&artwork()), screen_px(), 200, 200).unwrap();
        assert_eq!(mask.get_pixel(5, 5)[0], 0);
    }

    #[test]
    fn test_alpha_mask_recovers_inset_margin() {
        // The screen rect is inset from the hole edge; pixels between the
        // rect edge and the hole edge still show video.
        let mask = build_mask(Some(&artwork()), screen_px(), 200, 200).unwrap();
        assert_eq!(mask.get_pixel(51, 100)[0], 255);
    }

    #[test]
    fn test_opaque_artwork_falls_back_to_rounded_rect() {
        let solid = RgbaImage::from_pixel(200, 200, OPAQUE);
        let mask = build_mask(Some(&solid), screen_px(), 200, 200).unwrap();

        // Centre shows video, corner of the screen rect is rounded off,
        // outside the rect is masked.
        assert_eq!(mask.get_pixel(100, 100)[0], 255);
        assert_eq!(mask.get_pixel(53, 43)[0], 0);
        assert_eq!(mask.get_pixel(20, 100)[0], 0);
    }

    #[test]
    fn test_rounded_rect_mask_edges() {
        let rect = PixelRect::new(40.0, 40.0, 120.0, 120.0);
        let mask = rounded_rect_mask(200, 200, rect);

        // Edge midpoints are inside, corners are rounded away.
        assert_eq!(mask.get_pixel(100, 41)[0], 255);
        assert_eq!(mask.get_pixel(41, 100)[0], 255);
        assert_eq!(mask.get_pixel(41, 41)[0], 0);
        assert_eq!(mask.get_pixel(158, 158)[0], 0);
    }
}
