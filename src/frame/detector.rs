//! Screen-region detection for device-frame artwork.
//!
//! Two operations, both driven purely by the alpha channel:
//!
//! 1. **Trim**: the minimal bounding box of pixels with alpha > 0 establishes
//!    the artwork's visible bounds. This runs before any percentage is
//!    computed or consumed.
//! 2. **Detect**: locate the single contiguous fully-transparent region that
//!    represents the device screen and return it as a percentage-based
//!    [`ScreenRect`].
//!
//! Detection failure is non-fatal and reported as `None`; callers keep
//! whichever rect was previously configured.

use image::RgbaImage;
use tracing::debug;

use crate::geometry::ScreenRect;

/// Longest edge of the downsampled working image. Bounds the flood-fill cost
/// independent of the source resolution; the result is a percentage, so it is
/// valid against the full-resolution image too.
const WORKING_EDGE: u32 = 600;

/// Inward inset applied to the detected rect, in percentage points per edge.
/// Skips anti-aliased semi-transparent border pixels that the strict
/// alpha == 0 test misses, which would otherwise let a thin video sliver
/// bleed past the true screen edge in export.
const EDGE_INSET: f64 = 1.0;

/// Inclusive pixel bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelBounds {
    pub min_x: u32,
    pub min_y: u32,
    pub max_x: u32,
    pub max_y: u32,
}

impl PixelBounds {
    pub fn width(&self) -> u32 {
        self.max_x - self.min_x + 1
    }

    pub fn height(&self) -> u32 {
        self.max_y - self.min_y + 1
    }
}

/// Minimal bounding box containing every pixel with alpha > 0, or `None` for
/// a fully transparent image.
pub fn visible_bounds(image: &RgbaImage) -> Option<PixelBounds> {
    let mut bounds: Option<PixelBounds> = None;

    for (x, y, pixel) in image.enumerate_pixels() {
        if pixel[3] == 0 {
            continue;
        }
        match &mut bounds {
            Some(b) => {
                b.min_x = b.min_x.min(x);
                b.min_y = b.min_y.min(y);
                b.max_x = b.max_x.max(x);
                b.max_y = b.max_y.max(y);
            }
            None => {
                bounds = Some(PixelBounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                });
            }
        }
    }

    bounds
}

/// Crop the image to its visible bounds. A fully transparent image cannot be
/// trimmed and is returned unchanged.
pub fn trim_transparent(image: &RgbaImage) -> RgbaImage {
    match visible_bounds(image) {
        Some(b) => {
            if b.width() == image.width() && b.height() == image.height() {
                return image.clone();
            }
            debug!(
                "Trimmed frame artwork {}x{} -> {}x{}",
                image.width(),
                image.height(),
                b.width(),
                b.height()
            );
            image::imageops::crop_imm(image, b.min_x, b.min_y, b.width(), b.height()).to_image()
        }
        None => image.clone(),
    }
}

/// Locate the contiguous fully-transparent screen hole in (already trimmed)
/// frame artwork.
///
/// Returns `None` when the artwork contains no zero-alpha pixel at all; the
/// caller keeps its prior or default rect.
pub fn detect_screen_rect(image: &RgbaImage) -> Option<ScreenRect> {
    let alpha = AlphaGrid::downsample(image);

    let (seed_x, seed_y) = alpha.find_center_seed()?;
    let bounds = alpha.flood_fill_bounds(seed_x, seed_y);

    let w = alpha.width as f64;
    let h = alpha.height as f64;
    let rect = ScreenRect {
        x: bounds.min_x as f64 / w * 100.0 + EDGE_INSET,
        y: bounds.min_y as f64 / h * 100.0 + EDGE_INSET,
        w: (bounds.width() as f64 / w * 100.0 - EDGE_INSET * 2.0).max(0.0),
        h: (bounds.height() as f64 / h * 100.0 - EDGE_INSET * 2.0).max(0.0),
    }
    .clamped();

    debug!(
        "Detected screen hole at {:.1}%,{:.1}% {:.1}x{:.1}%",
        rect.x, rect.y, rect.w, rect.h
    );
    Some(rect)
}

/// Alpha channel of the artwork, downsampled with nearest-neighbour sampling
/// so the strict alpha == 0 test survives resampling.
struct AlphaGrid {
    width: u32,
    height: u32,
    alpha: Vec<u8>,
}

impl AlphaGrid {
    fn downsample(image: &RgbaImage) -> Self {
        let (src_w, src_h) = (image.width().max(1), image.height().max(1));
        let longest = src_w.max(src_h);

        let (width, height) = if longest <= WORKING_EDGE {
            (src_w, src_h)
        } else if src_w >= src_h {
            let h = (src_h as u64 * WORKING_EDGE as u64 / src_w as u64).max(1) as u32;
            (WORKING_EDGE, h)
        } else {
            let w = (src_w as u64 * WORKING_EDGE as u64 / src_h as u64).max(1) as u32;
            (w, WORKING_EDGE)
        };

        let mut alpha = Vec::with_capacity((width * height) as usize);
        for y in 0..height {
            let src_y = (y as u64 * src_h as u64 / height as u64) as u32;
            for x in 0..width {
                let src_x = (x as u64 * src_w as u64 / width as u64) as u32;
                alpha.push(image.get_pixel(src_x, src_y)[3]);
            }
        }

        Self {
            width,
            height,
            alpha,
        }
    }

    fn alpha_at(&self, x: u32, y: u32) -> u8 {
        self.alpha[(y * self.width + x) as usize]
    }

    /// Search outward from the image centre in expanding square rings for the
    /// first fully transparent pixel. The centre bias seeds on the screen
    /// hole rather than on unrelated transparent pixels near an edge.
    fn find_center_seed(&self) -> Option<(u32, u32)> {
        let cx = (self.width / 2) as i64;
        let cy = (self.height / 2) as i64;
        let max_radius = self.width.max(self.height) as i64;

        for radius in 0..=max_radius {
            let mut found = None;
            self.for_each_ring_cell(cx, cy, radius, |x, y| {
                if found.is_none() && self.alpha_at(x, y) == 0 {
                    found = Some((x, y));
                }
            });
            if found.is_some() {
                return found;
            }
        }

        None
    }

    fn for_each_ring_cell<F: FnMut(u32, u32)>(&self, cx: i64, cy: i64, radius: i64, mut f: F) {
        let mut visit = |x: i64, y: i64| {
            if x >= 0 && y >= 0 && x < self.width as i64 && y < self.height as i64 {
                f(x as u32, y as u32);
            }
        };

        if radius == 0 {
            visit(cx, cy);
            return;
        }

        for x in (cx - radius)..=(cx + radius) {
            visit(x, cy - radius);
            visit(x, cy + radius);
        }
        for y in (cy - radius + 1)..=(cy + radius - 1) {
            visit(cx - radius, y);
            visit(cx + radius, y);
        }
    }

    /// 4-connected flood fill over alpha == 0 pixels reachable from the seed,
    /// tracking the running bounding box. Explicit stack and a visited bitmap
    /// sized to the grid; recursion would overflow on large holes.
    fn flood_fill_bounds(&self, seed_x: u32, seed_y: u32) -> PixelBounds {
        let mut visited = vec![false; (self.width * self.height) as usize];
        let mut stack = vec![(seed_x, seed_y)];
        let mut bounds = PixelBounds {
            min_x: seed_x,
            min_y: seed_y,
            max_x: seed_x,
            max_y: seed_y,
        };

        visited[(seed_y * self.width + seed_x) as usize] = true;

        while let Some((x, y)) = stack.pop() {
            bounds.min_x = bounds.min_x.min(x);
            bounds.min_y = bounds.min_y.min(y);
            bounds.max_x = bounds.max_x.max(x);
            bounds.max_y = bounds.max_y.max(y);

            let neighbours = [
                (x.wrapping_sub(1), y),
                (x + 1, y),
                (x, y.wrapping_sub(1)),
                (x, y + 1),
            ];
            for (nx, ny) in neighbours {
                if nx >= self.width || ny >= self.height {
                    continue;
                }
                let index = (ny * self.width + nx) as usize;
                if !visited[index] && self.alpha[index] == 0 {
                    visited[index] = true;
                    stack.push((nx, ny));
                }
            }
        }

        bounds
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    const OPAQUE: Rgba<u8> = Rgba([40, 40, 40, 255]);
    const CLEAR: Rgba<u8> = Rgba([0, 0, 0, 0]);

    /// Frame artwork with a rectangular transparent hole.
    fn frame_with_hole(
        width: u32,
        height: u32,
        hole_x: std::ops::Range<u32>,
        hole_y: std::ops::Range<u32>,
    ) -> RgbaImage {
        RgbaImage::from_fn(width, height, |x, y| {
            if hole_x.contains(&x) && hole_y.contains(&y) {
                CLEAR
            } else {
                OPAQUE
            }
        })
    }

    #[test]
    fn test_detection_round_trip() {
        // Known hole at (100,100)-(900,1900) inside a 1000x2000 canvas:
        // expected rect {x:10, y:5, w:80, h:90}, within 2 points.
        let image = frame_with_hole(1000, 2000, 100..900, 100..1900);
        let rect = detect_screen_rect(&image).expect("hole should be detected");

        assert!((rect.x - 10.0).abs() <= 2.0, "x = {}", rect.x);
        assert!((rect.y - 5.0).abs() <= 2.0, "y = {}", rect.y);
        assert!((rect.w - 80.0).abs() <= 2.01, "w = {}", rect.w);
        assert!((rect.h - 90.0).abs() <= 2.01, "h = {}", rect.h);
    }

    #[test]
    fn test_all_opaque_image_yields_no_result() {
        let image = RgbaImage::from_pixel(400, 300, OPAQUE);
        assert_eq!(detect_screen_rect(&image), None);
    }

    #[test]
    fn test_detection_without_downsampling() {
        // Smaller than the working edge on both axes: the grid is 1:1.
        let image = frame_with_hole(200, 100, 50..150, 25..75);
        let rect = detect_screen_rect(&image).expect("hole should be detected");

        assert!((rect.x - 25.0).abs() <= 1.5, "x = {}", rect.x);
        assert!((rect.y - 25.0).abs() <= 1.5, "y = {}", rect.y);
        assert!((rect.w - 50.0).abs() <= 2.5, "w = {}", rect.w);
        assert!((rect.h - 50.0).abs() <= 2.5, "h = {}", rect.h);
    }

    #[test]
    fn test_center_bias_ignores_disconnected_corner_transparency() {
        // A transparent corner blob must not widen the detected hole: the
        // ring search seeds at the centre and the 4-connected fill cannot
        // reach the corner.
        let mut image = frame_with_hole(400, 400, 100..300, 100..300);
        for y in 0..20 {
            for x in 0..20 {
                image.put_pixel(x, y, CLEAR);
            }
        }

        let rect = detect_screen_rect(&image).expect("hole should be detected");
        assert!(rect.x > 20.0, "corner blob leaked into rect: x = {}", rect.x);
        assert!(rect.y > 20.0, "corner blob leaked into rect: y = {}", rect.y);
    }

    #[test]
    fn test_inset_pulls_rect_inside_hole() {
        let image = frame_with_hole(1000, 1000, 200..800, 200..800);
        let rect = detect_screen_rect(&image).expect("hole should be detected");

        // Hole spans 20%..80%; the returned rect sits strictly inside it.
        assert!(rect.x > 20.0);
        assert!(rect.y > 20.0);
        assert!(rect.x + rect.w < 80.0);
        assert!(rect.y + rect.h < 80.0);
    }

    #[test]
    fn test_visible_bounds_and_trim() {
        let image = RgbaImage::from_fn(100, 50, |x, y| {
            if (10..90).contains(&x) && (5..45).contains(&y) {
                OPAQUE
            } else {
                CLEAR
            }
        });

        let bounds = visible_bounds(&image).unwrap();
        assert_eq!(bounds.min_x, 10);
        assert_eq!(bounds.min_y, 5);
        assert_eq!(bounds.width(), 80);
        assert_eq!(bounds.height(), 40);

        let trimmed = trim_transparent(&image);
        assert_eq!((trimmed.width(), trimmed.height()), (80, 40));
    }

    #[test]
    fn test_trim_of_fully_transparent_image_is_identity() {
        let image = RgbaImage::from_pixel(32, 16, CLEAR);
        let trimmed = trim_transparent(&image);
        assert_eq!((trimmed.width(), trimmed.height()), (32, 16));
    }
}
