//! CPU compositing of a single output frame.
//!
//! One code path serves both the export pipeline and the live preview, which
//! is what keeps the two pixel-identical: layering is background, then the
//! masked/transformed video, then the frame artwork on top.

use image::{imageops, GrayImage, Rgba, RgbaImage};

use crate::geometry::PlacementTransform;

/// Composite one upright source frame into a canvas.
///
/// `transform` is in the canvas's bottom-left-origin space; the conversion to
/// raster rows happens here, at the single blit site. `mask` and `artwork`
/// must already be canvas-sized.
pub fn composite_frame(
    source: &RgbaImage,
    transform: &PlacementTransform,
    mask: Option<&GrayImage>,
    artwork: Option<&RgbaImage>,
    canvas_width: u32,
    canvas_height: u32,
) -> RgbaImage {
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([0, 0, 0, 255]));

    let (scaled_w, scaled_h) = transform.scaled_size(source.width(), source.height());
    let scaled_w = (scaled_w.round() as u32).max(1);
    let scaled_h = (scaled_h.round() as u32).max(1);

    let scaled = if (scaled_w, scaled_h) == (source.width(), source.height()) {
        source.clone()
    } else {
        imageops::resize(source, scaled_w, scaled_h, imageops::FilterType::Lanczos3)
    };

    // Bottom-left translation -> raster rows: the top row of the content sits
    // at canvas_height - (translate_y + scaled_h).
    let left = transform.translate_x.round() as i64;
    let top = canvas_height as i64 - transform.translate_y.round() as i64 - scaled_h as i64;

    blit_masked(&mut canvas, &scaled, mask, left, top);

    if let Some(artwork) = artwork {
        imageops::overlay(&mut canvas, artwork, 0, 0);
    }

    canvas
}

/// Scale artwork to the canvas, aspect-fit and centred. When the canvas was
/// derived from the artwork's own aspect ratio this fills it exactly.
pub fn fit_artwork_to_canvas(
    artwork: &RgbaImage,
    canvas_width: u32,
    canvas_height: u32,
) -> RgbaImage {
    let scale = (canvas_width as f64 / artwork.width().max(1) as f64)
        .min(canvas_height as f64 / artwork.height().max(1) as f64);
    let w = ((artwork.width() as f64 * scale).round() as u32).max(1);
    let h = ((artwork.height() as f64 * scale).round() as u32).max(1);

    if (w, h) == (canvas_width, canvas_height) {
        return imageops::resize(artwork, w, h, imageops::FilterType::Lanczos3);
    }

    let resized = imageops::resize(artwork, w, h, imageops::FilterType::Lanczos3);
    let mut canvas = RgbaImage::from_pixel(canvas_width, canvas_height, Rgba([0, 0, 0, 0]));
    let left = (canvas_width as i64 - w as i64) / 2;
    let top = (canvas_height as i64 - h as i64) / 2;
    imageops::overlay(&mut canvas, &resized, left, top);
    canvas
}

/// Source-over blend of `src` onto `canvas` at (`left`, `top`), attenuated
/// per destination pixel by the mask.
fn blit_masked(
    canvas: &mut RgbaImage,
    src: &RgbaImage,
    mask: Option<&GrayImage>,
    left: i64,
    top: i64,
) {
    let canvas_w = canvas.width() as i64;
    let canvas_h = canvas.height() as i64;

    for (sx, sy, pixel) in src.enumerate_pixels() {
        let dx = left + sx as i64;
        let dy = top + sy as i64;
        if dx < 0 || dy < 0 || dx >= canvas_w || dy >= canvas_h {
            continue;
        }
        let (dx, dy) = (dx as u32, dy as u32);

        let mask_alpha = mask.map(|m| m.get_pixel(dx, dy)[0]).unwrap_or(255);
        if mask_alpha == 0 {
            continue;
        }

        let alpha = pixel[3] as u32 * mask_alpha as u32; // 0..=255*255
        if alpha == 0 {
            continue;
        }

        let dst = canvas.get_pixel_mut(dx, dy);
        for channel in 0..3 {
            let src_c = pixel[channel] as u32;
            let dst_c = dst[channel] as u32;
            dst[channel] = ((src_c * alpha + dst_c * (255 * 255 - alpha)) / (255 * 255)) as u8;
        }
    }
}
