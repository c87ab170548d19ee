use std::path::Path;

use image::RgbaImage;

use crate::error::{FrameError, Result};
use crate::frame::detector;

/// Decoded device-frame artwork.
///
/// The raster is trimmed to its visible bounds at construction, because frame
/// artwork commonly ships with extra transparent margin that would otherwise
/// corrupt every percentage-based placement computation. The raster is never
/// mutated after construction; derived images (masks, canvas-sized copies)
/// are new allocations.
#[derive(Debug, Clone)]
pub struct FrameImage {
    raster: RgbaImage,
}

impl FrameImage {
    /// Load frame artwork from a PNG file.
    ///
    /// The file must decode to an image with an alpha channel; the alpha
    /// channel is what defines both the visible bounds and the screen hole.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let decoded = image::open(path).map_err(|_| FrameError::LoadFailed {
            path: path.display().to_string(),
        })?;

        if !decoded.color().has_alpha() {
            return Err(FrameError::NoAlphaChannel {
                path: path.display().to_string(),
            }
            .into());
        }

        Ok(Self::from_raster(decoded.to_rgba8()))
    }

    /// Build from an already-decoded raster, trimming transparent padding.
    pub fn from_raster(raster: RgbaImage) -> Self {
        Self {
            raster: detector::trim_transparent(&raster),
        }
    }

    /// The trimmed artwork raster. All `ScreenRect` percentages are relative
    /// to these bounds.
    pub fn raster(&self) -> &RgbaImage {
        &self.raster
    }

    pub fn width(&self) -> u32 {
        self.raster.width()
    }

    pub fn height(&self) -> u32 {
        self.raster.height()
    }

    pub fn size(&self) -> (u32, u32) {
        (self.raster.width(), self.raster.height())
    }

    /// Locate the transparent screen hole, if the artwork has one.
    pub fn detect_screen_rect(&self) -> Option<crate::geometry::ScreenRect> {
        detector::detect_screen_rect(&self.raster)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn test_from_raster_trims_padding() {
        // 100x100 canvas, opaque content only in 20..80 x 30..70.
        let raster = RgbaImage::from_fn(100, 100, |x, y| {
            if (20..80).contains(&x) && (30..70).contains(&y) {
                Rgba([10, 20, 30, 255])
            } else {
                Rgba([0, 0, 0, 0])
            }
        });

        let frame = FrameImage::from_raster(raster);
        assert_eq!(frame.size(), (60, 40));
    }

    #[test]
    fn test_fully_transparent_raster_kept_unchanged() {
        let raster = RgbaImage::from_pixel(64, 48, Rgba([0, 0, 0, 0]));
        let frame = FrameImage::from_raster(raster);
        assert_eq!(frame.size(), (64, 48));
    }

    #[test]
    fn test_load_missing_file_fails() {
        let result = FrameImage::load("/nonexistent/frame.png");
        assert!(result.is_err());
    }
}
