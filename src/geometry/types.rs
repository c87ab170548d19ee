use serde::{Deserialize, Serialize};

use crate::error::{ExportError, Result};

/// Region of the frame artwork where video shows through, as percentages
/// (0-100) of the trimmed frame image's bounds. Top-left origin, x/y increasing
/// right/down.
///
/// Invariants (`0 <= x`, `0 <= y`, `x + w <= 100`, `y + h <= 100`) are not
/// hard-enforced; callers clamp via [`ScreenRect::clamped`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScreenRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl ScreenRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// The whole canvas: used when no frame artwork is configured.
    pub fn full() -> Self {
        Self::new(0.0, 0.0, 100.0, 100.0)
    }

    /// Clamp the rect so it lies fully within 0-100 on both axes.
    pub fn clamped(&self) -> Self {
        let x = self.x.clamp(0.0, 100.0);
        let y = self.y.clamp(0.0, 100.0);
        let w = self.w.clamp(0.0, 100.0 - x);
        let h = self.h.clamp(0.0, 100.0 - y);
        Self { x, y, w, h }
    }

    /// Convert to absolute canvas pixels, top-left origin.
    pub fn to_pixel_rect(&self, canvas_width: u32, canvas_height: u32) -> PixelRect {
        let cw = canvas_width as f64;
        let ch = canvas_height as f64;
        PixelRect {
            x: self.x / 100.0 * cw,
            y: self.y / 100.0 * ch,
            w: self.w / 100.0 * cw,
            h: self.h / 100.0 * ch,
        }
    }

    /// Grow the rect outward by `amount` percentage points per edge,
    /// clamped back into bounds.
    pub fn inflated(&self, amount: f64) -> Self {
        Self {
            x: self.x - amount,
            y: self.y - amount,
            w: self.w + amount * 2.0,
            h: self.h + amount * 2.0,
        }
        .clamped()
    }
}

/// Absolute pixel rectangle on the output canvas.
///
/// The origin convention is the caller's: [`ScreenRect::to_pixel_rect`]
/// produces top-left rects, and [`PixelRect::flip_y`] converts between the
/// top-left authoring space and the bottom-left space that composition layers
/// use.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PixelRect {
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
}

impl PixelRect {
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }

    /// Convert between top-left-origin and bottom-left-origin pixel spaces:
    /// `y' = canvas_height - y - h`. The conversion is its own inverse.
    ///
    /// Skipping this when handing rects to a bottom-left compositor places the
    /// video vertically mirrored, so it is pinned by an exact unit test.
    pub fn flip_y(&self, canvas_height: u32) -> Self {
        Self {
            x: self.x,
            y: canvas_height as f64 - self.y - self.h,
            w: self.w,
            h: self.h,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.w / 2.0, self.y + self.h / 2.0)
    }

    pub fn contains(&self, px: f64, py: f64) -> bool {
        px >= self.x && px < self.x + self.w && py >= self.y && py < self.y + self.h
    }
}

/// Placement policy for fitting source video into the screen rect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum FitMode {
    /// Uniform scale, entire source visible, may letterbox.
    #[default]
    Fit,
    /// Uniform scale, source covers the target, may crop.
    Fill,
    /// Independent X/Y scale, may distort.
    Stretch,
}

/// Sub-interval of the source timeline included in the export, in seconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrimRange {
    pub start: f64,
    pub end: f64,
}

impl TrimRange {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Reject the range before any composition is built: end must exceed
    /// start and the range must lie within the source duration.
    pub fn validate(&self, source_duration: f64) -> Result<()> {
        if self.start < 0.0 {
            return Err(ExportError::InvalidTrimRange {
                details: format!("start {:.3}s is negative", self.start),
            }
            .into());
        }
        if self.end <= self.start {
            return Err(ExportError::InvalidTrimRange {
                details: format!("end {:.3}s <= start {:.3}s", self.end, self.start),
            }
            .into());
        }
        if self.end > source_duration {
            return Err(ExportError::InvalidTrimRange {
                details: format!(
                    "end {:.3}s exceeds source duration {:.3}s",
                    self.end, source_duration
                ),
            }
            .into());
        }
        Ok(())
    }
}

/// Normalized displacement of the video within the screen rect.
///
/// Each axis is in [-1, 1] and represents a fraction of half the screen-rect
/// dimension, so +/-1.0 moves the content centre to the screen edge. Positive
/// y moves content downward on screen.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedOffset {
    pub x: f64,
    pub y: f64,
}

impl NormalizedOffset {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn clamped(&self) -> Self {
        Self {
            x: self.x.clamp(-1.0, 1.0),
            y: self.y.clamp(-1.0, 1.0),
        }
    }
}

/// Orientation-correcting rotation carried by the source video.
///
/// Portrait captures commonly store landscape pixels plus a rotation tag; the
/// rotation must be resolved before any fit math or the aspect ratio used for
/// scaling is wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    R0,
    R90,
    R180,
    R270,
}

impl Orientation {
    /// Normalize a rotation tag in degrees (any sign, any multiple of 90).
    pub fn from_degrees(degrees: i32) -> Self {
        match degrees.rem_euclid(360) {
            90 => Self::R90,
            180 => Self::R180,
            270 => Self::R270,
            _ => Self::R0,
        }
    }

    /// Apply the rotation to a natural pixel size, yielding the upright size.
    pub fn apply_to_size(&self, width: u32, height: u32) -> (u32, u32) {
        match self {
            Self::R0 | Self::R180 => (width, height),
            Self::R90 | Self::R270 => (height, width),
        }
    }
}

/// Scale + translate mapping from source video pixel space into canvas pixel
/// space. Derived per render, never stored.
///
/// `translate_x`/`translate_y` locate the bottom-left corner of the scaled
/// content in the canvas's bottom-left-origin space (the layer convention of
/// composition back ends). Rasterizers convert to raster rows at the blit
/// site.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacementTransform {
    pub scale_x: f64,
    pub scale_y: f64,
    pub translate_x: f64,
    pub translate_y: f64,
}

impl PlacementTransform {
    /// Size of the source content after scaling.
    pub fn scaled_size(&self, source_width: u32, source_height: u32) -> (f64, f64) {
        (
            source_width as f64 * self.scale_x,
            source_height as f64 * self.scale_y,
        )
    }
}
