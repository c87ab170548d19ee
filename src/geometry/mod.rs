//! # Geometry Module
//!
//! Pure placement math: the percent-based screen rectangle, fit policies,
//! coordinate-space conversions, and the placement transform that maps source
//! video pixels into the output canvas. Everything here is side-effect free and
//! safe to call from any thread.

pub mod placement;
pub mod types;

pub use placement::{canvas_size, compute_placement, round_even, MIN_ZOOM};
pub use types::{
    FitMode, NormalizedOffset, Orientation, PixelRect, PlacementTransform, ScreenRect, TrimRange,
};
