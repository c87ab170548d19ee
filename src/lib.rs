//! # Screenframer
//!
//! Composite screen recordings into device-frame artwork.
//!
//! Screenframer takes a finished screen recording and a frame image (a PNG
//! with a transparent hole where the screen belongs), finds the screen region
//! automatically, and renders the video realistically inset behind the
//! artwork into an encoded mp4/mov file.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use screenframer::{
//!     composition::{CancelToken, ExportEngine},
//!     config::Config,
//!     frame::FrameImage,
//!     geometry::ScreenRect,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let frame = FrameImage::load("device_frame.png")?;
//! let detected = frame.detect_screen_rect();
//!
//! let config = Config::default().resolve(12.5, detected, ScreenRect::full())?;
//!
//! let mut engine = ExportEngine::new();
//! engine
//!     .export(
//!         "recording.mov".as_ref(),
//!         Some(&frame),
//!         &config,
//!         "framed.mp4".as_ref(),
//!         &CancelToken::new(),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! The library is organized into several key modules:
//!
//! - [`frame`] - Frame artwork loading, screen-hole detection, presets
//! - [`geometry`] - Pure placement math and coordinate-space conversions
//! - [`composition`] - The export pipeline (mask, composite, encode)
//! - [`preview`] - Live preview sharing the pipeline's exact geometry
//! - [`video`] - Source-video probing
//! - [`config`] - Configuration management
//!
//! ## Coordinate spaces
//!
//! Screen rects are authored as percentages of the trimmed frame artwork,
//! top-left origin. Placement transforms live in the canvas's
//! bottom-left-origin space; [`geometry::PixelRect::flip_y`] converts between
//! the two, and the compositor converts to raster rows at the blit site.

pub mod composition;
pub mod config;
pub mod error;
pub mod frame;
pub mod geometry;
pub mod preview;
pub mod video;

// Re-export commonly used types for convenience
pub use crate::{
    composition::{CancelToken, EncodedVideo, ExportEngine},
    config::{CompositionConfig, Config, OutputFormat},
    error::{FramerError, Result},
    frame::{FrameImage, PresetRegistry},
    geometry::{FitMode, ScreenRect},
    preview::PreviewRenderer,
};
