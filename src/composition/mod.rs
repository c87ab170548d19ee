//! # Composition Module
//!
//! The export pipeline: masking, per-frame compositing, ffmpeg encoding, and
//! the engine that sequences them. The live preview reuses the same
//! compositing and planning code so preview and export never diverge.

pub mod compositor;
pub mod encoder;
pub mod engine;
pub mod mask;

pub use encoder::CancelToken;
pub use engine::{CompositionPlan, EncodedVideo, ExportEngine};
