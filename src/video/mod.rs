//! # Video Module
//!
//! Source-video inspection. The recording subsystem is an external process;
//! this crate consumes only a finished, readable video file and performs its
//! own readability and track checks here.

pub mod probe;

pub use probe::{probe, VideoMetadata, FALLBACK_FPS};
