//! # Live Preview Module
//!
//! The interactive analogue of the export pipeline's geometry stages,
//! re-executed on every parameter change, without trimming or encoding.

pub mod renderer;

pub use renderer::{PreviewLayout, PreviewRenderer};
