//! Utility modules shared across the engine.

pub mod minify;
pub mod path;
