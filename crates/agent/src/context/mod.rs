//! Per-step context for the reasoning engine.
//!
//! Memory is compressed before every reasoning call, identifiers are
//! harvested from everything the agent reads, and the ephemeral context note
//! is rebuilt from both each step.

pub mod compressor;
pub mod ids;

pub use compressor::{CompressorLimits, compress, compress_with};
pub use ids::{SeenIds, extract_ids};
