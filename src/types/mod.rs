//! Data model for the HDR engine.
//!
//! - `Frame` - dense row-major float RGB frames with a color space tag
//! - `ColorSpace` - host-facing color space tags
//! - `ToneParams` - the artistic parameter bundle and its range table
//! - `PipelineStats` - per-frame statistics snapshot

mod color;
mod frame;
mod params;
mod stats;

pub use color::ColorSpace;
pub use frame::{CHANNELS, Frame};
pub use params::{Correction, CurveKind, ParamRange, ToneParams};
pub use stats::{PipelineStats, TrimmedSummary};
