//! Engine configuration.

use crate::types::ColorSpace;

/// Configuration for the HDR engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EngineConfig {
    /// Frame rate of the incoming material, used by the temporal checks.
    pub frame_rate:   f32,
    /// Color space of emitted frames.
    pub output_space: ColorSpace,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            frame_rate:   24.0,
            output_space: ColorSpace::Bt2020Pq,
        }
    }
}

impl EngineConfig {
    /// Returns a config targeting the given output space.
    #[must_use]
    pub fn for_output(output_space: ColorSpace) -> Self {
        Self { output_space, ..Default::default() }
    }
}
