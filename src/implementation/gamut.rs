//! Two-stage gamut handling at the working-domain exit.
//!
//! Stage 1 is a hue-preserving linear compression: the pixel is scaled down
//! along the achromatic axis when its MaxRGB exceeds the target ceiling, and
//! negative excursions are floored. Stage 2 is a perceptual clamp that walks
//! chroma toward the gray axis in OKLab until the pixel re-enters the target
//! box, holding lightness fixed. Stage 2 runs whenever DCI compliance is on
//! or stage 1 left the pixel outside the box.

use crate::implementation::numerics::{is_finite3, max_rgb};
use crate::implementation::oklab::{linear_rgb_to_oklab, oklab_to_linear_rgb};
use crate::types::ColorSpace;

/// Chroma shrink factor per perceptual iteration.
const CHROMA_STEP: f32 = 0.9;
/// Iteration budget for the perceptual clamp.
const MAX_ITERATIONS: usize = 10;
/// Containment slack for box tests.
const BOX_EPSILON: f32 = 1e-6;

/// Outcome of one gamut pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GamutOutcome {
    /// The pixel was outside the target box before processing.
    pub out_of_gamut: bool,
    /// The perceptual clamp ran.
    pub perceptual:   bool,
    /// The perceptual clamp needed the final coordinate clamp.
    pub clamped:      bool,
}

/// Gamut processor for a fixed target space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GamutProcessor {
    floor:   f32,
    ceiling: f32,
    dci:     bool,
}

impl GamutProcessor {
    /// Creates a processor targeting the given space.
    #[must_use]
    pub fn new(target: ColorSpace, dci_compliance: bool) -> Self {
        let (floor, ceiling) = target.gamut_range();
        Self { floor, ceiling, dci: dci_compliance }
    }

    fn inside(&self, rgb: [f32; 3]) -> bool {
        rgb.iter()
            .all(|&c| c >= self.floor - BOX_EPSILON && c <= self.ceiling + BOX_EPSILON)
    }

    fn clamp_to_box(&self, rgb: [f32; 3]) -> [f32; 3] {
        [
            rgb[0].clamp(self.floor, self.ceiling),
            rgb[1].clamp(self.floor, self.ceiling),
            rgb[2].clamp(self.floor, self.ceiling),
        ]
    }

    /// Runs both stages on a target-space linear pixel.
    ///
    /// The returned pixel is always inside the target box; the outcome flags
    /// report the original containment and whether the perceptual clamp had
    /// to fall back to a coordinate clamp.
    #[must_use]
    pub fn process(&self, rgb: [f32; 3]) -> ([f32; 3], GamutOutcome) {
        let mut outcome = GamutOutcome::default();
        if !is_finite3(rgb) {
            outcome.out_of_gamut = true;
            return ([0.0, 0.0, 0.0], outcome);
        }
        outcome.out_of_gamut = !self.inside(rgb);

        let compressed = self.linear_compress(rgb);

        if !self.dci && self.inside(compressed) {
            return (compressed, outcome);
        }

        outcome.perceptual = true;
        let (clamped, converged) = self.perceptual_clamp(compressed);
        outcome.clamped = !converged;
        (clamped, outcome)
    }

    /// Stage 1: scale along the achromatic axis, floor negatives.
    fn linear_compress(&self, rgb: [f32; 3]) -> [f32; 3] {
        let m = max_rgb(rgb);
        let scale = if m > self.ceiling { self.ceiling / m } else { 1.0 };
        [
            (rgb[0] * scale).max(self.floor),
            (rgb[1] * scale).max(self.floor),
            (rgb[2] * scale).max(self.floor),
        ]
    }

    /// Stage 2: iterative chroma walk in OKLab, lightness fixed.
    fn perceptual_clamp(&self, rgb: [f32; 3]) -> ([f32; 3], bool) {
        let [l, mut a, mut b] = linear_rgb_to_oklab(rgb);
        let mut last = rgb;
        for _ in 0..MAX_ITERATIONS {
            let candidate = oklab_to_linear_rgb([l, a, b]);
            last = candidate;
            if self.inside(candidate) {
                return (candidate, true);
            }
            a *= CHROMA_STEP;
            b *= CHROMA_STEP;
        }
        (self.clamp_to_box(last), false)
    }
}
