//! Perceptual saturation shaping in OKLab.
//!
//! Base saturation scales chroma globally; highlight saturation re-targets
//! chroma above the tone pivot, weighted by the working-domain MaxRGB so the
//! transition follows the luminance structure of the frame. Lightness is
//! never modified. DCI compliance trims the highlight target by 7.5 percent.

use crate::implementation::numerics::{max_rgb, mix, saturate, smoothstep};
use crate::implementation::oklab::{linear_rgb_to_oklab, oklab_to_linear_rgb};
use crate::implementation::transfer::{pq_eotf_rgb, pq_oetf_rgb};

/// Highlight saturation multiplier applied under DCI compliance.
const DCI_HIGHLIGHT_TRIM: f32 = 0.925;

/// Compiled saturation stage.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SaturationStage {
    sat_base: f32,
    sat_hi:   f32,
    pivot:    f32,
}

impl SaturationStage {
    /// Builds the stage from bundle fields.
    ///
    /// `dci_compliance` applies the conservative highlight trim up front so
    /// the per-pixel path stays branch-free.
    #[must_use]
    pub fn new(sat_base: f32, sat_hi: f32, pivot: f32, dci_compliance: bool) -> Self {
        let sat_hi = if dci_compliance { sat_hi * DCI_HIGHLIGHT_TRIM } else { sat_hi };
        Self { sat_base, sat_hi, pivot }
    }

    /// Returns whether the stage is a no-op.
    #[must_use]
    pub fn is_neutral(&self) -> bool {
        (self.sat_base - 1.0).abs() < f32::EPSILON && (self.sat_hi - 1.0).abs() < f32::EPSILON
    }

    /// Applies saturation to one working-domain (PQ-encoded) pixel.
    #[must_use]
    pub fn apply(&self, rgb_pq: [f32; 3]) -> [f32; 3] {
        if self.is_neutral() {
            return rgb_pq;
        }

        // Highlight weight comes from the encoded MaxRGB, the same proxy the
        // tone stage used.
        let lum = max_rgb(rgb_pq);
        let w = smoothstep(self.pivot, 1.0, lum);

        let linear = pq_eotf_rgb(rgb_pq);
        let [l, a, b] = linear_rgb_to_oklab(linear);

        let a = a * self.sat_base;
        let b = b * self.sat_base;
        let a = mix(a, a * self.sat_hi, w);
        let b = mix(b, b * self.sat_hi, w);

        let shaped = oklab_to_linear_rgb([l, a, b]);
        let out = pq_oetf_rgb([
            shaped[0].max(0.0),
            shaped[1].max(0.0),
            shaped[2].max(0.0),
        ]);
        [saturate(out[0]), saturate(out[1]), saturate(out[2])]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::numerics::is_finite3;

    #[test]
    fn test_neutral_stage_is_identity() {
        let stage = SaturationStage::new(1.0, 1.0, 0.18, false);
        assert!(stage.is_neutral());
        let px = [0.6, 0.3, 0.2];
        assert_eq!(stage.apply(px), px);
    }

    #[test]
    fn test_gray_stays_gray() {
        let stage = SaturationStage::new(1.5, 0.8, 0.18, false);
        let out = stage.apply([0.5, 0.5, 0.5]);
        assert!((out[0] - out[1]).abs() < 1e-3);
        assert!((out[1] - out[2]).abs() < 1e-3);
    }

    #[test]
    fn test_desaturation_pulls_toward_gray() {
        let stage = SaturationStage::new(0.0, 1.0, 0.18, false);
        let out = stage.apply([0.6, 0.3, 0.3]);
        // Chroma removed entirely; channels collapse to the gray axis.
        assert!((out[0] - out[1]).abs() < 1e-2);
        assert!((out[1] - out[2]).abs() < 1e-2);
    }

    #[test]
    fn test_boost_increases_spread() {
        let stage = SaturationStage::new(1.6, 1.0, 0.18, false);
        let px = [0.55, 0.35, 0.30];
        let out = stage.apply(px);
        let spread_in = px[0] - px[2];
        let spread_out = out[0] - out[2];
        assert!(spread_out > spread_in, "{spread_out} <= {spread_in}");
        assert!(is_finite3(out));
    }

    #[test]
    fn test_highlight_weight_only_above_pivot() {
        // Below the pivot the highlight term has zero weight, so two stages
        // differing only in sat_hi agree on dark pixels.
        let a = SaturationStage::new(1.2, 0.5, 0.30, false);
        let b = SaturationStage::new(1.2, 1.8, 0.30, false);
        let dark = [0.15, 0.10, 0.08];
        let out_a = a.apply(dark);
        let out_b = b.apply(dark);
        for c in 0..3 {
            assert!((out_a[c] - out_b[c]).abs() < 1e-5);
        }
    }

    #[test]
    fn test_dci_trim_reduces_highlight_chroma() {
        let plain = SaturationStage::new(1.0, 1.2, 0.18, false);
        let dci = SaturationStage::new(1.0, 1.2, 0.18, true);
        let bright = [0.9, 0.6, 0.5];
        let out_plain = plain.apply(bright);
        let out_dci = dci.apply(bright);
        let spread_plain = out_plain[0] - out_plain[2];
        let spread_dci = out_dci[0] - out_dci[2];
        assert!(spread_dci < spread_plain + 1e-6);
    }

    #[test]
    fn test_output_in_range() {
        let stage = SaturationStage::new(2.0, 2.0, 0.05, false);
        for px in [[1.0, 0.0, 0.0], [0.9, 0.9, 0.1], [0.2, 0.8, 0.9]] {
            let out = stage.apply(px);
            for c in out {
                assert!((0.0..=1.0).contains(&c));
            }
        }
    }
}
