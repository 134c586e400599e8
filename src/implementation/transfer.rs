//! Perceptual quantizer (SMPTE ST 2084) transfer functions.
//!
//! The EOTF maps normalized signal in `[0, 1]` to absolute luminance in
//! `[0, 10000]` cd/m²; the OETF is its right inverse. Out-of-range and
//! non-finite input collapses to the nearest edge so the pipeline can never
//! observe a poisoned transfer result.

use crate::implementation::numerics::{safe_div, safe_pow};

/// ST 2084 constant m1.
pub const PQ_M1: f32 = 0.159_301_757_812_5;
/// ST 2084 constant m2.
pub const PQ_M2: f32 = 78.84375;
/// ST 2084 constant c1.
pub const PQ_C1: f32 = 0.8359375;
/// ST 2084 constant c2.
pub const PQ_C2: f32 = 18.8515625;
/// ST 2084 constant c3.
pub const PQ_C3: f32 = 18.6875;
/// Peak luminance of the PQ encoding in cd/m².
pub const PQ_PEAK_NITS: f32 = 10_000.0;

/// PQ EOTF: normalized signal to absolute luminance in cd/m².
///
/// `pq_eotf(0) = 0`, `pq_eotf(x >= 1) = 10000`, non-finite input maps to 0.
#[must_use]
pub fn pq_eotf(signal: f32) -> f32 {
    if !signal.is_finite() || signal <= 0.0 {
        return 0.0;
    }
    if signal >= 1.0 {
        return PQ_PEAK_NITS;
    }
    let p = safe_pow(signal, 1.0 / PQ_M2, 0.0);
    let num = (p - PQ_C1).max(0.0);
    let den = PQ_C2 - PQ_C3 * p;
    PQ_PEAK_NITS * safe_pow(safe_div(num, den, 0.0), 1.0 / PQ_M1, 0.0)
}

/// PQ OETF: absolute luminance in cd/m² to normalized signal.
///
/// Right inverse of [`pq_eotf`] with the same edge behavior.
#[must_use]
pub fn pq_oetf(nits: f32) -> f32 {
    if !nits.is_finite() || nits <= 0.0 {
        return 0.0;
    }
    if nits >= PQ_PEAK_NITS {
        return 1.0;
    }
    let y = safe_pow(nits / PQ_PEAK_NITS, PQ_M1, 0.0);
    safe_pow((PQ_C1 + PQ_C2 * y) / (1.0 + PQ_C3 * y), PQ_M2, 0.0)
}

/// PQ EOTF on the normalized scale: signal to linear light with 1.0 = peak.
#[must_use]
pub fn pq_eotf_norm(signal: f32) -> f32 {
    pq_eotf(signal) / PQ_PEAK_NITS
}

/// PQ OETF on the normalized scale: linear light with 1.0 = peak to signal.
#[must_use]
pub fn pq_oetf_norm(linear: f32) -> f32 {
    pq_oetf(linear * PQ_PEAK_NITS)
}

/// Per-channel normalized EOTF.
#[must_use]
pub fn pq_eotf_rgb(rgb: [f32; 3]) -> [f32; 3] {
    [pq_eotf_norm(rgb[0]), pq_eotf_norm(rgb[1]), pq_eotf_norm(rgb[2])]
}

/// Per-channel normalized OETF.
#[must_use]
pub fn pq_oetf_rgb(rgb: [f32; 3]) -> [f32; 3] {
    [pq_oetf_norm(rgb[0]), pq_oetf_norm(rgb[1]), pq_oetf_norm(rgb[2])]
}
