//! OKLab conversions for perceptual saturation and gamut work.
//!
//! Uses the published linear-RGB to LMS matrices with a sign-preserving cube
//! root so that slightly negative scene-referred channels survive the trip.
//! Chroma lives in the `a` and `b` channels; scaling them changes saturation
//! without touching perceived lightness `L`.

use crate::implementation::numerics::is_finite3;

/// Sign-preserving cube root: `sign(x) * |x|^(1/3)`.
///
/// Non-finite input maps to 0.
#[must_use]
pub fn cbrt_signed(x: f32) -> f32 {
    if !x.is_finite() {
        return 0.0;
    }
    if x == 0.0 {
        return 0.0;
    }
    x.signum() * x.abs().cbrt()
}

/// Converts linear RGB to OKLab.
///
/// Inputs failing the finiteness check yield `(0, 0, 0)`.
#[must_use]
pub fn linear_rgb_to_oklab(rgb: [f32; 3]) -> [f32; 3] {
    if !is_finite3(rgb) {
        return [0.0, 0.0, 0.0];
    }
    let [r, g, b] = rgb;

    let l = 0.4122214708 * r + 0.5363325363 * g + 0.0514459929 * b;
    let m = 0.2119034982 * r + 0.6806995451 * g + 0.1073969566 * b;
    let s = 0.0883024619 * r + 0.2817188376 * g + 0.6299787005 * b;

    let l_ = cbrt_signed(l);
    let m_ = cbrt_signed(m);
    let s_ = cbrt_signed(s);

    [
        0.2104542553 * l_ + 0.7936177850 * m_ - 0.0040720468 * s_,
        1.9779984951 * l_ - 2.4285922050 * m_ + 0.4505937099 * s_,
        0.0259040371 * l_ + 0.7827717662 * m_ - 0.8086757660 * s_,
    ]
}

/// Converts OKLab back to linear RGB using the signed cube.
///
/// Inputs failing the finiteness check yield `(0, 0, 0)`.
#[must_use]
pub fn oklab_to_linear_rgb(lab: [f32; 3]) -> [f32; 3] {
    if !is_finite3(lab) {
        return [0.0, 0.0, 0.0];
    }
    let [l, a, b] = lab;

    let l_ = l + 0.3963377774 * a + 0.2158037573 * b;
    let m_ = l - 0.1055613458 * a - 0.0638541728 * b;
    let s_ = l - 0.0894841775 * a - 1.2914855480 * b;

    let lc = l_ * l_ * l_;
    let mc = m_ * m_ * m_;
    let sc = s_ * s_ * s_;

    [
        4.0767416621 * lc - 3.3077115913 * mc + 0.2309699292 * sc,
        -1.2684380046 * lc + 2.6097574011 * mc - 0.3413193965 * sc,
        -0.0041960863 * lc - 0.7034186147 * mc + 1.7076147010 * sc,
    ]
}
