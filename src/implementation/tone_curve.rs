//! Analytic tone curves.
//!
//! Two evaluators operate on the PQ-normalized luminance proxy:
//!
//! - PPR (Pivoted Power-Rational): a power law in the shadows and a rational
//!   shoulder in the highlights, blended over a narrow window around the
//!   mid-gray pivot. Each segment is pinned to exactly the pivot value on its
//!   off side, which keeps the blend monotonic for every admissible bundle.
//! - RLOG (Rational Logarithmic): logarithmic shadows spliced onto a rescaled
//!   rational highlight branch at a threshold, with the same smoothstep
//!   window treatment.
//!
//! Both finish with a soft knee near white, a toe floor near black, and a
//! final range clamp. A compiled curve is immutable and cheap to copy.

use crate::implementation::numerics::{mix, safe_div, safe_log, safe_pow, saturate, smoothstep};
use crate::types::{CurveKind, ToneParams};

/// Blend half-width around the PPR pivot, as a fraction of the pivot.
const PPR_BLEND_FRACTION: f32 = 0.1;
/// Splice half-width around the RLOG threshold.
const RLOG_SPLICE_HALF_WIDTH: f32 = 0.05;

/// Entries in the acceleration table.
const LUT_SIZE: usize = 4096;

/// Uniform sample count for the monotonicity sweep.
const UNIFORM_SAMPLES: usize = 4096;
/// Focused sample count around the pivot or splice threshold.
const FOCUS_SAMPLES: usize = 256;
/// Step used for one-sided derivative estimates at the segment knots.
const DERIVATIVE_EPS: f32 = 1e-4;
/// Largest tolerated derivative gap at a knot, sized for f32 arithmetic.
const DERIVATIVE_GAP_LIMIT: f32 = 2e-2;

/// Result of the curve self-check.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CurveValidation {
    /// No decrease found on the sampled grid.
    pub monotonic:          bool,
    /// Derivative gaps at the segment knots stayed under the limit.
    pub c1_continuous:      bool,
    /// Largest derivative gap observed.
    pub max_derivative_gap: f32,
}

impl CurveValidation {
    /// Returns whether both checks passed.
    #[must_use]
    pub const fn passed(&self) -> bool {
        self.monotonic && self.c1_continuous
    }
}

/// A compiled tone curve.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ToneCurve {
    kind:       CurveKind,
    pivot:      f32,
    gamma_s:    f32,
    gamma_h:    f32,
    shoulder_h: f32,
    rlog_a:     f32,
    rlog_b:     f32,
    rlog_c:     f32,
    rlog_t:     f32,
    rlog_scale: f32,
    yknee:      f32,
    alpha:      f32,
    toe:        f32,
    black_lift: f32,
}

impl ToneCurve {
    /// Compiles a curve from a validated parameter bundle.
    ///
    /// The RLOG continuity scale is fixed here so both branches agree at the
    /// splice threshold; a degenerate highlight denominator falls back to 1.
    #[must_use]
    pub fn compile(params: &ToneParams) -> Self {
        let mut curve = Self {
            kind:       params.curve,
            pivot:      params.pivot_pq,
            gamma_s:    params.gamma_s,
            gamma_h:    params.gamma_h,
            shoulder_h: params.shoulder_h,
            rlog_a:     params.rlog_a,
            rlog_b:     params.rlog_b,
            rlog_c:     params.rlog_c,
            rlog_t:     params.rlog_t,
            rlog_scale: 1.0,
            yknee:      params.yknee,
            alpha:      params.alpha,
            toe:        params.toe,
            black_lift: params.black_lift,
        };
        let raw = curve.rlog_highlight_raw(curve.rlog_t);
        let scale = safe_div(curve.rlog_dark(curve.rlog_t), raw, 1.0);
        curve.rlog_scale = if scale > 0.0 { scale } else { 1.0 };
        curve
    }

    /// Returns the curve kind.
    #[must_use]
    pub const fn kind(&self) -> CurveKind {
        self.kind
    }

    /// Evaluates the curve at a PQ-normalized luminance.
    ///
    /// Input is clamped to `[0, 1]`; non-finite input returns 0. The output
    /// is always inside `[0, 1]` and `apply(0) = 0`.
    #[must_use]
    pub fn apply(&self, x: f32) -> f32 {
        if !x.is_finite() {
            return 0.0;
        }
        let x = x.clamp(0.0, 1.0);
        if x <= 0.0 {
            return 0.0;
        }
        let x = self.black_lift + (1.0 - self.black_lift) * x;
        let y = match self.kind {
            CurveKind::Ppr => self.ppr(x),
            CurveKind::Rlog => self.rlog(x),
        };
        let y = self.soft_knee(y);
        let y = self.toe_clamp(y);
        saturate(y)
    }

    fn ppr_shadow(&self, x: f32) -> f32 {
        if x >= self.pivot {
            return self.pivot;
        }
        self.pivot * safe_pow(safe_div(x, self.pivot, 0.0), self.gamma_s, 0.0)
    }

    fn ppr_highlight(&self, x: f32) -> f32 {
        if x <= self.pivot {
            return self.pivot;
        }
        let u = safe_div(x - self.pivot, 1.0 - self.pivot, 0.0);
        let v = safe_div(u, 1.0 + self.shoulder_h * u, 0.0);
        self.pivot + safe_pow(v, self.gamma_h, 0.0) * (1.0 - self.pivot)
    }

    fn ppr(&self, x: f32) -> f32 {
        let delta = PPR_BLEND_FRACTION * self.pivot;
        if x <= self.pivot - delta {
            return self.ppr_shadow(x);
        }
        if x >= self.pivot + delta {
            return self.ppr_highlight(x);
        }
        let w = smoothstep(self.pivot - delta, self.pivot + delta, x);
        mix(self.ppr_shadow(x), self.ppr_highlight(x), w)
    }

    fn rlog_dark(&self, x: f32) -> f32 {
        safe_div(
            safe_log(1.0 + self.rlog_a * x, 0.0),
            safe_log(1.0 + self.rlog_a, 1.0),
            0.0,
        )
    }

    fn rlog_highlight_raw(&self, x: f32) -> f32 {
        safe_div(self.rlog_b * x, 1.0 + self.rlog_c * x, 0.0)
    }

    fn rlog(&self, x: f32) -> f32 {
        let t = self.rlog_t;
        if x <= t - RLOG_SPLICE_HALF_WIDTH {
            return self.rlog_dark(x);
        }
        if x >= t + RLOG_SPLICE_HALF_WIDTH {
            return self.rlog_scale * self.rlog_highlight_raw(x);
        }
        let w = smoothstep(t - RLOG_SPLICE_HALF_WIDTH, t + RLOG_SPLICE_HALF_WIDTH, x);
        mix(
            self.rlog_dark(x),
            self.rlog_scale * self.rlog_highlight_raw(x),
            w,
        )
    }

    /// Compress-only knee above the onset; the output never reaches 1.
    fn soft_knee(&self, y: f32) -> f32 {
        if y <= self.yknee {
            return y;
        }
        let max_excess = 1.0 - self.yknee;
        let n = safe_div(y - self.yknee, max_excess, 0.0);
        self.yknee + max_excess * safe_div(n, 1.0 + self.alpha * n, 0.0)
    }

    /// Floor for positive output; zero stays exactly zero.
    fn toe_clamp(&self, y: f32) -> f32 {
        if y > 0.0 { y.max(self.toe) } else { y }
    }

    /// Focused sample window for the validators.
    fn focus_window(&self) -> (f32, f32) {
        match self.kind {
            CurveKind::Ppr => (self.pivot * 0.95, self.pivot * 1.05),
            CurveKind::Rlog => (self.rlog_t * 0.90, self.rlog_t * 1.10),
        }
    }

    /// Interior knots where the evaluator switches formulas.
    fn knots(&self) -> Vec<f32> {
        match self.kind {
            CurveKind::Ppr => {
                let delta = PPR_BLEND_FRACTION * self.pivot;
                vec![self.pivot - delta, self.pivot + delta]
            }
            CurveKind::Rlog => vec![
                self.rlog_t - RLOG_SPLICE_HALF_WIDTH,
                self.rlog_t,
                self.rlog_t + RLOG_SPLICE_HALF_WIDTH,
            ],
        }
    }

    /// Runs the monotonicity and derivative-continuity self-checks.
    ///
    /// Monotonicity sweeps 4096 uniform samples plus 256 samples focused on
    /// the blend window; a single decrease fails the check. The derivative
    /// gap is estimated at the evaluator's interior knots with one-sided
    /// differences.
    #[must_use]
    pub fn validate(&self) -> CurveValidation {
        let monotonic = self.check_monotonic();
        let gap = self.max_derivative_gap();
        CurveValidation {
            monotonic,
            c1_continuous: gap <= DERIVATIVE_GAP_LIMIT,
            max_derivative_gap: gap,
        }
    }

    fn check_monotonic(&self) -> bool {
        let mut prev = self.apply(0.0);
        for i in 1..UNIFORM_SAMPLES {
            let x = i as f32 / (UNIFORM_SAMPLES - 1) as f32;
            let y = self.apply(x);
            if y < prev {
                return false;
            }
            prev = y;
        }

        let (lo, hi) = self.focus_window();
        let lo = lo.max(0.0);
        let hi = hi.min(1.0);
        let mut prev = self.apply(lo);
        for i in 1..FOCUS_SAMPLES {
            let x = lo + (hi - lo) * i as f32 / (FOCUS_SAMPLES - 1) as f32;
            let y = self.apply(x);
            if y < prev {
                return false;
            }
            prev = y;
        }
        true
    }

    fn max_derivative_gap(&self) -> f32 {
        let mut worst = 0.0f32;
        for k in self.knots() {
            if k - DERIVATIVE_EPS <= 0.0 || k + DERIVATIVE_EPS >= 1.0 {
                continue;
            }
            let left = (self.apply(k) - self.apply(k - DERIVATIVE_EPS)) / DERIVATIVE_EPS;
            let right = (self.apply(k + DERIVATIVE_EPS) - self.apply(k)) / DERIVATIVE_EPS;
            worst = worst.max((right - left).abs());
        }
        worst
    }
}

/// Sampled acceleration table over a compiled curve.
///
/// Lerp lookups trade a bounded approximation error for the per-pixel cost
/// of the analytic evaluator. The table inherits monotonicity from the
/// curve because linear interpolation of non-decreasing samples is
/// non-decreasing. Not used when the deterministic flag is set, which pins
/// the exact evaluation path.
#[derive(Debug, Clone)]
pub struct ToneLut {
    table: Vec<f32>,
}

impl ToneLut {
    /// Samples the curve into a lookup table.
    #[must_use]
    pub fn build(curve: &ToneCurve) -> Self {
        let mut table = Vec::with_capacity(LUT_SIZE);
        for i in 0..LUT_SIZE {
            table.push(curve.apply(i as f32 / (LUT_SIZE - 1) as f32));
        }
        Self { table }
    }

    /// Looks up the curve value with linear interpolation.
    ///
    /// Matches `ToneCurve::apply` edge behavior: input clamps to `[0, 1]`,
    /// non-finite input returns 0.
    #[must_use]
    pub fn lookup(&self, x: f32) -> f32 {
        if !x.is_finite() {
            return 0.0;
        }
        let pos = x.clamp(0.0, 1.0) * (LUT_SIZE - 1) as f32;
        let i = (pos as usize).min(LUT_SIZE - 2);
        let frac = pos - i as f32;
        self.table[i] + (self.table[i + 1] - self.table[i]) * frac
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cinema_flat() -> ToneParams {
        ToneParams {
            curve: CurveKind::Ppr,
            pivot_pq: 0.18,
            gamma_s: 1.10,
            gamma_h: 1.05,
            shoulder_h: 1.0,
            black_lift: 0.003,
            highlight_detail: 0.2,
            sat_base: 1.0,
            sat_hi: 0.95,
            ..Default::default()
        }
    }

    #[test]
    fn test_zero_maps_to_zero() {
        let ppr = ToneCurve::compile(&ToneParams::default());
        let rlog =
            ToneCurve::compile(&ToneParams { curve: CurveKind::Rlog, ..Default::default() });
        assert_eq!(ppr.apply(0.0), 0.0);
        assert_eq!(rlog.apply(0.0), 0.0);
    }

    #[test]
    fn test_non_finite_input_maps_to_zero() {
        let curve = ToneCurve::compile(&ToneParams::default());
        assert_eq!(curve.apply(f32::NAN), 0.0);
        assert_eq!(curve.apply(f32::INFINITY), 0.0);
        assert_eq!(curve.apply(f32::NEG_INFINITY), 0.0);
    }

    #[test]
    fn test_output_stays_in_unit_range() {
        for params in [
            ToneParams::default(),
            ToneParams { curve: CurveKind::Rlog, ..Default::default() },
            cinema_flat(),
        ] {
            let curve = ToneCurve::compile(&params);
            for i in 0..=2000 {
                let y = curve.apply(i as f32 / 2000.0);
                assert!((0.0..=1.0).contains(&y), "{y} escaped at {i}");
            }
        }
    }

    #[test]
    fn test_cinema_flat_midpoint_value() {
        // Highlight segment at x = 0.5 with the Cinema Flat bundle.
        let curve = ToneCurve::compile(&cinema_flat());
        assert!((curve.apply(0.5) - 0.3968).abs() < 1e-3);
    }

    #[test]
    fn test_default_curves_validate() {
        for params in [
            ToneParams::default(),
            ToneParams { curve: CurveKind::Rlog, ..Default::default() },
            cinema_flat(),
        ] {
            let report = ToneCurve::compile(&params).validate();
            assert!(report.monotonic, "monotonicity failed for {:?}", params.curve);
            assert!(
                report.c1_continuous,
                "derivative gap {} too large for {:?}",
                report.max_derivative_gap, params.curve
            );
        }
    }

    #[test]
    fn test_extreme_bundles_validate() {
        let corners = [
            ToneParams {
                pivot_pq: 0.05,
                gamma_s: 1.0,
                gamma_h: 1.4,
                shoulder_h: 3.0,
                ..Default::default()
            },
            ToneParams {
                pivot_pq: 0.30,
                gamma_s: 1.6,
                gamma_h: 0.8,
                shoulder_h: 0.5,
                yknee: 0.95,
                alpha: 1.0,
                toe: 0.01,
                black_lift: 0.02,
                ..Default::default()
            },
            ToneParams {
                curve: CurveKind::Rlog,
                rlog_a: 16.0,
                rlog_b: 1.2,
                rlog_c: 0.5,
                rlog_t: 0.7,
                ..Default::default()
            },
            ToneParams {
                curve: CurveKind::Rlog,
                rlog_a: 1.0,
                rlog_b: 0.8,
                rlog_c: 3.0,
                rlog_t: 0.4,
                ..Default::default()
            },
        ];
        for params in corners {
            let report = ToneCurve::compile(&params).validate();
            assert!(report.passed(), "{params:?} failed: {report:?}");
        }
    }

    #[test]
    fn test_rlog_splice_continuity() {
        let curve =
            ToneCurve::compile(&ToneParams { curve: CurveKind::Rlog, ..Default::default() });
        let t = 0.55;
        let step = 1e-4;
        assert!((curve.apply(t + step) - curve.apply(t - step)).abs() <= 1e-3);

        let eps = 1e-3;
        let left = (curve.apply(t) - curve.apply(t - eps)) / eps;
        let right = (curve.apply(t + eps) - curve.apply(t)) / eps;
        assert!((left - right).abs() <= 1e-2);
    }

    #[test]
    fn test_knee_keeps_output_below_one() {
        // The rescaled RLOG highlight branch exceeds the knee onset near
        // white; the knee must compress it without ever reaching 1.
        let curve =
            ToneCurve::compile(&ToneParams { curve: CurveKind::Rlog, ..Default::default() });
        let y = curve.apply(1.0);
        assert!(y > 0.97);
        assert!(y < 1.0);
    }

    #[test]
    fn test_knee_only_compresses() {
        let curve =
            ToneCurve::compile(&ToneParams { curve: CurveKind::Rlog, ..Default::default() });
        for i in 0..=100 {
            let y = i as f32 / 100.0;
            let kneed = curve.soft_knee(y);
            assert!(kneed <= y + 1e-7, "knee expanded {y} to {kneed}");
            assert!(kneed < 1.0);
        }
    }

    #[test]
    fn test_toe_floor() {
        let curve = ToneCurve::compile(&ToneParams::default());
        // Deep shadows land on the toe floor, zero stays zero.
        assert!((curve.apply(1e-4) - 0.002).abs() < 1e-6);
        assert_eq!(curve.apply(0.0), 0.0);
    }

    #[test]
    fn test_pivot_preserved_through_blend() {
        // Both segments pin to the pivot value, so the blended curve passes
        // close to (p, p) before knee and toe adjustments.
        let params = ToneParams { black_lift: 0.0, ..Default::default() };
        let curve = ToneCurve::compile(&params);
        assert!((curve.apply(0.18) - 0.18).abs() < 5e-3);
    }

    #[test]
    fn test_lut_tracks_curve() {
        for params in [
            ToneParams::default(),
            ToneParams { curve: CurveKind::Rlog, ..Default::default() },
        ] {
            let curve = ToneCurve::compile(&params);
            let lut = ToneLut::build(&curve);
            for i in 0..=10_000 {
                let x = i as f32 / 10_000.0;
                let exact = curve.apply(x);
                let fast = lut.lookup(x);
                assert!(
                    (exact - fast).abs() < 5e-4,
                    "lut drift {} at {x} for {:?}",
                    (exact - fast).abs(),
                    params.curve
                );
            }
            assert_eq!(lut.lookup(f32::NAN), 0.0);
            assert_eq!(lut.lookup(0.0), curve.apply(0.0));
            assert!((lut.lookup(1.0) - curve.apply(1.0)).abs() < 1e-6);
        }
    }

    #[test]
    fn test_lut_monotone() {
        let curve = ToneCurve::compile(&ToneParams::default());
        let lut = ToneLut::build(&curve);
        let mut prev = lut.lookup(0.0);
        for i in 1..=5000 {
            let y = lut.lookup(i as f32 / 5000.0);
            assert!(y >= prev);
            prev = y;
        }
    }

    #[test]
    fn test_parameter_grid_validates() {
        // Range-corner sweep: every combination of the extreme and default
        // values must stay monotone and keep the knot derivative gap small.
        for &pivot in &[0.05, 0.18, 0.30] {
            for &gs in &[1.0, 1.25, 1.6] {
                for &gh in &[0.8, 1.1, 1.4] {
                    for &h in &[0.5, 1.5, 3.0] {
                        let params = ToneParams {
                            pivot_pq: pivot,
                            gamma_s: gs,
                            gamma_h: gh,
                            shoulder_h: h,
                            ..Default::default()
                        };
                        let report = ToneCurve::compile(&params).validate();
                        assert!(
                            report.passed(),
                            "p={pivot} gs={gs} gh={gh} h={h}: {report:?}"
                        );
                    }
                }
            }
        }
        for &a in &[1.0, 8.0, 16.0] {
            for &c in &[0.5, 1.5, 3.0] {
                for &t in &[0.4, 0.55, 0.7] {
                    let params = ToneParams {
                        curve: CurveKind::Rlog,
                        rlog_a: a,
                        rlog_c: c,
                        rlog_t: t,
                        ..Default::default()
                    };
                    let report = ToneCurve::compile(&params).validate();
                    assert!(report.passed(), "a={a} c={c} t={t}: {report:?}");
                }
            }
        }
    }

    #[test]
    fn test_rlog_continuity_scale_positive() {
        let params = ToneParams { curve: CurveKind::Rlog, ..Default::default() };
        let curve = ToneCurve::compile(&params);
        assert!(curve.rlog_scale.is_finite());
        assert!(curve.rlog_scale > 0.0);
    }
}
