//! Artistic parameter bundle and its validation rules.
//!
//! The bundle is a flat record; every numeric field has a fixed admissible
//! range. Hosts deliver bundles as JSON with exactly the recognized options,
//! unknown fields are rejected. A bundle is cloned into the pipeline at
//! initialization and treated as immutable afterwards.

use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult, ErrorCode};

/// Tone curve selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CurveKind {
    /// Pivoted Power-Rational.
    #[default]
    Ppr,
    /// Rational Logarithmic.
    Rlog,
}

impl CurveKind {
    /// Returns the curve name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Ppr => "PPR",
            Self::Rlog => "RLOG",
        }
    }
}

/// Admissible range for a numeric parameter field.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    /// Field name as it appears in the bundle.
    pub field: &'static str,
    /// Inclusive lower bound.
    pub min:   f32,
    /// Inclusive upper bound.
    pub max:   f32,
}

impl ParamRange {
    /// Returns the midpoint of the range, used for sentinel recovery.
    #[must_use]
    pub const fn midpoint(&self) -> f32 {
        (self.min + self.max) * 0.5
    }

    /// Returns whether a finite value lies inside the range.
    #[must_use]
    pub fn contains(&self, value: f32) -> bool {
        value.is_finite() && value >= self.min && value <= self.max
    }
}

/// A correction applied by [`ToneParams::validate_and_correct`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Correction {
    /// Corrected field name.
    pub field: &'static str,
    /// Value found before correction.
    pub value: f32,
    /// Diagnostic code classifying the violation.
    pub code:  ErrorCode,
}

/// The artistic parameter bundle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ToneParams {
    /// Which tone curve to evaluate.
    pub curve:            CurveKind,
    /// Mid-gray pivot in the PQ-normalized domain.
    pub pivot_pq:         f32,
    /// PPR shadow exponent.
    pub gamma_s:          f32,
    /// PPR highlight exponent.
    pub gamma_h:          f32,
    /// PPR highlight denominator.
    pub shoulder_h:       f32,
    /// RLOG shadow log slope.
    pub rlog_a:           f32,
    /// RLOG highlight numerator.
    pub rlog_b:           f32,
    /// RLOG highlight denominator.
    pub rlog_c:           f32,
    /// RLOG splice threshold.
    pub rlog_t:           f32,
    /// Soft-knee onset.
    pub yknee:            f32,
    /// Soft-knee strength.
    pub alpha:            f32,
    /// Black-lift floor.
    pub toe:              f32,
    /// Pre-toe dark lift.
    pub black_lift:       f32,
    /// Unsharp-mask intensity for highlight detail.
    pub highlight_detail: f32,
    /// Global saturation in OKLab.
    pub sat_base:         f32,
    /// Highlight saturation in OKLab.
    pub sat_hi:           f32,
    /// Perceptual clamp always on, conservative highlight-saturation trim.
    pub dci_compliance:   bool,
    /// Disable fused and approximated paths, fixed reduction order.
    pub deterministic:    bool,
}

impl Default for ToneParams {
    fn default() -> Self {
        Self {
            curve:            CurveKind::Ppr,
            pivot_pq:         0.18,
            gamma_s:          1.25,
            gamma_h:          1.10,
            shoulder_h:       1.5,
            rlog_a:           8.0,
            rlog_b:           1.0,
            rlog_c:           1.5,
            rlog_t:           0.55,
            yknee:            0.97,
            alpha:            0.6,
            toe:              0.002,
            black_lift:       0.002,
            highlight_detail: 0.2,
            sat_base:         1.0,
            sat_hi:           0.95,
            dci_compliance:   false,
            deterministic:    false,
        }
    }
}

impl ToneParams {
    /// Range of `pivot_pq`.
    pub const PIVOT_PQ: ParamRange = ParamRange { field: "pivot_pq", min: 0.05, max: 0.30 };
    /// Range of `gamma_s`.
    pub const GAMMA_S: ParamRange = ParamRange { field: "gamma_s", min: 1.0, max: 1.6 };
    /// Range of `gamma_h`.
    pub const GAMMA_H: ParamRange = ParamRange { field: "gamma_h", min: 0.8, max: 1.4 };
    /// Range of `shoulder_h`.
    pub const SHOULDER_H: ParamRange = ParamRange { field: "shoulder_h", min: 0.5, max: 3.0 };
    /// Range of `rlog_a`.
    pub const RLOG_A: ParamRange = ParamRange { field: "rlog_a", min: 1.0, max: 16.0 };
    /// Range of `rlog_b`.
    pub const RLOG_B: ParamRange = ParamRange { field: "rlog_b", min: 0.8, max: 1.2 };
    /// Range of `rlog_c`.
    pub const RLOG_C: ParamRange = ParamRange { field: "rlog_c", min: 0.5, max: 3.0 };
    /// Range of `rlog_t`.
    pub const RLOG_T: ParamRange = ParamRange { field: "rlog_t", min: 0.4, max: 0.7 };
    /// Range of `yknee`.
    pub const YKNEE: ParamRange = ParamRange { field: "yknee", min: 0.95, max: 0.99 };
    /// Range of `alpha`.
    pub const ALPHA: ParamRange = ParamRange { field: "alpha", min: 0.2, max: 1.0 };
    /// Range of `toe`.
    pub const TOE: ParamRange = ParamRange { field: "toe", min: 0.0, max: 0.01 };
    /// Range of `black_lift`.
    pub const BLACK_LIFT: ParamRange = ParamRange { field: "black_lift", min: 0.0, max: 0.02 };
    /// Range of `highlight_detail`.
    pub const HIGHLIGHT_DETAIL: ParamRange =
        ParamRange { field: "highlight_detail", min: 0.0, max: 1.0 };
    /// Range of `sat_base`.
    pub const SAT_BASE: ParamRange = ParamRange { field: "sat_base", min: 0.0, max: 2.0 };
    /// Range of `sat_hi`.
    pub const SAT_HI: ParamRange = ParamRange { field: "sat_hi", min: 0.0, max: 2.0 };

    /// Parses a bundle from JSON, rejecting unknown fields.
    pub fn from_json(text: &str) -> EngineResult<Self> {
        serde_json::from_str(text).map_err(|e| EngineError::schema(e.to_string()))
    }

    /// Serializes the bundle to JSON.
    pub fn to_json(&self) -> EngineResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| EngineError::schema(e.to_string()))
    }

    /// Returns the numeric fields paired with their ranges.
    fn fields(&self) -> [(f32, &'static ParamRange); 15] {
        [
            (self.pivot_pq, &Self::PIVOT_PQ),
            (self.gamma_s, &Self::GAMMA_S),
            (self.gamma_h, &Self::GAMMA_H),
            (self.shoulder_h, &Self::SHOULDER_H),
            (self.rlog_a, &Self::RLOG_A),
            (self.rlog_b, &Self::RLOG_B),
            (self.rlog_c, &Self::RLOG_C),
            (self.rlog_t, &Self::RLOG_T),
            (self.yknee, &Self::YKNEE),
            (self.alpha, &Self::ALPHA),
            (self.toe, &Self::TOE),
            (self.black_lift, &Self::BLACK_LIFT),
            (self.highlight_detail, &Self::HIGHLIGHT_DETAIL),
            (self.sat_base, &Self::SAT_BASE),
            (self.sat_hi, &Self::SAT_HI),
        ]
    }

    /// Returns whether every field is finite and within range.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.fields().iter().all(|(v, r)| r.contains(*v))
    }

    /// Replaces out-of-range or non-finite fields with the range midpoint.
    pub fn clamp_to_valid(&mut self) {
        let _ = self.validate_and_correct();
    }

    /// Validates the bundle and corrects every offending field.
    ///
    /// Out-of-range and non-finite values are replaced with the midpoint of
    /// the admissible range. Returns one correction per repaired field; an
    /// empty result means the bundle was already valid.
    pub fn validate_and_correct(&mut self) -> Vec<Correction> {
        let mut fixes = Vec::new();
        correct(&mut self.pivot_pq, &Self::PIVOT_PQ, ErrorCode::RangePivot, &mut fixes);
        correct(&mut self.gamma_s, &Self::GAMMA_S, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.gamma_h, &Self::GAMMA_H, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.shoulder_h, &Self::SHOULDER_H, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.rlog_a, &Self::RLOG_A, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.rlog_b, &Self::RLOG_B, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.rlog_c, &Self::RLOG_C, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.rlog_t, &Self::RLOG_T, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.yknee, &Self::YKNEE, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.alpha, &Self::ALPHA, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.toe, &Self::TOE, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.black_lift, &Self::BLACK_LIFT, ErrorCode::RangeKnee, &mut fixes);
        correct(
            &mut self.highlight_detail,
            &Self::HIGHLIGHT_DETAIL,
            ErrorCode::RangeKnee,
            &mut fixes,
        );
        correct(&mut self.sat_base, &Self::SAT_BASE, ErrorCode::RangeKnee, &mut fixes);
        correct(&mut self.sat_hi, &Self::SAT_HI, ErrorCode::RangeKnee, &mut fixes);
        fixes
    }
}

fn correct(
    value: &mut f32,
    range: &'static ParamRange,
    code: ErrorCode,
    fixes: &mut Vec<Correction>,
) {
    if range.contains(*value) {
        return;
    }
    let code = if value.is_finite() { code } else { ErrorCode::NanInf };
    fixes.push(Correction { field: range.field, value: *value, code });
    *value = range.midpoint();
}
