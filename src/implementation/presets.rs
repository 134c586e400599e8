//! Factory parameter presets.
//!
//! The default set mirrors the grading starting points shipped with the
//! engine. Every preset satisfies the range table and passes the curve
//! self-checks.

use crate::types::{CurveKind, ToneParams};

/// A named parameter bundle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Preset {
    /// Display name.
    pub name:   &'static str,
    /// Parameter bundle.
    pub params: ToneParams,
}

/// Neutral PPR look with a soft shoulder, close to a straight pass-through.
#[must_use]
pub fn cinema_flat() -> ToneParams {
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

/// The default bundle under its catalog name.
#[must_use]
pub fn cinema_standard() -> ToneParams {
    ToneParams::default()
}

/// Deeper shadows, harder shoulder, lifted color.
#[must_use]
pub fn cinema_punchy() -> ToneParams {
    ToneParams {
        curve: CurveKind::Ppr,
        gamma_s: 1.45,
        gamma_h: 1.25,
        shoulder_h: 2.2,
        highlight_detail: 0.35,
        sat_base: 1.15,
        sat_hi: 1.05,
        ..Default::default()
    }
}

/// RLOG look for broadcast-style log material.
#[must_use]
pub fn broadcast_log() -> ToneParams {
    ToneParams {
        curve: CurveKind::Rlog,
        rlog_a: 8.0,
        rlog_b: 1.0,
        rlog_c: 1.5,
        rlog_t: 0.55,
        highlight_detail: 0.15,
        ..Default::default()
    }
}

/// Conservative archive pass: no detail, no saturation shaping.
#[must_use]
pub fn archive_neutral() -> ToneParams {
    ToneParams {
        curve: CurveKind::Ppr,
        gamma_s: 1.0,
        gamma_h: 1.0,
        shoulder_h: 0.5,
        highlight_detail: 0.0,
        sat_base: 1.0,
        sat_hi: 1.0,
        ..Default::default()
    }
}

/// Returns the default preset set.
#[must_use]
pub fn default_set() -> Vec<Preset> {
    vec![
        Preset { name: "Cinema Flat", params: cinema_flat() },
        Preset { name: "Cinema Standard", params: cinema_standard() },
        Preset { name: "Cinema Punchy", params: cinema_punchy() },
        Preset { name: "Broadcast Log", params: broadcast_log() },
        Preset { name: "Archive Neutral", params: archive_neutral() },
    ]
}

/// Looks up a preset by name, case-insensitively.
#[must_use]
pub fn find(name: &str) -> Option<Preset> {
    default_set()
        .into_iter()
        .find(|p| p.name.eq_ignore_ascii_case(name))
}
