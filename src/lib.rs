//! # cinehdr
//!
//! Cinematic HDR tone-mapping and color-pipeline engine.
//!
//! ## Features
//!
//! - Analytic tone curves (PPR and RLOG) with monotonicity and
//!   derivative-continuity self-checks
//! - BT.2020 + PQ working domain with hue-preserving MaxRGB tone scaling
//! - Pivot-masked highlight detail with motion and flicker protection
//! - OKLab saturation shaping and two-stage gamut handling
//! - Three-tier fallback with throttled diagnostics

#![allow(clippy::must_use_candidate)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::cast_precision_loss)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::similar_names)]
#![allow(clippy::unreadable_literal)]
#![allow(clippy::float_cmp)]
#![allow(clippy::unnecessary_wraps)]
#![allow(clippy::too_many_lines)]

//! ## Architecture
//!
//! ```text
//! input frame (tagged color space)
//!       |
//!       v
//! to_working (BT.2020 + PQ normalized, non-finite pixels -> black)
//!       |
//!       v
//! tone curve on MaxRGB -> channel scale      (PPR | RLOG, knee, toe)
//!       |
//!       v
//! highlight detail (pivot mask, motion + flicker guards)
//!       |
//!       v
//! OKLab saturation (base + highlight, L fixed)
//!       |
//!       v
//! two-stage gamut (linear compression + perceptual clamp)
//!       |
//!       v
//! from_working (target space) -> output frame + statistics
//! ```

pub mod errors;
mod implementation;
mod types;

// Re-exports from errors
pub use errors::{
    EngineError, EngineResult, ErrorCode, ErrorRecord, FallbackAction, FallbackTier, Severity,
};
// Re-exports from implementation
pub use implementation::{
    AggregateReport, CurveValidation, DetailOutcome, EngineConfig, ErrorCallback, ErrorHandler,
    GamutOutcome, GamutProcessor, HdrEngine, HighlightDetail, Mat3, SaturationStage,
    ThrottleSummary, ToneCurve, ToneLut, numerics, presets,
};
// Re-exports from types
pub use types::{
    CHANNELS, ColorSpace, Correction, CurveKind, Frame, ParamRange, PipelineStats, ToneParams,
    TrimmedSummary,
};
