//! HDR engine implementations.
//!
//! This module contains the processing stages of the pipeline:
//! - `numerics` - guarded scalar arithmetic
//! - `transfer` - PQ (ST 2084) transfer functions
//! - `matrix` - frozen primaries conversion matrices
//! - `oklab` - perceptual color space conversions
//! - `tone_curve` - PPR and RLOG evaluators with self-checks
//! - `highlight_detail` - pivot-masked unsharp masking
//! - `saturation` - OKLab saturation shaping
//! - `gamut` - two-stage gamut processing
//! - `fallback` - error handler, throttling, aggregate reports
//! - `presets` - factory parameter bundles
//! - `pipeline` - the `HdrEngine` orchestrator

mod config;
mod fallback;
mod gamut;
mod highlight_detail;
mod matrix;
pub mod numerics;
mod oklab;
mod pipeline;
pub mod presets;
mod saturation;
mod tone_curve;
mod transfer;

pub use config::EngineConfig;
pub use fallback::{AggregateReport, ErrorCallback, ErrorHandler, ThrottleSummary};
pub use gamut::{GamutOutcome, GamutProcessor};
pub use highlight_detail::{DetailOutcome, HighlightDetail};
pub use matrix::{
    ACESCG_TO_BT2020, BT2020_TO_ACESCG, BT2020_TO_P3D65, BT2020_TO_REC709, BT2020_TO_XYZ, Mat3,
    P3D65_TO_BT2020, REC709_TO_BT2020, XYZ_TO_BT2020, from_working_matrix, to_working_matrix,
};
pub use oklab::{cbrt_signed, linear_rgb_to_oklab, oklab_to_linear_rgb};
pub use pipeline::HdrEngine;
pub use saturation::SaturationStage;
pub use tone_curve::{CurveValidation, ToneCurve, ToneLut};
pub use transfer::{pq_eotf, pq_eotf_norm, pq_eotf_rgb, pq_oetf, pq_oetf_norm, pq_oetf_rgb};
