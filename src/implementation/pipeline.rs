//! Frame pipeline orchestration.
//!
//! `HdrEngine` owns the validated parameter bundle, the compiled tone curve,
//! the temporal detail state, and the statistics record. Per frame it runs:
//!
//! 1. parameter revalidation (corrections fire diagnostics; a non-finite
//!    field forces the hard fallback for the frame),
//! 2. conversion into the working domain (BT.2020, PQ-normalized),
//! 3. hue-preserving tone scaling by the MaxRGB ratio,
//! 4. pivot-masked highlight detail with motion and flicker protection,
//! 5. OKLab saturation shaping,
//! 6. target-space conversion through the two-stage gamut processor,
//! 7. statistics publication and, once per initialization, the curve
//!    self-check.
//!
//! A flicker hit or an unconverged perceptual clamp demotes the frame to
//! the standard fallback: the basic layer only, mapped through the neutral
//! default bundle with both extension stages disabled. A non-finite
//! parameter demotes further, to the identity luminance map.
//!
//! Pixel loops shard by row through rayon unless the deterministic flag is
//! set, in which case everything runs sequentially in row-major order. All
//! reductions are combined in row order either way.

use std::sync::Arc;

use rayon::prelude::*;

use crate::errors::{EngineResult, ErrorCode, ErrorRecord, FallbackAction};
use crate::implementation::config::EngineConfig;
use crate::implementation::fallback::{AggregateReport, ErrorCallback, ErrorHandler};
use crate::implementation::gamut::GamutProcessor;
use crate::implementation::highlight_detail::HighlightDetail;
use crate::implementation::matrix::{from_working_matrix, to_working_matrix};
use crate::implementation::numerics::{is_finite3, max_rgb, safe_div, saturate};
use crate::implementation::saturation::SaturationStage;
use crate::implementation::tone_curve::{ToneCurve, ToneLut};
use crate::implementation::transfer::{pq_eotf_rgb, pq_oetf_norm, pq_oetf_rgb};
use crate::types::{CHANNELS, ColorSpace, Frame, PipelineStats, ToneParams, TrimmedSummary};

/// The tone-mapping and color-pipeline engine.
pub struct HdrEngine {
    params:       ToneParams,
    config:       EngineConfig,
    curve:        ToneCurve,
    lut:          ToneLut,
    detail:       HighlightDetail,
    handler:      Arc<ErrorHandler>,
    stats:        PipelineStats,
    prev_tone:    Option<Frame>,
    clip:         String,
    timecode:     String,
    self_checked: bool,
}

impl HdrEngine {
    /// Creates an engine with the default configuration and the process-wide
    /// error handler.
    pub fn new(params: ToneParams) -> EngineResult<Self> {
        Self::with_config(params, EngineConfig::default())
    }

    /// Creates an engine with an explicit configuration.
    pub fn with_config(params: ToneParams, config: EngineConfig) -> EngineResult<Self> {
        Self::with_handler(params, config, ErrorHandler::global())
    }

    /// Creates an engine from a JSON parameter bundle.
    ///
    /// The recognized options are exactly the bundle fields; unknown or
    /// malformed fields reject the bundle, and the rejection is recorded as
    /// `SCHEMA_MISSING` before the error is returned.
    pub fn from_json(text: &str, config: EngineConfig) -> EngineResult<Self> {
        match ToneParams::from_json(text) {
            Ok(params) => Self::with_config(params, config),
            Err(err) => {
                ErrorHandler::global().report(ErrorRecord::new(
                    ErrorCode::SchemaMissing,
                    err.to_string(),
                ));
                Err(err)
            }
        }
    }

    /// Creates an engine reporting into the given handler.
    ///
    /// The bundle is stored as delivered; corrections fire on the first
    /// frame so their diagnostics carry the clip context. The compiled curve
    /// always reflects a corrected copy.
    pub fn with_handler(
        params: ToneParams,
        config: EngineConfig,
        handler: Arc<ErrorHandler>,
    ) -> EngineResult<Self> {
        let mut corrected = params;
        corrected.clamp_to_valid();
        let curve = ToneCurve::compile(&corrected);
        Ok(Self {
            params,
            config,
            curve,
            lut: ToneLut::build(&curve),
            detail: HighlightDetail::new(corrected.highlight_detail, config.frame_rate),
            handler,
            stats: PipelineStats::default(),
            prev_tone: None,
            clip: String::new(),
            timecode: String::new(),
            self_checked: false,
        })
    }

    /// Returns the active parameter bundle.
    #[must_use]
    pub const fn params(&self) -> &ToneParams {
        &self.params
    }

    /// Returns the engine configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Returns a statistics snapshot.
    #[must_use]
    pub fn statistics(&self) -> PipelineStats {
        self.stats.clone()
    }

    /// Returns the error handler.
    #[must_use]
    pub fn handler(&self) -> Arc<ErrorHandler> {
        self.handler.clone()
    }

    /// Updates the runtime mode flags.
    ///
    /// Requesting determinism after frames were already produced on the
    /// sharded path raises `DET_MISMATCH`: agreement across the whole batch
    /// can no longer be guaranteed.
    pub fn set_mode(&mut self, deterministic: bool, dci_compliance: bool) {
        if deterministic && !self.params.deterministic && self.stats.frames_processed > 0 {
            self.report(
                ErrorRecord::new(
                    ErrorCode::DetMismatch,
                    "determinism requested mid-stream; earlier frames used sharded reductions",
                ),
            );
        }
        self.params.deterministic = deterministic;
        self.params.dci_compliance = dci_compliance;
    }

    /// Sets the clip context attached to subsequent diagnostics.
    pub fn set_clip_context(&mut self, clip: impl Into<String>, timecode: impl Into<String>) {
        self.clip = clip.into();
        self.timecode = timecode.into();
    }

    /// Installs the user error callback.
    pub fn set_error_callback(&self, callback: ErrorCallback) {
        self.handler.set_callback(callback);
    }

    /// Returns the latest diagnostic record.
    #[must_use]
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.handler.last_error()
    }

    /// Clears diagnostic state.
    pub fn reset_errors(&self) {
        self.handler.reset();
    }

    /// Returns the aggregate diagnostic report.
    #[must_use]
    pub fn aggregate_report(&self) -> AggregateReport {
        self.handler.aggregate_report()
    }

    /// Processes one frame.
    pub fn process_frame(&mut self, input: &Frame) -> EngineResult<Frame> {
        if input.pixel_count() == 0 {
            return Ok(Frame::new(input.width(), input.height(), self.config.output_space));
        }

        // Step 1: parameter validation. Range violations clamp and continue;
        // a non-finite field poisons the whole frame and forces tier 3.
        if !self.params.is_valid() {
            let fixes = self.params.validate_and_correct();
            let poisoned = fixes.iter().any(|f| f.code == ErrorCode::NanInf);
            for fix in &fixes {
                let action = if poisoned {
                    FallbackAction::IdentityMap
                } else {
                    FallbackAction::ParameterClamped
                };
                self.report(
                    ErrorRecord::new(
                        fix.code,
                        format!("parameter {} corrected to range midpoint", fix.field),
                    )
                    .with_field(fix.field, fix.value)
                    .with_action(action),
                );
            }
            self.curve = ToneCurve::compile(&self.params);
            self.lut = ToneLut::build(&self.curve);
            self.detail = HighlightDetail::new(self.params.highlight_detail, self.config.frame_rate);
            if poisoned {
                return Ok(self.hard_fallback(input));
            }
        }

        // Step 2: into the working domain.
        let mut work = self.to_working(input);

        // Step 3: tone map the MaxRGB proxy, scale channels by the ratio.
        self.apply_tone(&mut work);

        // Step 4: highlight detail with temporal protection. A flicker hit
        // demotes the whole frame to the basic layer.
        if self.params.highlight_detail > 0.0 {
            let (detailed, outcome) =
                self.detail
                    .process(&work, self.prev_tone.as_ref(), self.params.pivot_pq);
            self.prev_tone = Some(work);
            if outcome.flicker {
                self.report(
                    ErrorRecord::new(
                        ErrorCode::HlFlicker,
                        "highlight band energy exceeded, basic layer emitted",
                    )
                    .with_action(FallbackAction::BasicLayer),
                );
                return Ok(self.standard_fallback(input));
            }
            work = detailed;
        }

        // Step 5: perceptual saturation.
        let stage = SaturationStage::new(
            self.params.sat_base,
            self.params.sat_hi,
            self.params.pivot_pq,
            self.params.dci_compliance,
        );
        if !stage.is_neutral() {
            self.apply_saturation(&mut work, stage);
        }

        // Steps 6 and 7: leave the working domain through the gamut stages.
        // A clamp that fails to converge also demotes the frame.
        let (output, oog_pixels, unconverged) = self.convert_out(&work);
        if unconverged > 0 {
            self.report(
                ErrorRecord::new(
                    ErrorCode::GamutOog,
                    format!("perceptual clamp fell back to coordinate clamp on {unconverged} pixels"),
                )
                .with_action(FallbackAction::BasicLayer),
            );
            if self.params.dci_compliance {
                self.report(
                    ErrorRecord::new(
                        ErrorCode::DciBound,
                        "frame left the DCI gamut after perceptual clamping",
                    )
                    .with_action(FallbackAction::BasicLayer),
                );
            }
            return Ok(self.standard_fallback(input));
        }

        // Steps 8 and 9.
        self.publish(&output, oog_pixels);
        Ok(output)
    }

    /// Publishes statistics for an emitted frame and, once per
    /// initialization, runs the curve self-check.
    fn publish(&mut self, output: &Frame, out_of_gamut_pixels: u64) {
        self.stats
            .record_frame(output_summary(output), out_of_gamut_pixels);
        if !self.self_checked {
            self.self_checked = true;
            let check = self.curve.validate();
            self.stats.curve_monotonic = check.monotonic;
            self.stats.curve_c1_continuous = check.c1_continuous;
            self.stats.max_derivative_gap = check.max_derivative_gap;
            if !check.passed() {
                self.report(
                    ErrorRecord::new(
                        ErrorCode::RangeKnee,
                        "compiled curve failed its self-check",
                    )
                    .with_action(FallbackAction::ParameterClamped),
                );
            }
        }
    }

    fn report(&self, record: ErrorRecord) {
        self.handler
            .report(record.with_context(self.clip.clone(), self.timecode.clone()));
    }

    /// Converts a host frame into the PQ-encoded BT.2020 working domain.
    ///
    /// Non-finite pixels become black; linear-light tags are matrixed into
    /// BT.2020 and PQ-encoded on the normalized scale.
    fn to_working(&self, input: &Frame) -> Frame {
        let mut out = Frame::new(input.width(), input.height(), ColorSpace::Bt2020Pq);
        let matrix = to_working_matrix(input.color_space());
        let pq_in = input.color_space().is_pq_encoded();

        for (dst, src) in out
            .data_mut()
            .chunks_exact_mut(CHANNELS)
            .zip(input.data().chunks_exact(CHANNELS))
        {
            let rgb = [src[0], src[1], src[2]];
            if !is_finite3(rgb) {
                dst.copy_from_slice(&[0.0, 0.0, 0.0]);
                continue;
            }
            let px = if pq_in {
                [saturate(rgb[0]), saturate(rgb[1]), saturate(rgb[2])]
            } else {
                let lin = matrix.transform(rgb);
                pq_oetf_rgb([lin[0].max(0.0), lin[1].max(0.0), lin[2].max(0.0)])
            };
            dst.copy_from_slice(&px);
        }
        out
    }

    /// Scales each pixel by the tone-mapped MaxRGB ratio.
    ///
    /// The deterministic flag pins the exact evaluator; otherwise the
    /// interpolated table stands in for it.
    fn apply_tone(&self, frame: &mut Frame) {
        let lut = if self.params.deterministic { None } else { Some(&self.lut) };
        self.tone_rows(frame, self.curve, lut);
    }

    fn tone_rows(&self, frame: &mut Frame, curve: ToneCurve, lut: Option<&ToneLut>) {
        let stride = frame.row_stride();
        let tone_row = move |row: &mut [f32]| {
            for px in row.chunks_exact_mut(CHANNELS) {
                let m = max_rgb([px[0], px[1], px[2]]);
                if m <= 0.0 {
                    continue;
                }
                let mapped = match lut {
                    Some(table) => table.lookup(m),
                    None => curve.apply(m),
                };
                let scale = safe_div(mapped, m, 0.0);
                for c in px.iter_mut() {
                    *c = saturate(*c * scale);
                }
            }
        };
        if self.params.deterministic {
            frame.data_mut().chunks_mut(stride).for_each(tone_row);
        } else {
            frame.data_mut().par_chunks_mut(stride).for_each(tone_row);
        }
    }

    fn apply_saturation(&self, frame: &mut Frame, stage: SaturationStage) {
        let stride = frame.row_stride();
        let sat_row = move |row: &mut [f32]| {
            for px in row.chunks_exact_mut(CHANNELS) {
                let out = stage.apply([px[0], px[1], px[2]]);
                px.copy_from_slice(&out);
            }
        };
        if self.params.deterministic {
            frame.data_mut().chunks_mut(stride).for_each(sat_row);
        } else {
            frame.data_mut().par_chunks_mut(stride).for_each(sat_row);
        }
    }

    /// Decodes the working domain, converts to the target space, and runs
    /// the gamut stages. Returns the output frame and the counts of
    /// originally out-of-gamut and unconverged pixels, combined in row
    /// order.
    fn convert_out(&self, work: &Frame) -> (Frame, u64, u64) {
        let target = self.config.output_space;
        let matrix = from_working_matrix(target);
        let gamut = GamutProcessor::new(target, self.params.dci_compliance);
        let pq_out = target.is_pq_encoded();
        let stride = work.row_stride();
        let mut out = Frame::new(work.width(), work.height(), target);

        let convert_row = move |(dst_row, src_row): (&mut [f32], &[f32])| -> (u64, u64) {
            let mut oog = 0u64;
            let mut unconverged = 0u64;
            for (dst, src) in dst_row
                .chunks_exact_mut(CHANNELS)
                .zip(src_row.chunks_exact(CHANNELS))
            {
                let lin = pq_eotf_rgb([src[0], src[1], src[2]]);
                let (px, outcome) = gamut.process(matrix.transform(lin));
                if outcome.out_of_gamut {
                    oog += 1;
                }
                if outcome.clamped {
                    unconverged += 1;
                }
                let px = if pq_out { pq_oetf_rgb(px) } else { px };
                dst.copy_from_slice(&px);
            }
            (oog, unconverged)
        };

        let counts: Vec<(u64, u64)> = if self.params.deterministic {
            out.data_mut()
                .chunks_mut(stride)
                .zip(work.data().chunks(stride))
                .map(convert_row)
                .collect()
        } else {
            out.data_mut()
                .par_chunks_mut(stride)
                .zip(work.data().par_chunks(stride))
                .map(convert_row)
                .collect()
        };
        let (oog, unconverged) = counts
            .iter()
            .fold((0u64, 0u64), |acc, c| (acc.0 + c.0, acc.1 + c.1));
        (out, oog, unconverged)
    }

    /// Tier 2: basic-layer-only emission.
    ///
    /// The extension stages (highlight detail, OKLab saturation) are
    /// disabled for the frame and the luminance mapping reverts to the
    /// neutral default bundle; the working-domain round trip and the gamut
    /// stages still run. Gamut diagnostics are not re-raised from here, the
    /// frame is emitted regardless.
    fn standard_fallback(&mut self, input: &Frame) -> Frame {
        let mut work = self.to_working(input);
        let neutral = ToneCurve::compile(&ToneParams::default());
        self.tone_rows(&mut work, neutral, None);
        let (output, oog_pixels, _unconverged) = self.convert_out(&work);
        self.publish(&output, oog_pixels);
        output
    }

    /// Tier 3: identity luminance map.
    ///
    /// Saturation and gamut shaping are bypassed; only the working-domain
    /// round trip and the target box clamp run, so the frame is still
    /// emitted and downstream timing is undisturbed.
    fn hard_fallback(&mut self, input: &Frame) -> Frame {
        let work = self.to_working(input);
        let target = self.config.output_space;
        let matrix = from_working_matrix(target);
        let (floor, ceiling) = target.gamut_range();
        let pq_out = target.is_pq_encoded();

        let mut out = Frame::new(work.width(), work.height(), target);
        for (dst, src) in out
            .data_mut()
            .chunks_exact_mut(CHANNELS)
            .zip(work.data().chunks_exact(CHANNELS))
        {
            let lin = pq_eotf_rgb([src[0], src[1], src[2]]);
            let tgt = matrix.transform(lin);
            let px = [
                tgt[0].clamp(floor, ceiling),
                tgt[1].clamp(floor, ceiling),
                tgt[2].clamp(floor, ceiling),
            ];
            let px = if pq_out { pq_oetf_rgb(px) } else { px };
            dst.copy_from_slice(&px);
        }

        self.publish(&out, 0);
        out
    }
}

impl std::fmt::Debug for HdrEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HdrEngine")
            .field("params", &self.params)
            .field("config", &self.config)
            .field("frames_processed", &self.stats.frames_processed)
            .finish_non_exhaustive()
    }
}

/// Trimmed MaxRGB summary of an output frame on the PQ-normalized scale.
fn output_summary(frame: &Frame) -> TrimmedSummary {
    let pq = frame.color_space().is_pq_encoded();
    let samples: Vec<f32> = frame
        .data()
        .chunks_exact(CHANNELS)
        .map(|px| {
            let m = max_rgb([px[0], px[1], px[2]]);
            if pq { m } else { pq_oetf_norm(m.max(0.0)) }
        })
        .collect();
    TrimmedSummary::from_samples(&samples)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::implementation::presets;

    fn isolated(params: ToneParams) -> HdrEngine {
        HdrEngine::with_handler(params, EngineConfig::default(), Arc::new(ErrorHandler::new()))
            .unwrap()
    }

    #[test]
    fn test_cinema_flat_mid_gray() {
        // Uniform mid-gray through the full pipeline lands on the tone curve
        // value for 0.5: the detail pass has nothing to sharpen and the
        // saturation stage leaves the gray axis alone.
        let mut engine = isolated(presets::cinema_flat());
        let input = Frame::filled(16, 16, ColorSpace::Bt2020Pq, [0.5, 0.5, 0.5]);
        let output = engine.process_frame(&input).unwrap();

        assert_eq!(output.color_space(), ColorSpace::Bt2020Pq);
        assert!(output.is_finite());
        let px = output.pixel(8, 8);
        let m = max_rgb(px);
        assert!((m - 0.3968).abs() < 0.01, "tone value drifted: {m}");
        for c in px {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_nan_input_pixel_becomes_black_without_diagnostics() {
        let mut engine = isolated(ToneParams::default());
        let mut input = Frame::filled(8, 8, ColorSpace::Bt2020Pq, [0.4, 0.4, 0.4]);
        input.data_mut()[0] = f32::NAN;

        let output = engine.process_frame(&input).unwrap();
        assert!(output.is_finite());
        assert_eq!(output.pixel(0, 0), [0.0, 0.0, 0.0]);
        assert!(engine.last_error().is_none());
    }

    #[test]
    fn test_range_violation_corrected_on_first_frame() {
        let mut engine = isolated(ToneParams { pivot_pq: -0.1, ..Default::default() });
        let input = Frame::filled(8, 8, ColorSpace::Bt2020Pq, [0.3, 0.3, 0.3]);
        let _ = engine.process_frame(&input).unwrap();

        assert!((engine.params().pivot_pq - 0.175).abs() < 1e-6);
        let record = engine.last_error().unwrap();
        // The self-check record may follow the correction; the aggregate
        // report still carries the range code.
        let report = engine.aggregate_report();
        assert!(report.by_code.iter().any(|(c, _)| *c == ErrorCode::RangePivot));
        assert_eq!(record.clip, "");
    }

    #[test]
    fn test_non_finite_parameter_forces_identity_frame() {
        let mut engine = isolated(ToneParams { gamma_s: f32::NAN, ..Default::default() });
        let input = Frame::filled(8, 8, ColorSpace::Bt2020Pq, [0.5, 0.5, 0.5]);

        let first = engine.process_frame(&input).unwrap();
        // Identity luminance: the PQ round trip reproduces the input almost
        // exactly, far from any tone-mapped result.
        let m = max_rgb(first.pixel(4, 4));
        assert!((m - 0.5).abs() < 1e-3, "identity map expected, got {m}");
        let report = engine.aggregate_report();
        assert!(report.by_code.iter().any(|(c, _)| *c == ErrorCode::NanInf));

        // The corrected bundle processes the next frame normally.
        let second = engine.process_frame(&input).unwrap();
        let m2 = max_rgb(second.pixel(4, 4));
        assert!((m2 - 0.5).abs() > 0.05, "tone mapping should engage: {m2}");
    }

    #[test]
    fn test_p3_target_stays_in_gamut() {
        let mut engine = HdrEngine::with_handler(
            ToneParams { dci_compliance: true, ..Default::default() },
            EngineConfig::for_output(ColorSpace::P3D65),
            Arc::new(ErrorHandler::new()),
        )
        .unwrap();
        let mut input = Frame::filled(8, 8, ColorSpace::Bt2020Pq, [0.6, 0.2, 0.1]);
        input.set_pixel(0, 0, [0.9, 0.1, 0.05]);

        let output = engine.process_frame(&input).unwrap();
        assert_eq!(output.color_space(), ColorSpace::P3D65);
        for &c in output.data() {
            assert!((-1e-5..=1.0 + 1e-5).contains(&c), "escaped gamut: {c}");
        }
    }

    #[test]
    fn test_deterministic_runs_are_identical() {
        let params = ToneParams { deterministic: true, ..Default::default() };
        let mut input = Frame::new(24, 16, ColorSpace::Bt2020Pq);
        for y in 0..16 {
            for x in 0..24 {
                let v = (x as f32 / 24.0 + y as f32 / 32.0) * 0.6;
                input.set_pixel(x, y, [v, v * 0.8, v * 0.5]);
            }
        }

        let out_a = isolated(params).process_frame(&input).unwrap();
        let out_b = isolated(params).process_frame(&input).unwrap();
        assert_eq!(out_a.data(), out_b.data());
    }

    #[test]
    fn test_statistics_published_after_frame() {
        let mut engine = isolated(ToneParams::default());
        assert_eq!(engine.statistics().frames_processed, 0);

        let input = Frame::filled(16, 16, ColorSpace::Bt2020Pq, [0.4, 0.4, 0.4]);
        let output = engine.process_frame(&input).unwrap();
        let stats = engine.statistics();

        assert_eq!(stats.frames_processed, 1);
        assert!(stats.last_update.is_some());
        let expected = max_rgb(output.pixel(8, 8));
        assert!((stats.max_rgb.avg - expected).abs() < 1e-4);
        assert!(stats.curve_monotonic);
        assert!(stats.curve_c1_continuous);
    }

    #[test]
    fn test_det_mismatch_on_mid_stream_request() {
        let mut engine = isolated(ToneParams::default());
        let input = Frame::filled(4, 4, ColorSpace::Bt2020Pq, [0.3, 0.3, 0.3]);
        let _ = engine.process_frame(&input).unwrap();

        engine.set_mode(true, false);
        assert_eq!(engine.last_error().unwrap().code, ErrorCode::DetMismatch);
        assert!(engine.params().deterministic);
    }

    #[test]
    fn test_clip_context_attached_to_records() {
        let mut engine = isolated(ToneParams { pivot_pq: 9.0, ..Default::default() });
        engine.set_clip_context("reel2_shot14", "00:01:02:03");
        let input = Frame::filled(4, 4, ColorSpace::Bt2020Pq, [0.3, 0.3, 0.3]);
        let _ = engine.process_frame(&input).unwrap();

        let report = engine.aggregate_report();
        assert!(report.by_code.iter().any(|(c, _)| *c == ErrorCode::RangePivot));
        // Every record for this engine carries the clip context.
        let any = engine.handler().last_error().unwrap();
        assert_eq!(any.clip, "reel2_shot14");
        assert_eq!(any.timecode, "00:01:02:03");
    }

    #[test]
    fn test_rec709_roundtrip_input() {
        // Linear Rec.709 material survives the trip into and out of the
        // working domain with plausible levels.
        let mut engine = HdrEngine::with_handler(
            presets::archive_neutral(),
            EngineConfig::for_output(ColorSpace::Rec709),
            Arc::new(ErrorHandler::new()),
        )
        .unwrap();
        let input = Frame::filled(8, 8, ColorSpace::Rec709, [0.01, 0.01, 0.01]);
        let output = engine.process_frame(&input).unwrap();
        assert_eq!(output.color_space(), ColorSpace::Rec709);
        assert!(output.is_finite());
        for &c in output.data() {
            assert!((0.0..=1.0).contains(&c));
        }
    }

    #[test]
    fn test_standard_fallback_emits_basic_layer() {
        // The basic layer reverts to the default-bundle curve and skips the
        // extension stages entirely.
        let params = ToneParams {
            gamma_s: 1.6,
            gamma_h: 1.4,
            shoulder_h: 3.0,
            sat_base: 1.8,
            ..Default::default()
        };
        let mut engine = isolated(params);
        let input = Frame::filled(8, 8, ColorSpace::Bt2020Pq, [0.5, 0.5, 0.5]);

        let basic = engine.standard_fallback(&input);
        let styled = engine.process_frame(&input).unwrap();

        let neutral = ToneCurve::compile(&ToneParams::default());
        let m = max_rgb(basic.pixel(4, 4));
        assert!((m - neutral.apply(0.5)).abs() < 1e-3, "not the neutral mapping: {m}");
        let styled_m = max_rgb(styled.pixel(4, 4));
        assert!(
            (styled_m - m).abs() > 0.01,
            "basic layer must differ from the styled frame: {styled_m} vs {m}"
        );
    }

    #[test]
    fn test_flicker_demotes_frame_to_basic_layer() {
        // A 4 Hz oscillation trips the spectral guard; the offending frame
        // reverts to the neutral mapping with the extensions disabled.
        let params = ToneParams {
            gamma_h: 1.4,
            shoulder_h: 3.0,
            highlight_detail: 0.4,
            ..Default::default()
        };
        let mut engine = isolated(params);
        let mut last = Frame::new(1, 1, ColorSpace::Bt2020Pq);
        let mut value = 0.0f32;
        for i in 0..24 {
            let phase = 2.0 * std::f32::consts::PI * 4.0 * i as f32 / 24.0;
            value = 0.5 + 0.3 * phase.sin();
            let input = Frame::filled(16, 16, ColorSpace::Bt2020Pq, [value, value, value]);
            last = engine.process_frame(&input).unwrap();
        }

        let record = engine.last_error().unwrap();
        assert_eq!(record.code, ErrorCode::HlFlicker);
        assert_eq!(record.action, FallbackAction::BasicLayer);

        let neutral = ToneCurve::compile(&ToneParams::default());
        let m = max_rgb(last.pixel(8, 8));
        assert!(
            (m - neutral.apply(value)).abs() < 1e-3,
            "basic layer expected, got {m} for input {value}"
        );
    }

    #[test]
    fn test_from_json_rejects_unknown_fields() {
        let result =
            HdrEngine::from_json(r#"{ "pivot_pq": 0.2, "lut": "x.cube" }"#, EngineConfig::default());
        assert!(result.is_err());

        let engine =
            HdrEngine::from_json(r#"{ "curve": "rlog", "rlog_a": 4.0 }"#, EngineConfig::default())
                .unwrap();
        assert!((engine.params().rlog_a - 4.0).abs() < 1e-6);
    }

    #[test]
    fn test_empty_frame_short_circuits() {
        let mut engine = isolated(ToneParams::default());
        let input = Frame::new(0, 0, ColorSpace::Bt2020Pq);
        let output = engine.process_frame(&input).unwrap();
        assert_eq!(output.pixel_count(), 0);
        assert_eq!(engine.statistics().frames_processed, 0);
    }
}
