//! Pivot-masked unsharp masking for highlight detail.
//!
//! Detail is restored only above the tone pivot: a separable Gaussian blur
//! feeds an unsharp delta that is thresholded, scaled by the effective
//! intensity, and composed back under a highlight mask. Two temporal guards
//! protect the result:
//!
//! - motion energy against the previous frame suppresses detail on fast
//!   content, halving the effective intensity;
//! - a spectral check over recent frames disables detail entirely when the
//!   1-6 Hz band accumulates more than a fifth of the sample energy, which
//!   is where enhanced grain reads as flicker.

use std::collections::VecDeque;

use rustfft::FftPlanner;
use rustfft::num_complex::Complex;

use crate::implementation::numerics::{max_rgb, safe_div, saturate};
use crate::types::{CHANNELS, Frame};

/// Normalized Gaussian kernel, radius 2, sigma 1.0.
const KERNEL: [f32; 5] = [0.054_488_68, 0.244_201_35, 0.402_619_95, 0.244_201_35, 0.054_488_68];
const RADIUS: isize = 2;

/// Unsharp deltas below this magnitude are discarded.
const DETAIL_THRESHOLD: f32 = 0.03;

/// Motion energy above this suppresses detail for the frame.
const MOTION_CURRENT_LIMIT: f32 = 0.02;
/// Mean motion energy above this suppresses detail for the frame.
const MOTION_MEAN_LIMIT: f32 = 0.01;
/// Ring size for recent motion energies.
const MOTION_RING: usize = 10;

/// Fixed luminance sample points per frame (4x4 grid).
const SAMPLE_POINTS: usize = 16;
/// Frames retained for the spectral check.
const FREQ_WINDOW: usize = 48;
/// Flicker band in Hz.
const BAND_LO: f32 = 1.0;
const BAND_HI: f32 = 6.0;
/// Largest tolerated share of sample energy inside the band.
const BAND_ENERGY_LIMIT: f64 = 0.20;
/// AC energy below this floor is rounding noise, not flicker.
const BAND_ENERGY_FLOOR: f64 = 1e-6;

/// Outcome of one detail pass, for diagnostics and statistics.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct DetailOutcome {
    /// Whether the unsharp pass ran at all.
    pub applied:             bool,
    /// Motion energy measured against the previous frame.
    pub motion_energy:       f32,
    /// Whether motion protection halved the intensity.
    pub suppressed:          bool,
    /// Whether the spectral check disabled detail.
    pub flicker:             bool,
    /// Intensity actually used for the pass.
    pub effective_intensity: f32,
}

/// Highlight detail processor with temporal state.
#[derive(Debug)]
pub struct HighlightDetail {
    intensity:      f32,
    frame_rate:     f32,
    motion_history: VecDeque<f32>,
    sample_history: VecDeque<[f32; SAMPLE_POINTS]>,
}

impl HighlightDetail {
    /// Creates a processor with the given unsharp intensity and frame rate.
    #[must_use]
    pub fn new(intensity: f32, frame_rate: f32) -> Self {
        Self {
            intensity,
            frame_rate: if frame_rate > 0.0 { frame_rate } else { 24.0 },
            motion_history: VecDeque::with_capacity(MOTION_RING),
            sample_history: VecDeque::with_capacity(FREQ_WINDOW),
        }
    }

    /// Clears all temporal state.
    pub fn reset(&mut self) {
        self.motion_history.clear();
        self.sample_history.clear();
    }

    /// Runs the detail pass on a working-domain frame.
    ///
    /// With zero intensity the pass is the identity. Pixels at or below the
    /// pivot are never altered.
    pub fn process(
        &mut self,
        frame: &Frame,
        prev: Option<&Frame>,
        pivot: f32,
    ) -> (Frame, DetailOutcome) {
        let mut outcome = DetailOutcome::default();

        self.push_samples(frame);
        outcome.flicker = self.flicker_detected();

        outcome.motion_energy = match prev {
            Some(p) if p.width() == frame.width() && p.height() == frame.height() => {
                motion_energy(frame, p, pivot)
            }
            _ => 0.0,
        };
        if self.motion_history.len() == MOTION_RING {
            self.motion_history.pop_front();
        }
        self.motion_history.push_back(outcome.motion_energy);
        let mean = self.motion_history.iter().sum::<f32>() / self.motion_history.len() as f32;
        outcome.suppressed =
            outcome.motion_energy > MOTION_CURRENT_LIMIT || mean > MOTION_MEAN_LIMIT;

        let mut effective = self.intensity;
        if outcome.suppressed {
            effective *= 0.5;
        }
        outcome.effective_intensity = effective;

        if outcome.flicker || effective <= 0.0 {
            outcome.effective_intensity = if outcome.flicker { 0.0 } else { effective };
            return (frame.clone(), outcome);
        }

        outcome.applied = true;
        (unsharp_pass(frame, pivot, effective), outcome)
    }

    fn push_samples(&mut self, frame: &Frame) {
        if self.sample_history.len() == FREQ_WINDOW {
            self.sample_history.pop_front();
        }
        self.sample_history.push_back(sample_grid(frame));
    }

    /// Spectral check over the retained sample series.
    ///
    /// Uses a forward FFT per sample point; bins are folded onto their alias
    /// frequency so the mirrored half contributes to the same band.
    fn flicker_detected(&self) -> bool {
        let n = self.sample_history.len();
        if n < 3 {
            return false;
        }
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(n);

        for point in 0..SAMPLE_POINTS {
            let mut buf: Vec<Complex<f32>> = self
                .sample_history
                .iter()
                .map(|s| Complex::new(s[point], 0.0))
                .collect();
            fft.process(&mut buf);

            let mut total = 0.0f64;
            let mut band = 0.0f64;
            for (k, c) in buf.iter().enumerate().skip(1) {
                let energy = f64::from(c.norm_sqr());
                let folded = k.min(n - k);
                let freq = self.frame_rate * folded as f32 / n as f32;
                total += energy;
                if (BAND_LO..=BAND_HI).contains(&freq) {
                    band += energy;
                }
            }
            if total > BAND_ENERGY_FLOOR && band / total > BAND_ENERGY_LIMIT {
                return true;
            }
        }
        false
    }
}

/// Luminance at 16 fixed points, a 4x4 grid inset by an eighth of the frame.
fn sample_grid(frame: &Frame) -> [f32; SAMPLE_POINTS] {
    let mut out = [0.0f32; SAMPLE_POINTS];
    let w = frame.width().max(1);
    let h = frame.height().max(1);
    for gy in 0..4 {
        for gx in 0..4 {
            let x = (w / 8 + gx * w / 4).min(w - 1);
            let y = (h / 8 + gy * h / 4).min(h - 1);
            out[gy * 4 + gx] = max_rgb(frame.pixel(x, y));
        }
    }
    out
}

/// RMS luminance delta over above-pivot pixels, clamped to `[0, 1]`.
fn motion_energy(cur: &Frame, prev: &Frame, pivot: f32) -> f32 {
    let mut sum = 0.0f64;
    let mut count = 0u64;
    for (pc, pp) in cur
        .data()
        .chunks_exact(CHANNELS)
        .zip(prev.data().chunks_exact(CHANNELS))
    {
        let lum = max_rgb([pc[0], pc[1], pc[2]]);
        if lum > pivot {
            let d = f64::from(lum - max_rgb([pp[0], pp[1], pp[2]]));
            sum += d * d;
            count += 1;
        }
    }
    if count == 0 {
        return 0.0;
    }
    let rms = (sum / count as f64).sqrt() as f32;
    rms.clamp(0.0, 1.0)
}

/// Separable Gaussian blur with clamped edges.
fn gaussian_blur(frame: &Frame) -> Vec<f32> {
    let w = frame.width();
    let h = frame.height();
    let data = frame.data();
    let mut tmp = vec![0.0f32; data.len()];
    let mut out = vec![0.0f32; data.len()];

    for y in 0..h {
        for x in 0..w {
            for c in 0..CHANNELS {
                let mut acc = 0.0f32;
                for (ki, &kw) in KERNEL.iter().enumerate() {
                    let sx = (x as isize + ki as isize - RADIUS).clamp(0, w as isize - 1) as usize;
                    acc += kw * data[(y * w + sx) * CHANNELS + c];
                }
                tmp[(y * w + x) * CHANNELS + c] = acc;
            }
        }
    }
    for y in 0..h {
        for x in 0..w {
            for c in 0..CHANNELS {
                let mut acc = 0.0f32;
                for (ki, &kw) in KERNEL.iter().enumerate() {
                    let sy = (y as isize + ki as isize - RADIUS).clamp(0, h as isize - 1) as usize;
                    acc += kw * tmp[(sy * w + x) * CHANNELS + c];
                }
                out[(y * w + x) * CHANNELS + c] = acc;
            }
        }
    }
    out
}

/// Thresholded unsharp compose under the highlight mask.
fn unsharp_pass(frame: &Frame, pivot: f32, amount: f32) -> Frame {
    let blurred = gaussian_blur(frame);
    let mut out = frame.clone();

    let data = out.data_mut();
    for (px, blur) in data
        .chunks_exact_mut(CHANNELS)
        .zip(blurred.chunks_exact(CHANNELS))
    {
        let lum = max_rgb([px[0], px[1], px[2]]);
        if lum <= pivot {
            continue;
        }
        let mask = safe_div(lum - pivot, 1.0 - pivot, 0.0).clamp(0.0, 1.0);
        if mask <= 0.0 {
            continue;
        }
        for c in 0..CHANNELS {
            let mut d = px[c] - blur[c];
            d = if d.abs() > DETAIL_THRESHOLD { d * amount } else { 0.0 };
            px[c] = saturate(px[c] + d * mask);
        }
    }
    out
}
