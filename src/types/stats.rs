//! Per-frame statistics collected by the pipeline.

use std::time::SystemTime;

/// Trimmed summary of a sample population.
///
/// One percent of each tail is discarded before the summary is computed,
/// which keeps isolated speculars and dead pixels out of the running levels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TrimmedSummary {
    /// Minimum after trimming.
    pub min:      f32,
    /// Mean after trimming.
    pub avg:      f32,
    /// Maximum after trimming.
    pub max:      f32,
    /// Population variance after trimming.
    pub variance: f32,
}

impl TrimmedSummary {
    /// Computes the trimmed summary of the given samples.
    ///
    /// Non-finite samples are discarded before trimming. Returns the default
    /// (all zero) summary when nothing survives.
    #[must_use]
    pub fn from_samples(samples: &[f32]) -> Self {
        let mut sorted: Vec<f32> = samples.iter().copied().filter(|v| v.is_finite()).collect();
        if sorted.is_empty() {
            return Self::default();
        }
        sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

        let trim = sorted.len() / 100;
        let kept = &sorted[trim..sorted.len() - trim];

        let n = kept.len() as f64;
        let mean = kept.iter().map(|&v| f64::from(v)).sum::<f64>() / n;
        let variance = kept
            .iter()
            .map(|&v| {
                let d = f64::from(v) - mean;
                d * d
            })
            .sum::<f64>()
            / n;

        Self {
            min:      kept[0],
            avg:      mean as f32,
            max:      kept[kept.len() - 1],
            variance: variance as f32,
        }
    }
}

/// Statistics snapshot for the pipeline.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PipelineStats {
    /// Trimmed MaxRGB summary of the most recent output frame,
    /// PQ-normalized.
    pub max_rgb:             TrimmedSummary,
    /// Pixels flagged out of gamut in the most recent frame.
    pub out_of_gamut_pixels: u64,
    /// Cumulative number of frames processed.
    pub frames_processed:    u64,
    /// Wall-clock time of the last statistics update.
    pub last_update:         Option<SystemTime>,
    /// Result of the first-frame monotonicity self-check.
    pub curve_monotonic:     bool,
    /// Result of the first-frame derivative-continuity self-check.
    pub curve_c1_continuous: bool,
    /// Largest derivative gap observed by the self-check.
    pub max_derivative_gap:  f32,
}

impl PipelineStats {
    /// Records a processed frame.
    pub fn record_frame(&mut self, max_rgb: TrimmedSummary, out_of_gamut_pixels: u64) {
        self.max_rgb = max_rgb;
        self.out_of_gamut_pixels = out_of_gamut_pixels;
        self.frames_processed += 1;
        self.last_update = Some(SystemTime::now());
    }
}
