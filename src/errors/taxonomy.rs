//! Error taxonomy for the processing pipeline.
//!
//! Every diagnostic the engine can raise carries a fixed code with an
//! associated severity and fallback tier. Codes are stable identifiers that
//! hosts match on; messages are free text.

use std::time::SystemTime;

/// Diagnostic codes raised by the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ErrorCode {
    /// No error.
    #[default]
    Success,
    /// Required external configuration absent or schema mismatch.
    SchemaMissing,
    /// Pivot parameter out of range.
    RangePivot,
    /// Knee, alpha, toe, or another curve parameter out of range.
    RangeKnee,
    /// Non-finite intermediate value.
    NanInf,
    /// Determinism not guaranteed across the batch.
    DetMismatch,
    /// Temporal frequency-band energy exceeded in the highlights.
    HlFlicker,
    /// DCI compliance check failed.
    DciBound,
    /// Perceptual gamut clamp did not converge.
    GamutOog,
}

impl ErrorCode {
    /// Returns the stable wire name of the code.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Success => "SUCCESS",
            Self::SchemaMissing => "SCHEMA_MISSING",
            Self::RangePivot => "RANGE_PIVOT",
            Self::RangeKnee => "RANGE_KNEE",
            Self::NanInf => "NAN_INF",
            Self::DetMismatch => "DET_MISMATCH",
            Self::HlFlicker => "HL_FLICKER",
            Self::DciBound => "DCI_BOUND",
            Self::GamutOog => "GAMUT_OOG",
        }
    }

    /// Returns the severity associated with this code.
    #[must_use]
    pub const fn severity(&self) -> Severity {
        match self {
            Self::Success => Severity::Info,
            Self::RangePivot | Self::RangeKnee | Self::DetMismatch | Self::HlFlicker => {
                Severity::Warn
            }
            Self::SchemaMissing | Self::NanInf | Self::DciBound | Self::GamutOog => Severity::Error,
        }
    }

    /// Returns the fallback tier selected when this code aborts a frame.
    #[must_use]
    pub const fn fallback_tier(&self) -> Option<FallbackTier> {
        match self {
            Self::Success => None,
            Self::RangePivot | Self::RangeKnee => Some(FallbackTier::ParameterCorrection),
            Self::SchemaMissing
            | Self::DetMismatch
            | Self::HlFlicker
            | Self::DciBound
            | Self::GamutOog => Some(FallbackTier::Standard),
            Self::NanInf => Some(FallbackTier::Hard),
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Diagnostic severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Severity {
    /// Informational.
    #[default]
    Info,
    /// Recoverable anomaly.
    Warn,
    /// Failure requiring a fallback.
    Error,
}

/// Fallback tiers, mildest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FallbackTier {
    /// Tier 1: clamp the offending parameter and continue.
    ParameterCorrection,
    /// Tier 2: disable the extension path, emit a basic-layer result.
    Standard,
    /// Tier 3: identity luminance map, saturation and gamut bypassed.
    Hard,
}

impl FallbackTier {
    /// Returns the numeric tier.
    #[must_use]
    pub const fn level(&self) -> u8 {
        match self {
            Self::ParameterCorrection => 1,
            Self::Standard => 2,
            Self::Hard => 3,
        }
    }
}

/// Action the engine took in response to an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FallbackAction {
    /// No action was required.
    #[default]
    None,
    /// The offending parameter was clamped.
    ParameterClamped,
    /// The frame was emitted as a basic-layer result.
    BasicLayer,
    /// The frame reverted to the identity luminance map.
    IdentityMap,
}

impl FallbackAction {
    /// Returns the stable tag for this action.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::ParameterClamped => "parameter_clamped",
            Self::BasicLayer => "basic_layer",
            Self::IdentityMap => "identity_map",
        }
    }
}

/// A single diagnostic record.
///
/// Mutated at each error site; the handler retains the latest record and a
/// bounded history.
#[derive(Debug, Clone)]
pub struct ErrorRecord {
    /// Diagnostic code.
    pub code:      ErrorCode,
    /// Severity at the site of detection.
    pub severity:  Severity,
    /// Human-readable message.
    pub message:   String,
    /// Offending parameter field, when applicable.
    pub field:     Option<&'static str>,
    /// Offending value, when applicable.
    pub value:     Option<f32>,
    /// Clip identifier supplied by the host.
    pub clip:      String,
    /// Timecode supplied by the host.
    pub timecode:  String,
    /// Action the engine took.
    pub action:    FallbackAction,
    /// Wall-clock time of detection.
    pub timestamp: SystemTime,
}

impl ErrorRecord {
    /// Creates a record for the given code with the current timestamp.
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            severity: code.severity(),
            message: message.into(),
            field: None,
            value: None,
            clip: String::new(),
            timecode: String::new(),
            action: FallbackAction::None,
            timestamp: SystemTime::now(),
        }
    }

    /// Attaches the offending field and value.
    #[must_use]
    pub fn with_field(mut self, field: &'static str, value: f32) -> Self {
        self.field = Some(field);
        self.value = Some(value);
        self
    }

    /// Attaches clip context.
    #[must_use]
    pub fn with_context(mut self, clip: impl Into<String>, timecode: impl Into<String>) -> Self {
        self.clip = clip.into();
        self.timecode = timecode.into();
        self
    }

    /// Sets the action taken.
    #[must_use]
    pub fn with_action(mut self, action: FallbackAction) -> Self {
        self.action = action;
        self
    }
}

impl std::fmt::Display for ErrorRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}", self.code, self.message)?;
        if let (Some(field), Some(value)) = (self.field, self.value) {
            write!(f, " ({field}={value})")?;
        }
        if !self.clip.is_empty() {
            write!(f, " clip={} tc={}", self.clip, self.timecode)?;
        }
        if self.action != FallbackAction::None {
            write!(f, " action={}", self.action.name())?;
        }
        Ok(())
    }
}
