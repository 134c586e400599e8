//! Engine error definitions.
//!
//! Provides `EngineError` for operations that can fail outright: frame
//! geometry validation and parameter schema rejection. Everything else in
//! the pipeline degrades through the fallback tiers instead of erroring.

use thiserror::Error;

/// HDR engine operation errors.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Frame geometry or layout error.
    #[error("invalid frame: {0}")]
    Frame(String),
    /// Parameter bundle rejected by the schema.
    #[error("parameter schema rejected: {0}")]
    Schema(String),
}

impl EngineError {
    /// Create a frame geometry error.
    #[must_use]
    pub fn frame(msg: impl Into<String>) -> Self {
        Self::Frame(msg.into())
    }

    /// Create a schema rejection error.
    #[must_use]
    pub fn schema(msg: impl Into<String>) -> Self {
        Self::Schema(msg.into())
    }
}

/// Result type for HDR engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
