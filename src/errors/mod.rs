//! Error types for the HDR engine.
//!
//! Provides `EngineError` for operation failures and the fixed diagnostic
//! taxonomy (codes, severities, fallback tiers, records).

mod engine_error;
mod taxonomy;

pub use engine_error::{EngineError, EngineResult};
pub use taxonomy::{ErrorCode, ErrorRecord, FallbackAction, FallbackTier, Severity};
