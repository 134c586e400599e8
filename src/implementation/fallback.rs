//! Error collection, throttling, and fallback bookkeeping.
//!
//! The handler is shared state: the pipeline reports records into it, hosts
//! read the latest record and the aggregate summary out of it. A single
//! mutex guards the throttle table and the record history. A process-wide
//! singleton exists for convenience, but every consumer accepts a handler
//! reference so tests and embedders can isolate their diagnostics.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, Instant, SystemTime};

use crate::errors::{ErrorCode, ErrorRecord, Severity};

/// Logs allowed per code inside one throttle window.
const MAX_LOGS_PER_WINDOW: u32 = 10;
/// Rolling throttle window length.
const THROTTLE_WINDOW: Duration = Duration::from_secs(1);
/// Retained record history.
const HISTORY_LIMIT: usize = 256;

/// Callback invoked on every error, throttled or not.
pub type ErrorCallback = Box<dyn Fn(&ErrorRecord) + Send + Sync>;

#[derive(Debug, Default)]
struct ThrottleEntry {
    window_start: Option<Instant>,
    in_window:    u32,
    dropped:      u64,
    first_drop:   Option<SystemTime>,
    last_drop:    Option<SystemTime>,
}

#[derive(Default)]
struct HandlerState {
    last:     Option<ErrorRecord>,
    history:  Vec<ErrorRecord>,
    counts:   HashMap<ErrorCode, u64>,
    throttle: HashMap<ErrorCode, ThrottleEntry>,
}

/// Summary of throttled drops for one code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThrottleSummary {
    /// Code whose records were dropped.
    pub code:       ErrorCode,
    /// Number of records dropped from the log.
    pub dropped:    u64,
    /// Timestamp of the first dropped record.
    pub first_drop: SystemTime,
    /// Timestamp of the last dropped record.
    pub last_drop:  SystemTime,
}

/// Aggregate diagnostic report.
#[derive(Debug, Clone, Default)]
pub struct AggregateReport {
    /// Total records observed, including throttled ones.
    pub total:     u64,
    /// Per-code record counts.
    pub by_code:   Vec<(ErrorCode, u64)>,
    /// Throttle summaries for codes that overflowed a window.
    pub throttled: Vec<ThrottleSummary>,
}

/// Shared error handler.
pub struct ErrorHandler {
    state:    Mutex<HandlerState>,
    callback: Mutex<Option<ErrorCallback>>,
}

impl ErrorHandler {
    /// Creates an isolated handler.
    #[must_use]
    pub fn new() -> Self {
        Self {
            state:    Mutex::new(HandlerState::default()),
            callback: Mutex::new(None),
        }
    }

    /// Returns the process-wide handler, initializing it on first use.
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<ErrorHandler>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(Self::new())).clone()
    }

    /// Installs the user callback, replacing any previous one.
    pub fn set_callback(&self, callback: ErrorCallback) {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = Some(callback);
        }
    }

    /// Removes the user callback.
    pub fn clear_callback(&self) {
        if let Ok(mut slot) = self.callback.lock() {
            *slot = None;
        }
    }

    /// Reports a record.
    ///
    /// The record always becomes the latest record and always reaches the
    /// callback; the log emission and history append are throttled to ten
    /// records per code per rolling second.
    pub fn report(&self, record: ErrorRecord) {
        let mut emit = false;
        if let Ok(mut state) = self.state.lock() {
            *state.counts.entry(record.code).or_insert(0) += 1;

            let entry = state.throttle.entry(record.code).or_default();
            let now = Instant::now();
            match entry.window_start {
                Some(start) if now.duration_since(start) < THROTTLE_WINDOW => {}
                _ => {
                    entry.window_start = Some(now);
                    entry.in_window = 0;
                }
            }
            if entry.in_window < MAX_LOGS_PER_WINDOW {
                entry.in_window += 1;
                emit = true;
            } else {
                entry.dropped += 1;
                if entry.first_drop.is_none() {
                    entry.first_drop = Some(record.timestamp);
                }
                entry.last_drop = Some(record.timestamp);
            }

            if emit {
                if state.history.len() == HISTORY_LIMIT {
                    state.history.remove(0);
                }
                state.history.push(record.clone());
            }
            state.last = Some(record.clone());
        }

        if emit {
            match record.severity {
                Severity::Error => tracing::error!(
                    code = record.code.name(),
                    field = record.field.unwrap_or(""),
                    action = record.action.name(),
                    "{}",
                    record.message
                ),
                Severity::Warn => tracing::warn!(
                    code = record.code.name(),
                    field = record.field.unwrap_or(""),
                    action = record.action.name(),
                    "{}",
                    record.message
                ),
                Severity::Info => tracing::info!(code = record.code.name(), "{}", record.message),
            }
        }

        if let Ok(slot) = self.callback.lock() {
            if let Some(callback) = slot.as_ref() {
                callback(&record);
            }
        }
    }

    /// Returns the most recent record, if any.
    #[must_use]
    pub fn last_error(&self) -> Option<ErrorRecord> {
        self.state.lock().ok().and_then(|s| s.last.clone())
    }

    /// Clears records, counters, and throttle state.
    pub fn reset(&self) {
        if let Ok(mut state) = self.state.lock() {
            *state = HandlerState::default();
        }
    }

    /// Derives the aggregate report under the handler lock.
    #[must_use]
    pub fn aggregate_report(&self) -> AggregateReport {
        let Ok(state) = self.state.lock() else {
            return AggregateReport::default();
        };
        let mut by_code: Vec<(ErrorCode, u64)> =
            state.counts.iter().map(|(&c, &n)| (c, n)).collect();
        by_code.sort_by_key(|(c, _)| c.name());

        let mut throttled: Vec<ThrottleSummary> = state
            .throttle
            .iter()
            .filter(|(_, e)| e.dropped > 0)
            .filter_map(|(&code, e)| {
                Some(ThrottleSummary {
                    code,
                    dropped: e.dropped,
                    first_drop: e.first_drop?,
                    last_drop: e.last_drop?,
                })
            })
            .collect();
        throttled.sort_by_key(|t| t.code.name());

        AggregateReport {
            total: state.counts.values().sum(),
            by_code,
            throttled,
        }
    }
}

impl Default for ErrorHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ErrorHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorHandler").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[test]
    fn test_last_error_retained() {
        let handler = ErrorHandler::new();
        assert!(handler.last_error().is_none());
        handler.report(ErrorRecord::new(ErrorCode::RangeKnee, "knee out of range"));
        handler.report(ErrorRecord::new(ErrorCode::GamutOog, "clamp did not converge"));
        let last = handler.last_error().unwrap();
        assert_eq!(last.code, ErrorCode::GamutOog);
    }

    #[test]
    fn test_reset_clears_everything() {
        let handler = ErrorHandler::new();
        handler.report(ErrorRecord::new(ErrorCode::NanInf, "poisoned"));
        handler.reset();
        assert!(handler.last_error().is_none());
        assert_eq!(handler.aggregate_report().total, 0);
    }

    #[test]
    fn test_throttle_counts_excess() {
        let handler = ErrorHandler::new();
        for i in 0..25 {
            handler.report(ErrorRecord::new(ErrorCode::GamutOog, format!("pixel {i}")));
        }
        let report = handler.aggregate_report();
        assert_eq!(report.total, 25);
        assert_eq!(report.by_code, vec![(ErrorCode::GamutOog, 25)]);
        assert_eq!(report.throttled.len(), 1);
        assert_eq!(report.throttled[0].dropped, 15);
    }

    #[test]
    fn test_callback_fires_despite_throttle() {
        let handler = ErrorHandler::new();
        static CALLS: AtomicU32 = AtomicU32::new(0);
        handler.set_callback(Box::new(|_| {
            CALLS.fetch_add(1, Ordering::Relaxed);
        }));
        for _ in 0..20 {
            handler.report(ErrorRecord::new(ErrorCode::HlFlicker, "band energy exceeded"));
        }
        assert_eq!(CALLS.load(Ordering::Relaxed), 20);
        // Last record still reflects the newest report even when throttled.
        assert_eq!(handler.last_error().unwrap().code, ErrorCode::HlFlicker);
    }

    #[test]
    fn test_per_code_windows_are_independent() {
        let handler = ErrorHandler::new();
        for _ in 0..12 {
            handler.report(ErrorRecord::new(ErrorCode::GamutOog, "oog"));
        }
        handler.report(ErrorRecord::new(ErrorCode::RangeKnee, "knee"));
        let report = handler.aggregate_report();
        // Only the flooding code was throttled.
        assert_eq!(report.throttled.len(), 1);
        assert_eq!(report.throttled[0].code, ErrorCode::GamutOog);
    }

    #[test]
    fn test_global_is_shared() {
        let a = ErrorHandler::global();
        let b = ErrorHandler::global();
        assert!(Arc::ptr_eq(&a, &b));
    }
}
