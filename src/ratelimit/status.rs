//! Admission decision returned to request handlers.

use serde::Serialize;

/// Outcome of a single admission check.
///
/// `remaining` and `reset_time` describe the window state after the
/// decision in `limited` was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitStatus {
    /// Whether the request was rejected.
    pub limited: bool,
    /// Requests left in the current window.
    pub remaining: u64,
    /// End of the current window, in milliseconds since the Unix epoch.
    pub reset_time: u64,
}

impl RateLimitStatus {
    /// Whole seconds until the window resets, rounded up.
    ///
    /// Returns 0 once the reset time has passed.
    pub fn retry_after_secs(&self, now_ms: u64) -> u64 {
        self.reset_time.saturating_sub(now_ms).div_ceil(1000)
    }
}
