//! Per-identifier window state.

/// Request count for one identifier within its current fixed window.
///
/// Records are created lazily on the first request from an identifier and
/// overwritten in place when a request arrives after `reset_time`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowRecord {
    /// Requests counted in the current window. Always at least 1.
    pub count: u64,
    /// End of the current window, in milliseconds since the Unix epoch.
    pub reset_time: u64,
}

impl WindowRecord {
    /// Open a new window at `now_ms`, counting the triggering request.
    pub fn start(now_ms: u64, window_ms: u64) -> Self {
        Self {
            count: 1,
            reset_time: now_ms.saturating_add(window_ms),
        }
    }

    /// Whether the window has ended. A request landing exactly on
    /// `reset_time` still belongs to the current window.
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms > self.reset_time
    }

    /// Requests left before `max_requests` is reached.
    pub fn remaining(&self, max_requests: u64) -> u64 {
        max_requests.saturating_sub(self.count)
    }
}
