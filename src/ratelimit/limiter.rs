//! Core fixed-window rate limiter.

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tracing::{debug, trace};

use super::clock::{Clock, SystemClock};
use super::record::WindowRecord;
use super::status::RateLimitStatus;

/// Default window length: 15 minutes.
pub const DEFAULT_WINDOW_MS: u64 = 900_000;
/// Default number of admitted requests per identifier per window.
pub const DEFAULT_MAX_REQUESTS: u64 = 100;

/// Immutable limiter settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimiterSettings {
    /// Length of the counting window in milliseconds
    pub window_ms: u64,
    /// Maximum admitted requests per identifier per window
    pub max_requests: u64,
}

impl Default for LimiterSettings {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            max_requests: DEFAULT_MAX_REQUESTS,
        }
    }
}

/// Per-identifier fixed-window rate limiter.
///
/// Each identifier gets its own window, opened by its first request and
/// closed `window_ms` later. The read-check-increment sequence for an
/// identifier runs under that identifier's map entry lock, so concurrent
/// requests for the same caller can never push `count` past the limit.
///
/// Records are kept until [`RateLimiter::evict_expired`] or
/// [`RateLimiter::clear`] removes them.
pub struct RateLimiter<C: Clock = SystemClock> {
    /// Window records indexed by identifier
    records: DashMap<String, WindowRecord>,
    settings: LimiterSettings,
    clock: C,
}

impl RateLimiter<SystemClock> {
    /// Create a new rate limiter backed by the system clock.
    pub fn new(settings: LimiterSettings) -> Self {
        Self::with_clock(settings, SystemClock)
    }
}

impl<C: Clock> RateLimiter<C> {
    /// Create a new rate limiter with an explicit time source.
    pub fn with_clock(settings: LimiterSettings, clock: C) -> Self {
        Self {
            records: DashMap::new(),
            settings,
            clock,
        }
    }

    /// Decide whether a request from `identifier` should be rejected.
    ///
    /// Admitted requests are counted; rejected ones are not.
    pub fn is_rate_limited(&self, identifier: &str) -> bool {
        self.check_rate_limit(identifier).limited
    }

    /// Requests left for `identifier` in its current window.
    ///
    /// Reads the stored record as is, even if its window has already
    /// expired.
    pub fn get_remaining_requests(&self, identifier: &str) -> u64 {
        self.records
            .get(identifier)
            .map(|record| record.remaining(self.settings.max_requests))
            .unwrap_or(self.settings.max_requests)
    }

    /// End of the current window for `identifier`, in milliseconds since
    /// the Unix epoch. Unknown identifiers report when a window opened now
    /// would end.
    pub fn get_reset_time(&self, identifier: &str) -> u64 {
        match self.records.get(identifier) {
            Some(record) => record.reset_time,
            None => self.clock.now_ms().saturating_add(self.settings.window_ms),
        }
    }

    /// Take the admission decision for `identifier` and report the window
    /// state after it.
    ///
    /// The decision and the reported `remaining`/`reset_time` come from the
    /// same locked view of the record.
    pub fn check_rate_limit(&self, identifier: &str) -> RateLimitStatus {
        let now = self.clock.now_ms();

        // Fast path: existing identifiers don't need an owned key.
        if let Some(mut record) = self.records.get_mut(identifier) {
            return self.apply(identifier, record.value_mut(), now);
        }

        match self.records.entry(identifier.to_owned()) {
            Entry::Occupied(mut occupied) => self.apply(identifier, occupied.get_mut(), now),
            Entry::Vacant(vacant) => {
                let record = vacant.insert(WindowRecord::start(now, self.settings.window_ms));
                debug!(
                    identifier = %identifier,
                    reset_time = record.reset_time,
                    "Tracking new identifier"
                );
                self.admitted(identifier, &record)
            }
        }
    }

    /// Apply one request to an existing record.
    fn apply(&self, identifier: &str, record: &mut WindowRecord, now: u64) -> RateLimitStatus {
        if record.is_expired(now) {
            *record = WindowRecord::start(now, self.settings.window_ms);
            debug!(
                identifier = %identifier,
                reset_time = record.reset_time,
                "Window expired, starting new window"
            );
            return self.admitted(identifier, record);
        }

        if record.count >= self.settings.max_requests {
            debug!(
                identifier = %identifier,
                count = record.count,
                limit = self.settings.max_requests,
                "Rate limit exceeded"
            );
            return RateLimitStatus {
                limited: true,
                remaining: 0,
                reset_time: record.reset_time,
            };
        }

        record.count += 1;
        self.admitted(identifier, record)
    }

    fn admitted(&self, identifier: &str, record: &WindowRecord) -> RateLimitStatus {
        let remaining = record.remaining(self.settings.max_requests);
        trace!(
            identifier = %identifier,
            count = record.count,
            remaining = remaining,
            "Request admitted"
        );
        RateLimitStatus {
            limited: false,
            remaining,
            reset_time: record.reset_time,
        }
    }

    /// Remove records whose window has ended and return how many were
    /// removed.
    ///
    /// Admission is unaffected: the next request from an evicted
    /// identifier opens a new window exactly as an expired record would.
    pub fn evict_expired(&self) -> usize {
        let now = self.clock.now_ms();
        let mut evicted = 0;
        self.records.retain(|_, record| {
            let keep = !record.is_expired(now);
            if !keep {
                evicted += 1;
            }
            keep
        });
        evicted
    }

    /// Get the number of tracked identifiers.
    pub fn tracked_identifiers(&self) -> usize {
        self.records.len()
    }

    /// Clear all records.
    pub fn clear(&self) {
        self.records.clear();
    }

    /// Get the limiter settings.
    pub fn settings(&self) -> LimiterSettings {
        self.settings
    }

    /// Get the limiter's time source.
    pub fn clock(&self) -> &C {
        &self.clock
    }
}

impl Default for RateLimiter<SystemClock> {
    fn default() -> Self {
        Self::new(LimiterSettings::default())
    }
}
