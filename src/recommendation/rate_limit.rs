//! Per-client request limiting for recommendation calls.
//!
//! [`InMemoryRateLimiter`] keeps its counters in process memory, so limits are
//! only enforced per server instance. A shared store can be plugged in behind
//! the [`RateLimiter`] trait for multi-instance deployments.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

/// Longest accepted window. Longer ones are clamped.
pub const MAX_RATE_LIMIT_WINDOW: Duration = Duration::from_secs(30 * 24 * 3600);

pub trait RateLimiter: Send + Sync {
    /// Record a request from `identifier`. Returns false when it is over the limit.
    fn allow(&self, identifier: &str) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct RateLimitEntry {
    count: u32,
    reset_at: Instant,
}

/// Fixed-window counter keyed by client identifier.
pub struct InMemoryRateLimiter {
    max_requests: u32,
    window: Duration,
    entries: Mutex<HashMap<String, RateLimitEntry>>,
}

impl InMemoryRateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window: window.min(MAX_RATE_LIMIT_WINDOW),
            entries: Mutex::new(HashMap::new()),
        }
    }

    fn allow_at(&self, identifier: &str, now: Instant) -> bool {
        let mut entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        // Lazy expiry
        entries.retain(|_, entry| entry.reset_at > now);

        let window_end = self.window_end(now);
        let entry = entries
            .entry(identifier.to_string())
            .or_insert_with(|| RateLimitEntry {
                count: 0,
                reset_at: window_end,
            });

        if entry.count >= self.max_requests {
            return false;
        }

        entry.count += 1;
        true
    }

    fn window_end(&self, now: Instant) -> Instant {
        now.checked_add(self.window)
            .or_else(|| now.checked_add(MAX_RATE_LIMIT_WINDOW))
            .unwrap_or(now)
    }

    /// Requests counted in the current window and the time until it resets.
    pub fn usage(&self, identifier: &str) -> Option<(u32, Duration)> {
        let now = Instant::now();
        let entries = self
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        entries
            .get(identifier)
            .filter(|entry| entry.reset_at > now)
            .map(|entry| (entry.count, entry.reset_at - now))
    }

    /// Number of identifiers currently tracked.
    pub fn tracked_clients(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

impl RateLimiter for InMemoryRateLimiter {
    fn allow(&self, identifier: &str) -> bool {
        self.allow_at(identifier, Instant::now())
    }
}
