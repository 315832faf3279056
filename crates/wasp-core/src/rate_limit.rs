//! Sliding-window rate limiter: a `parking_lot::Mutex`-guarded map from
//! key to a timestamp deque, pruned lazily on each check rather than via
//! a background task.

use std::collections::HashMap;

use parking_lot::Mutex;

#[derive(Debug, Clone, Copy)]
pub struct RateLimitConfig {
    pub window_ms: u64,
    pub max_requests: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RateLimitResult {
    pub allowed: bool,
    pub remaining: u32,
    pub reset_ms: u64,
}

struct Window {
    hits: Vec<u64>,
}

/// Tracks per-key request timestamps (milliseconds since an arbitrary
/// caller-supplied epoch — the caller decides what clock to use, which
/// keeps this module free of a direct `SystemTime`/`Instant` dependency
/// and trivially testable).
pub struct RateLimiter {
    windows: Mutex<HashMap<String, Window>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            windows: Mutex::new(HashMap::new()),
        }
    }

    /// Checks and records one request for `key` at `now_ms`. Entries
    /// older than the window are dropped before counting.
    pub fn check(&self, key: &str, now_ms: u64, config: RateLimitConfig) -> RateLimitResult {
        let mut windows = self.windows.lock();
        let window = windows.entry(key.to_string()).or_insert_with(|| Window {
            hits: Vec::new(),
        });

        let cutoff = now_ms.saturating_sub(config.window_ms);
        window.hits.retain(|&t| t > cutoff);

        let count = window.hits.len() as u32;
        if count >= config.max_requests {
            let oldest = window.hits.first().copied().unwrap_or(now_ms);
            let reset_ms = (oldest + config.window_ms).saturating_sub(now_ms);
            return RateLimitResult {
                allowed: false,
                remaining: 0,
                reset_ms,
            };
        }

        window.hits.push(now_ms);
        RateLimitResult {
            allowed: true,
            remaining: config.max_requests - count - 1,
            reset_ms: config.window_ms,
        }
    }

    /// Drops keys whose entire window has gone stale, bounding memory for
    /// keys that stop being used. A key is swept once every entry in it
    /// is older than five window lengths.
    pub fn sweep(&self, now_ms: u64, window_ms: u64) {
        let cutoff = now_ms.saturating_sub(window_ms.saturating_mul(5));
        let mut windows = self.windows.lock();
        windows.retain(|_, window| window.hits.iter().any(|&t| t > cutoff));
    }

    pub fn len(&self) -> usize {
        self.windows.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RateLimitConfig {
        RateLimitConfig {
            window_ms: 1000,
            max_requests: 3,
        }
    }

    #[test]
    fn allows_up_to_max_requests_within_window() {
        let limiter = RateLimiter::new();
        for i in 0..3 {
            let result = limiter.check("k", i * 10, config());
            assert!(result.allowed, "request {i} should be allowed");
        }
        let blocked = limiter.check("k", 35, config());
        assert!(!blocked.allowed);
        assert_eq!(blocked.remaining, 0);
    }

    #[test]
    fn remaining_counts_down() {
        let limiter = RateLimiter::new();
        let r0 = limiter.check("k", 0, config());
        assert_eq!(r0.remaining, 2);
        let r1 = limiter.check("k", 1, config());
        assert_eq!(r1.remaining, 1);
    }

    #[test]
    fn window_slides_and_old_hits_expire() {
        let limiter = RateLimiter::new();
        let cfg = config();
        for i in 0..3 {
            assert!(limiter.check("k", i * 10, cfg).allowed);
        }
        assert!(!limiter.check("k", 40, cfg).allowed);
        // Past the window: the three early hits have aged out.
        let result = limiter.check("k", 1100, cfg);
        assert!(result.allowed);
    }

    #[test]
    fn distinct_keys_have_independent_windows() {
        let limiter = RateLimiter::new();
        let cfg = config();
        for i in 0..3 {
            assert!(limiter.check("a", i, cfg).allowed);
        }
        assert!(!limiter.check("a", 3, cfg).allowed);
        assert!(limiter.check("b", 3, cfg).allowed, "key b must be unaffected by key a");
    }

    #[test]
    fn reset_ms_reflects_time_until_oldest_hit_expires() {
        let limiter = RateLimiter::new();
        let cfg = config();
        for i in 0..3 {
            limiter.check("k", i, cfg);
        }
        let blocked = limiter.check("k", 5, cfg);
        assert!(!blocked.allowed);
        assert_eq!(blocked.reset_ms, 995);
    }

    #[test]
    fn sweep_drops_fully_stale_keys() {
        let limiter = RateLimiter::new();
        limiter.check("k", 0, config());
        assert_eq!(limiter.len(), 1);
        limiter.sweep(10_000, 1000);
        assert!(limiter.is_empty());
    }

    #[test]
    fn sweep_preserves_keys_with_recent_activity() {
        let limiter = RateLimiter::new();
        limiter.check("k", 0, config());
        limiter.check("k", 4000, config());
        limiter.sweep(4500, 1000);
        assert_eq!(limiter.len(), 1, "hit at 4000 is within 5 windows of 4500");
    }
}
