//! Fixed-window, in-memory rate limiting keyed by caller.

use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

#[derive(Debug, Clone, Copy)]
struct Window {
    count: u32,
    resets_at: Instant,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RateLimitDecision {
    pub allowed: bool,
    pub remaining: u32,
    pub retry_after_secs: u64,
}

#[derive(Clone)]
pub struct RateLimiter {
    max_requests: u32,
    window: Duration,
    windows: Arc<Mutex<HashMap<String, Window>>>,
}

impl RateLimiter {
    pub fn new(max_requests: u32, window: Duration) -> Self {
        Self {
            max_requests,
            window,
            windows: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Count one request against `key` and report whether it may proceed
    pub async fn check(&self, key: &str) -> RateLimitDecision {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;

        let window = windows.entry(key.to_string()).or_insert(Window {
            count: 0,
            resets_at: now + self.window,
        });
        if now >= window.resets_at {
            *window = Window {
                count: 0,
                resets_at: now + self.window,
            };
        }

        if window.count >= self.max_requests {
            return RateLimitDecision {
                allowed: false,
                remaining: 0,
                retry_after_secs: window.resets_at.saturating_duration_since(now).as_secs().max(1),
            };
        }

        window.count += 1;
        RateLimitDecision {
            allowed: true,
            remaining: self.max_requests - window.count,
            retry_after_secs: 0,
        }
    }

    /// Forget windows that have already reset, returns how many were dropped
    pub async fn sweep(&self) -> usize {
        let now = Instant::now();
        let mut windows = self.windows.lock().await;
        let before = windows.len();
        windows.retain(|_, window| window.resets_at > now);
        before - windows.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(3, Duration::from_secs(60));

        for expected_remaining in [2, 1, 0] {
            let decision = limiter.check("watcher-check:alice").await;
            assert!(decision.allowed);
            assert_eq!(decision.remaining, expected_remaining);
        }

        let blocked = limiter.check("watcher-check:alice").await;
        assert!(!blocked.allowed);
        assert!(blocked.retry_after_secs >= 1);
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let limiter = RateLimiter::new(1, Duration::from_secs(60));

        assert!(limiter.check("watcher-check:alice").await.allowed);
        assert!(!limiter.check("watcher-check:alice").await.allowed);
        assert!(limiter.check("watcher-check:bob").await.allowed);
    }

    #[tokio::test]
    async fn test_window_resets_and_sweep_drops_stale_entries() {
        let limiter = RateLimiter::new(1, Duration::from_millis(50));

        assert!(limiter.check("k").await.allowed);
        assert!(!limiter.check("k").await.allowed);

        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(limiter.sweep().await, 1);
        assert!(limiter.check("k").await.allowed);
    }
}
