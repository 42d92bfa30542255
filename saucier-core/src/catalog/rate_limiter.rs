//! Per-host request spacing for catalog calls.

use dashmap::DashMap;
use std::time::Duration;
use tokio::time::{sleep, Instant};

/// Keeps consecutive requests to the same host at least `min_delay` apart.
pub struct RateLimiter {
    min_delay: Duration,
    /// Earliest instant the next request to each host may start.
    next_slot: DashMap<String, Instant>,
}

impl RateLimiter {
    pub fn new(min_delay: Duration) -> Self {
        Self {
            min_delay,
            next_slot: DashMap::new(),
        }
    }

    /// Wait until a request to `host` may go out.
    pub async fn wait(&self, host: &str) {
        if self.min_delay.is_zero() {
            return;
        }

        // Slot is reserved under the entry lock; concurrent callers queue.
        let start = {
            let now = Instant::now();
            let mut slot = self.next_slot.entry(host.to_string()).or_insert(now);
            let start = (*slot).max(now);
            *slot = start + self.min_delay;
            start
        };

        let now = Instant::now();
        if start > now {
            sleep(start - now).await;
        }
    }

    pub fn tracked_hosts(&self) -> usize {
        self.next_slot.len()
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Duration::from_millis(200))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn test_spaces_requests_to_same_host() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        limiter.wait("api.example.com").await;
        limiter.wait("api.example.com").await;
        limiter.wait("api.example.com").await;
        assert!(started.elapsed() >= Duration::from_millis(200));
        assert_eq!(limiter.tracked_hosts(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_hosts_are_independent() {
        let limiter = RateLimiter::new(Duration::from_millis(100));
        let started = tokio::time::Instant::now();
        limiter.wait("a.example.com").await;
        limiter.wait("b.example.com").await;
        assert!(started.elapsed() < Duration::from_millis(100));
        assert_eq!(limiter.tracked_hosts(), 2);
    }

    #[tokio::test]
    async fn test_zero_delay_never_tracks() {
        let limiter = RateLimiter::new(Duration::ZERO);
        limiter.wait("a.example.com").await;
        assert_eq!(limiter.tracked_hosts(), 0);
    }
}
