use std::sync::Arc;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tokio::sync::Mutex;

/// Request budget shared by every clone: `limit` weight per wall-clock window.
#[derive(Clone)]
pub struct RateLimiter {
    inner: Arc<Mutex<InnerLimiter>>,
}

struct InnerLimiter {
    used_weight: u32,
    // Index of the window currently being counted, e.g. 2,833,333 ten-minute windows since Epoch
    current_window_idx: u64,
    window_secs: u64,
    limit: u32,
}

impl RateLimiter {
    pub fn new(limit: u32, window_secs: u64) -> Self {
        let window_secs = window_secs.max(1);
        Self {
            inner: Arc::new(Mutex::new(InnerLimiter {
                used_weight: 0,
                current_window_idx: Self::window_idx(window_secs),
                window_secs,
                limit,
            })),
        }
    }

    /// Waits until `cost` weight fits into the current window, then takes it.
    pub async fn acquire(&self, cost: u32, context: &str) {
        loop {
            let (wait_duration, stats) = {
                let mut guard = self.inner.lock().await;
                let now_idx = Self::window_idx(guard.window_secs);

                // 1. New window (wall clock)
                if now_idx > guard.current_window_idx {
                    guard.used_weight = 0;
                    guard.current_window_idx = now_idx;
                }

                // 2. Capacity. A single request larger than the whole budget still goes through on an empty window.
                if guard.used_weight + cost <= guard.limit || guard.used_weight == 0 {
                    guard.used_weight += cost;
                    return;
                }

                // 3. Wait until the window rolls over
                let seconds_into_window = Self::now_secs() % guard.window_secs;
                let wait_secs = guard.window_secs - seconds_into_window;

                // Small buffer so we land inside the next window
                let wait = Duration::from_secs(wait_secs) + Duration::from_millis(100);

                (wait, (guard.used_weight, guard.limit))
            };

            log::warn!(
                "🛑 Rate limit saturated for [{}]. Used: {}/{}. Waiting {:.1}s...",
                context,
                stats.0,
                stats.1,
                wait_duration.as_secs_f64()
            );

            tokio::time::sleep(wait_duration).await;
        }
    }

    /// Weight already spent in the current window.
    pub async fn used(&self) -> u32 {
        let guard = self.inner.lock().await;
        if Self::window_idx(guard.window_secs) > guard.current_window_idx {
            0
        } else {
            guard.used_weight
        }
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or(Duration::ZERO)
            .as_secs()
    }

    fn window_idx(window_secs: u64) -> u64 {
        Self::now_secs() / window_secs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn acquires_within_budget_without_waiting() {
        let limiter = RateLimiter::new(10, 3_600);
        for _ in 0..5 {
            limiter.acquire(2, "test").await;
        }
        // The window may have rolled over between calls; either way we never exceed the budget.
        assert!(limiter.used().await <= 10);
    }

    #[tokio::test]
    async fn clones_share_the_budget() {
        let limiter = RateLimiter::new(100, 3_600);
        let other = limiter.clone();
        limiter.acquire(3, "a").await;
        other.acquire(4, "b").await;
        let used = limiter.used().await;
        assert!(used == 7 || used == 4);
    }
}
