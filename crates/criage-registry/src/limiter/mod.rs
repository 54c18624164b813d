//! Process-wide outbound request limiter
//!
//! A background ticker offers one permit per period into a channel that holds
//! at most one permit. Ticks that find the slot occupied are dropped, so an
//! idle limiter never builds up a backlog: after any pause exactly one caller
//! proceeds immediately and the rest wait for fresh ticks.

use parking_lot::Mutex;
use std::time::Duration;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

/// Rate used when the configured value is not positive
pub const DEFAULT_RATE: u32 = 10;

/// Leaky bucket of size one shared by every repository call
#[derive(Debug)]
pub struct RateLimiter {
    /// Waiters queue on this lock in FIFO order
    permits: tokio::sync::Mutex<mpsc::Receiver<()>>,
    ticker: Mutex<Option<JoinHandle<()>>>,
    per_second: u32,
}

impl RateLimiter {
    /// Start a limiter allowing `per_second` permits per second.
    ///
    /// Must be called from within a tokio runtime.
    pub fn new(per_second: u32) -> Self {
        let per_second = if per_second == 0 { DEFAULT_RATE } else { per_second };
        let period = Duration::from_secs(1) / per_second;

        let (sender, receiver) = mpsc::channel(1);
        // The first caller never waits
        let _ = sender.try_send(());

        let ticker = tokio::spawn(async move {
            let mut interval = time::interval_at(Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                interval.tick().await;
                match sender.try_send(()) {
                    Ok(()) | Err(TrySendError::Full(())) => {},
                    Err(TrySendError::Closed(())) => break,
                }
            }
        });

        Self {
            permits: tokio::sync::Mutex::new(receiver),
            ticker: Mutex::new(Some(ticker)),
            per_second,
        }
    }

    /// Effective permits per second
    pub fn per_second(&self) -> u32 {
        self.per_second
    }

    /// Wait until a permit is available.
    ///
    /// Returns immediately once the limiter has been shut down.
    pub async fn acquire(&self) {
        let mut permits = self.permits.lock().await;
        if permits.recv().await.is_none() {
            tracing::trace!("rate limiter is shut down, passing through");
        }
    }

    /// Stop the background ticker. Safe to call more than once.
    pub fn shutdown(&self) {
        if let Some(ticker) = self.ticker.lock().take() {
            ticker.abort();
            tracing::debug!("rate limiter stopped");
        }
    }

    pub fn is_shut_down(&self) -> bool {
        self.ticker.lock().is_none()
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_non_positive_rate_uses_default() {
        let limiter = RateLimiter::new(0);
        assert_eq!(limiter.per_second(), DEFAULT_RATE);
    }

    #[tokio::test]
    async fn test_first_permit_is_immediate() {
        let limiter = RateLimiter::new(1);
        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(100));
    }

    #[tokio::test]
    async fn test_throughput_is_bounded() {
        // 5 permits at 20/s need at least 4 ticks of 50ms
        let limiter = RateLimiter::new(20);
        let start = Instant::now();
        for _ in 0..5 {
            limiter.acquire().await;
        }
        assert!(start.elapsed() >= Duration::from_millis(190));
    }

    #[tokio::test]
    async fn test_idle_period_does_not_accumulate_permits() {
        let limiter = RateLimiter::new(10);
        tokio::time::sleep(Duration::from_millis(320)).await;

        let start = Instant::now();
        limiter.acquire().await;
        assert!(start.elapsed() < Duration::from_millis(50));

        let second = Instant::now();
        limiter.acquire().await;
        assert!(second.elapsed() >= Duration::from_millis(40));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_the_cap() {
        let limiter = Arc::new(RateLimiter::new(20));
        let start = Instant::now();

        let handles: Vec<_> = (0..6)
            .map(|_| {
                let limiter = Arc::clone(&limiter);
                tokio::spawn(async move { limiter.acquire().await })
            })
            .collect();
        for handle in handles {
            handle.await.unwrap();
        }

        assert!(start.elapsed() >= Duration::from_millis(240));
    }

    #[tokio::test]
    async fn test_shutdown_is_idempotent() {
        let limiter = RateLimiter::new(5);
        assert!(!limiter.is_shut_down());
        limiter.shutdown();
        limiter.shutdown();
        assert!(limiter.is_shut_down());

        // Drains the initial permit, then passes through
        limiter.acquire().await;
        tokio::time::timeout(Duration::from_millis(100), limiter.acquire())
            .await
            .unwrap();
    }
}
