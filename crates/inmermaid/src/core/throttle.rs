use std::collections::VecDeque;
use std::sync::Arc;

use once_cell::sync::Lazy;
use tokio::sync::Mutex;
use tokio::time::{Duration, Instant};

use crate::core::config;

/// Sliding-window throttle shared across all inline queries.
///
/// Allows at most `max_calls` acquisitions within any `window`. Callers that
/// arrive while the window is full wait until the oldest call ages out.
/// Direct messages bypass this; only inline mode is throttled because a
/// single typed query can fire many updates in quick succession.
#[derive(Clone)]
pub struct Throttle {
    /// Timestamps of calls still inside the window, oldest first
    calls: Arc<Mutex<VecDeque<Instant>>>,
    max_calls: usize,
    window: Duration,
}

impl Throttle {
    /// Creates a throttle admitting `max_calls` per `window`.
    ///
    /// # Example
    ///
    /// ```no_run
    /// use std::time::Duration;
    /// use inmermaid::core::throttle::Throttle;
    ///
    /// let throttle = Throttle::new(2, Duration::from_secs(1));
    /// ```
    pub fn new(max_calls: usize, window: Duration) -> Self {
        Self {
            calls: Arc::new(Mutex::new(VecDeque::new())),
            max_calls,
            window,
        }
    }

    /// Waits for a free slot and records the call.
    ///
    /// Returns once the call has been admitted. Ordering between concurrent
    /// waiters is approximate, not FIFO.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use std::time::Duration;
    /// # use inmermaid::core::throttle::Throttle;
    /// # async fn example() {
    /// let throttle = Throttle::new(2, Duration::from_secs(1));
    /// throttle.acquire().await;
    /// // proceed with the rate-limited work
    /// # }
    /// ```
    pub async fn acquire(&self) {
        loop {
            let wait = {
                let mut calls = self.calls.lock().await;
                let now = Instant::now();
                while let Some(&front) = calls.front() {
                    if now.duration_since(front) >= self.window {
                        calls.pop_front();
                    } else {
                        break;
                    }
                }
                if calls.len() < self.max_calls {
                    calls.push_back(now);
                    None
                } else {
                    calls
                        .front()
                        .map(|&front| self.window.saturating_sub(now.duration_since(front)))
                }
            };
            match wait {
                None => return,
                Some(wait) => tokio::time::sleep(wait).await,
            }
        }
    }

    /// Number of calls currently counted against the window.
    pub async fn in_flight(&self) -> usize {
        let mut calls = self.calls.lock().await;
        let now = Instant::now();
        while let Some(&front) = calls.front() {
            if now.duration_since(front) >= self.window {
                calls.pop_front();
            } else {
                break;
            }
        }
        calls.len()
    }
}

/// Global throttle for inline-query rendering.
pub static INLINE_THROTTLE: Lazy<Throttle> = Lazy::new(|| {
    Throttle::new(
        config::inline::THROTTLE_MAX_CALLS,
        config::inline::throttle_window(),
    )
});
