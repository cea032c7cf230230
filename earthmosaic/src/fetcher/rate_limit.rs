//! Request pacing and retry policy.
//!
//! The imagery endpoint throttles or bans clients that request too quickly,
//! so consecutive downloads are separated by `min_delay` plus a uniformly
//! distributed jitter.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;

/// Default minimum pause between two downloads.
pub const DEFAULT_MIN_DELAY: Duration = Duration::from_secs(1);

/// Default upper bound of the random extra pause.
pub const DEFAULT_JITTER: Duration = Duration::from_secs(1);

/// Upper bound for a single backoff pause.
pub const MAX_BACKOFF: Duration = Duration::from_secs(60);

/// Something that can block the current thread for a while.
///
/// Injected so tests can observe pauses without waiting for them.
pub trait Sleeper: Send + Sync {
    fn sleep(&self, duration: Duration);
}

/// [`Sleeper`] backed by `std::thread::sleep`.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Spaces out consecutive provider requests.
#[derive(Clone)]
pub struct RateLimiter {
    min_delay: Duration,
    jitter: Duration,
    sleeper: Arc<dyn Sleeper>,
}

impl RateLimiter {
    /// Creates a limiter that sleeps `min_delay + uniform(0, jitter)` per pause.
    pub fn new(min_delay: Duration, jitter: Duration) -> Self {
        Self {
            min_delay,
            jitter,
            sleeper: Arc::new(ThreadSleeper),
        }
    }

    /// A limiter that never pauses.
    pub fn unlimited() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    /// Replaces the sleeper.
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn min_delay(&self) -> Duration {
        self.min_delay
    }

    pub fn jitter(&self) -> Duration {
        self.jitter
    }

    pub fn sleeper(&self) -> &dyn Sleeper {
        self.sleeper.as_ref()
    }

    /// Draws the next pause length.
    pub fn next_delay(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.min_delay;
        }
        let fraction: f64 = rand::rng().random();
        self.min_delay + self.jitter.mul_f64(fraction)
    }

    /// Blocks for the next pause length and returns it.
    pub fn pause(&self) -> Duration {
        let delay = self.next_delay();
        if !delay.is_zero() {
            self.sleeper.sleep(delay);
        }
        delay
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(DEFAULT_MIN_DELAY, DEFAULT_JITTER)
    }
}

/// Bounded exponential backoff applied to a single patch before giving up.
///
/// With `max_retries == 0` the first failure aborts the pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    /// Abort on the first failure.
    pub fn fail_fast() -> Self {
        Self {
            max_retries: 0,
            base_delay: Duration::ZERO,
        }
    }

    pub fn new(max_retries: u32, base_delay: Duration) -> Self {
        Self {
            max_retries,
            base_delay,
        }
    }

    /// Pause before retry number `attempt + 1`: `base_delay · 2^attempt`, capped.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.base_delay
            .checked_mul(factor)
            .unwrap_or(MAX_BACKOFF)
            .min(MAX_BACKOFF)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::fail_fast()
    }
}
