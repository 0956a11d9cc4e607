//! Type-safe configuration for contention bounds and retry behavior.
//!
//! All knobs are `nutype`-validated at construction, so an absurd timeout or
//! a runaway backoff multiplier is unrepresentable rather than a runtime
//! surprise.

use std::time::Duration;

use nutype::nutype;
use serde::{Deserialize, Serialize};

/// How long a caller may wait for a show or showroom partition lock before
/// the operation fails as busy.
///
/// Validated to be between 10ms and 60 seconds: long enough to ride out a
/// commit, short enough that nothing blocks indefinitely.
#[nutype(
    validate(greater_or_equal = 10, less_or_equal = 60_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct LockTimeoutMs(u64);

impl LockTimeoutMs {
    /// Convert to a `Duration` for use with `tokio::time::timeout`.
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.into())
    }

    /// The raw millisecond value, for error payloads and logs.
    pub fn as_millis(self) -> u64 {
        self.into()
    }
}

/// Maximum number of attempts the busy-retry helper will make.
///
/// Validated to be between 1 and 10 to prevent unbounded retry loops.
#[nutype(
    validate(greater_or_equal = 1, less_or_equal = 10),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct MaxRetryAttempts(u32);

/// Base delay between retry attempts in milliseconds.
///
/// Validated to be between 10ms and 10 seconds.
#[nutype(
    validate(greater_or_equal = 10, less_or_equal = 10_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct RetryBaseDelayMs(u64);

impl RetryBaseDelayMs {
    /// Convert to a `Duration` for use with `tokio::time::sleep`.
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.into())
    }
}

/// Cap on the delay between retry attempts in milliseconds.
///
/// Validated to be between 100ms and 5 minutes so exponential backoff
/// plateaus instead of growing without bound.
#[nutype(
    validate(greater_or_equal = 100, less_or_equal = 300_000),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        Eq,
        PartialOrd,
        Ord,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct RetryMaxDelayMs(u64);

impl RetryMaxDelayMs {
    /// Convert to a `Duration`.
    pub fn as_duration(self) -> Duration {
        Duration::from_millis(self.into())
    }
}

/// Exponential backoff multiplier between attempts.
///
/// Validated to be between 1.1 and 3.0: genuine exponential growth without
/// absurd waits.
#[nutype(
    validate(finite, greater_or_equal = 1.1, less_or_equal = 3.0),
    derive(
        Debug,
        Clone,
        Copy,
        PartialEq,
        PartialOrd,
        Into,
        Serialize,
        Deserialize
    )
)]
pub struct BackoffMultiplier(f64);

/// Contention bound shared by the schedule planner and reservation ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentionConfig {
    lock_timeout: LockTimeoutMs,
}

impl ContentionConfig {
    /// Builds a config with an explicit lock timeout.
    pub const fn new(lock_timeout: LockTimeoutMs) -> Self {
        Self { lock_timeout }
    }

    /// Replaces the lock timeout.
    #[must_use]
    pub const fn with_lock_timeout(mut self, lock_timeout: LockTimeoutMs) -> Self {
        self.lock_timeout = lock_timeout;
        self
    }

    /// The longest a caller waits for a partition lock.
    pub const fn lock_timeout(&self) -> LockTimeoutMs {
        self.lock_timeout
    }
}

impl Default for ContentionConfig {
    /// 5 second lock timeout: generous for in-memory commits, bounded for
    /// callers.
    fn default() -> Self {
        Self {
            lock_timeout: LockTimeoutMs::try_new(5_000).expect("default lock timeout is in bounds"),
        }
    }
}

/// Configuration for [`crate::retry::retry_on_busy`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RetryConfig {
    max_attempts: MaxRetryAttempts,
    base_delay: RetryBaseDelayMs,
    max_delay: RetryMaxDelayMs,
    multiplier: BackoffMultiplier,
}

impl RetryConfig {
    /// Replaces the attempt cap.
    #[must_use]
    pub const fn with_max_attempts(mut self, max_attempts: MaxRetryAttempts) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Replaces the base delay.
    #[must_use]
    pub const fn with_base_delay(mut self, base_delay: RetryBaseDelayMs) -> Self {
        self.base_delay = base_delay;
        self
    }

    /// Replaces the delay cap.
    #[must_use]
    pub const fn with_max_delay(mut self, max_delay: RetryMaxDelayMs) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Replaces the backoff multiplier.
    #[must_use]
    pub const fn with_multiplier(mut self, multiplier: BackoffMultiplier) -> Self {
        self.multiplier = multiplier;
        self
    }

    /// Total attempts allowed, including the first.
    pub const fn max_attempts(&self) -> MaxRetryAttempts {
        self.max_attempts
    }

    /// Delay before the second attempt.
    pub const fn base_delay(&self) -> RetryBaseDelayMs {
        self.base_delay
    }

    /// Ceiling on any single delay.
    pub const fn max_delay(&self) -> RetryMaxDelayMs {
        self.max_delay
    }

    /// Growth factor between consecutive delays.
    pub const fn multiplier(&self) -> BackoffMultiplier {
        self.multiplier
    }
}

impl Default for RetryConfig {
    /// 3 attempts, 100ms base delay, 30s cap, doubling between attempts.
    fn default() -> Self {
        Self {
            max_attempts: MaxRetryAttempts::try_new(3).expect("default attempts are in bounds"),
            base_delay: RetryBaseDelayMs::try_new(100).expect("default base delay is in bounds"),
            max_delay: RetryMaxDelayMs::try_new(30_000).expect("default max delay is in bounds"),
            multiplier: BackoffMultiplier::try_new(2.0).expect("default multiplier is in bounds"),
        }
    }
}
