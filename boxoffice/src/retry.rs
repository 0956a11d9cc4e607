//! Caller-side retry for congestion failures.
//!
//! Only [`ErrorKind::Busy`](crate::errors::ErrorKind::Busy) is retried:
//! a busy partition means the request was fine and the system congested, so
//! repeating it verbatim is safe. Every other kind needs a changed request
//! or a human decision, and retrying would just repeat the failure.

use std::future::Future;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::RetryConfig;
use crate::errors::Classify;

/// Runs `operation`, retrying while it fails with a retryable kind.
///
/// Delays follow exponential backoff with ±25% jitter so a herd of callers
/// contending for the same show spreads out instead of stampeding in sync.
/// The first attempt is immediate; at most `config.max_attempts()` attempts
/// are made in total, and the last error is returned unchanged when they
/// are exhausted.
pub async fn retry_on_busy<T, E, F, Fut>(config: &RetryConfig, mut operation: F) -> Result<T, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: Classify + std::fmt::Display,
{
    let max_attempts = u32::from(config.max_attempts());
    let mut attempt = 1u32;
    loop {
        match operation().await {
            Ok(value) => {
                if attempt > 1 {
                    debug!(attempt, "operation succeeded after retry");
                }
                return Ok(value);
            }
            Err(error) if error.kind().is_retryable() && attempt < max_attempts => {
                let delay = backoff_delay(config, attempt);
                warn!(attempt, delay = ?delay, %error, "operation busy, backing off");
                tokio::time::sleep(delay).await;
                attempt += 1;
            }
            Err(error) => return Err(error),
        }
    }
}

/// Delay before the attempt following `attempt` (1-based).
fn backoff_delay(config: &RetryConfig, attempt: u32) -> Duration {
    use rand::Rng;

    let base = as_millis_f64(config.base_delay().as_duration());
    let max = as_millis_f64(config.max_delay().as_duration());
    let factor: f64 = config.multiplier().into();

    let exponent = i32::try_from(attempt.saturating_sub(1)).unwrap_or(i32::MAX);
    let delay = (base * factor.powi(exponent)).min(max);

    // ±25% jitter around the nominal delay.
    let mut rng = rand::rng();
    let jitter = delay * 0.25 * (rng.random::<f64>() - 0.5) * 2.0;
    let clamped = (delay + jitter).clamp(0.0, max);

    Duration::from_secs_f64(clamped / 1000.0)
}

fn as_millis_f64(duration: Duration) -> f64 {
    duration.as_secs_f64() * 1000.0
}
