//! Retry policy: how many attempts per item, and the backoff between them.

use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const DEFAULT_MAX_DELAY: Duration = Duration::from_secs(30);

/// Retry policy for items whose processor returned a transient error.
///
/// Non-transient errors are never retried, whatever `max_attempts` says.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Total attempts per item, including the first. 1 disables retry.
    pub max_attempts: u32,

    /// Delay before the first retry.
    #[serde(with = "millis")]
    pub base_delay: Duration,

    /// Backoff multiplier for exponential backoff. `PoolConfig::validate`
    /// rejects anything non-finite or below 1.0.
    pub multiplier: f64,

    /// Upper bound for a single backoff delay.
    #[serde(with = "millis")]
    pub max_delay: Duration,
}

impl RetryPolicy {
    /// No retry: one attempt per item.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            base_delay: Duration::from_millis(100),
            multiplier: 2.0,
            max_delay: DEFAULT_MAX_DELAY,
        }
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay(mut self, base_delay: Duration) -> Self {
        self.base_delay = base_delay;
        self
    }

    pub fn with_multiplier(mut self, multiplier: f64) -> Self {
        self.multiplier = multiplier;
        self
    }

    pub fn with_max_delay(mut self, max_delay: Duration) -> Self {
        self.max_delay = max_delay;
        self
    }

    /// Should a failure on attempt `attempt` (1-indexed) be retried?
    pub fn allows_retry_after(&self, attempt: u32) -> bool {
        attempt < self.max_attempts
    }

    /// Delay before the retry that follows attempt `attempts` (1-indexed).
    ///
    /// delay = base_delay * multiplier^(attempts - 1)
    ///
    /// Example with base_delay=100ms, multiplier=2.0:
    /// - after attempt 1: 100ms
    /// - after attempt 2: 200ms
    /// - after attempt 3: 400ms
    ///
    /// Never exceeds `max_delay`. A result that is not a valid duration
    /// (negative, NaN, too large) also falls back to `max_delay`.
    pub fn next_delay(&self, attempts: u32) -> Duration {
        let exponent = i32::try_from(attempts.saturating_sub(1)).unwrap_or(i32::MAX);
        let delay_secs = self.base_delay.as_secs_f64() * self.multiplier.powi(exponent);
        Duration::try_from_secs_f64(delay_secs)
            .unwrap_or(self.max_delay)
            .min(self.max_delay)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::none()
    }
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u64(d.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Duration, D::Error> {
        u64::deserialize(d).map(Duration::from_millis)
    }
}
