use rand::Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum RetryError {
    #[error("Invalid retry configuration: {0}")]
    InvalidConfig(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RetryStrategy {
    #[default]
    ExponentialBackoff,
    LinearBackoff,
    FixedDelay,
}

/// Backoff schedule for re-publishing events the service asked us to retry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub strategy: RetryStrategy,
    pub jitter: bool,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 20,
            base_delay: Duration::from_millis(500),
            max_delay: Duration::from_secs(60),
            strategy: RetryStrategy::ExponentialBackoff,
            jitter: true,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), RetryError> {
        if self.max_attempts == 0 {
            return Err(RetryError::InvalidConfig(
                "max attempts must be greater than 0".to_string(),
            ));
        }
        if self.base_delay > self.max_delay {
            return Err(RetryError::InvalidConfig(format!(
                "base delay {:?} exceeds max delay {:?}",
                self.base_delay, self.max_delay
            )));
        }
        Ok(())
    }

    /// True once `attempt` retries have been spent.
    pub fn exhausted(&self, attempt: u32) -> bool {
        attempt >= self.max_attempts
    }

    /// Delay before retry number `attempt` (0-based), capped at `max_delay`.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let base_ms = self.base_delay.as_millis() as u64;
        let delay_ms = match self.strategy {
            RetryStrategy::ExponentialBackoff => {
                let multiplier = 1_u64.checked_shl(attempt).unwrap_or(u64::MAX);
                base_ms.saturating_mul(multiplier)
            }
            RetryStrategy::LinearBackoff => base_ms.saturating_mul(u64::from(attempt) + 1),
            RetryStrategy::FixedDelay => base_ms,
        };

        let capped = Duration::from_millis(delay_ms).min(self.max_delay);

        if self.jitter {
            apply_jitter(capped)
        } else {
            capped
        }
    }
}

fn apply_jitter(delay: Duration) -> Duration {
    let mut rng = rand::rng();
    let jitter_factor = rng.random_range(0.5..1.5); // ±50% jitter
    Duration::from_millis((delay.as_millis() as f64 * jitter_factor) as u64)
}
