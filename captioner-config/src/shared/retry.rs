use serde::{Deserialize, Serialize};

/// Retry policy configuration for idempotent startup operations such as
/// applying the bucket access policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of attempts before giving up.
    pub max_attempts: u32,

    /// Delay, in milliseconds, before the first retry.
    ///
    /// The delay doubles after every failed attempt.
    pub base_delay_ms: u64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay_ms: 1_000,
        }
    }
}
