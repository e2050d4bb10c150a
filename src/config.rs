//! Configuration for the failover loop
//!
//! Mirrors the retry policy of the original deployment: 3 attempts per
//! credential, 1500 ms initial backoff, doubling per attempt.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Retry and backoff configuration for a failover run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailoverConfig {
    /// Maximum attempts per credential before rotating to the next one.
    pub max_attempts: usize,

    /// Exponential backoff multiplier applied per attempt.
    pub backoff_multiplier: f32,

    // Durations serialize as TOML tables, so they sit after the scalars.
    /// Delay before the first retry of a credential.
    pub initial_backoff: Duration,

    /// Cap on any single backoff sleep.
    pub max_backoff: Duration,
}

impl Default for FailoverConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_multiplier: 2.0,
            initial_backoff: Duration::from_millis(1500),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl FailoverConfig {
    /// Backoff delay after the given zero-based attempt index.
    ///
    /// `initial_backoff * multiplier^index`, clamped to `max_backoff`. With
    /// defaults the sequence is 1500 ms, 3000 ms, 6000 ms.
    pub fn backoff_delay(&self, attempt_index: usize) -> Duration {
        // Clamp in float space: large exponents saturate at the cap instead
        // of overflowing Duration, which would panic mid-failover.
        let mult = (self.backoff_multiplier as f64).powi(attempt_index as i32);
        let delay_secs = self.initial_backoff.as_secs_f64() * mult;
        let capped = delay_secs.min(self.max_backoff.as_secs_f64()).max(0.0);
        Duration::from_secs_f64(capped)
    }
}

/// Load configuration from environment variables.
///
/// Recognizes `FAILOVER_MAX_ATTEMPTS`, `FAILOVER_INITIAL_BACKOFF_MS` and
/// `FAILOVER_BACKOFF_MULTIPLIER`; anything unset or unparsable keeps its
/// default.
pub fn from_env() -> FailoverConfig {
    let mut config = FailoverConfig::default();

    if let Ok(attempts) = std::env::var("FAILOVER_MAX_ATTEMPTS") {
        if let Ok(n) = attempts.parse::<usize>() {
            config.max_attempts = n;
        }
    }

    if let Ok(backoff) = std::env::var("FAILOVER_INITIAL_BACKOFF_MS") {
        if let Ok(ms) = backoff.parse::<u64>() {
            config.initial_backoff = Duration::from_millis(ms);
        }
    }

    if let Ok(multiplier) = std::env::var("FAILOVER_BACKOFF_MULTIPLIER") {
        if let Ok(factor) = multiplier.parse::<f32>() {
            config.backoff_multiplier = factor;
        }
    }

    config
}

/// Load configuration from a TOML file.
pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<FailoverConfig> {
    let contents = std::fs::read_to_string(path)?;
    let config: FailoverConfig = toml::from_str(&contents)?;
    Ok(config)
}
