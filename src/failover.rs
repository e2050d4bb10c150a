//! Credentialed invocation failover
//!
//! Runs a caller-supplied unit of work against each credential in a pool
//! until one attempt succeeds. Transient overload errors are retried against
//! the same credential with exponential backoff; auth rejections rotate to
//! the next credential immediately; anything else aborts the whole run.
//!
//! Attempts are strictly sequential; speculative parallel attempts against a
//! metered API would waste quota. The backoff sleep is the only suspension
//! point, so dropping the returned future cancels the run mid-backoff.

use std::future::Future;

use tokio::time::sleep;
use tower::BoxError;
use tracing::{debug, warn};

use crate::classify::{classify, ErrorKind};
use crate::config::FailoverConfig;
use crate::credentials::{Credential, CredentialPool};
use crate::error::FailoverError;

/// Execute `work` with failover across the credential pool.
///
/// Credentials are tried in pool order. Per credential, up to
/// `config.max_attempts` attempts are made, sleeping
/// `config.backoff_delay(attempt - 1)` between overloaded attempts. The
/// first success wins; a `Fatal`-classified error propagates immediately;
/// if every credential is exhausted the most recent error is returned
/// verbatim.
pub async fn invoke_with_failover<T, F, Fut>(
    pool: &CredentialPool,
    config: &FailoverConfig,
    mut work: F,
) -> Result<T, BoxError>
where
    F: FnMut(Credential) -> Fut,
    Fut: Future<Output = Result<T, BoxError>>,
{
    let mut last_error: Option<BoxError> = None;
    // a zero-attempt budget still gets one attempt per credential
    let max_attempts = config.max_attempts.max(1);

    for (slot, credential) in pool.iter().enumerate() {
        let mut attempt = 0usize;
        while attempt < max_attempts {
            match work(credential.clone()).await {
                Ok(value) => {
                    if slot > 0 || attempt > 0 {
                        debug!(
                            credential = %credential.fingerprint(),
                            slot,
                            attempt = attempt + 1,
                            "call succeeded after failover"
                        );
                    }
                    return Ok(value);
                }
                Err(error) => match classify(&error) {
                    ErrorKind::Auth => {
                        warn!(
                            credential = %credential.fingerprint(),
                            slot,
                            error = %error,
                            "credential rejected, rotating to next"
                        );
                        last_error = Some(error);
                        break;
                    }
                    ErrorKind::Overloaded => {
                        attempt += 1;
                        if attempt < max_attempts {
                            let delay = config.backoff_delay(attempt - 1);
                            warn!(
                                credential = %credential.fingerprint(),
                                slot,
                                attempt,
                                ?delay,
                                error = %error,
                                "upstream overloaded, backing off"
                            );
                            last_error = Some(error);
                            sleep(delay).await;
                        } else {
                            debug!(
                                credential = %credential.fingerprint(),
                                slot,
                                "attempts exhausted, rotating to next credential"
                            );
                            last_error = Some(error);
                        }
                    }
                    ErrorKind::Fatal => {
                        debug!(error = %error, "non-retryable error, aborting failover");
                        return Err(error);
                    }
                },
            }
        }
    }

    warn!("all credentials exhausted without a successful call");
    Err(last_error.unwrap_or_else(|| FailoverError::EmptyCredentialPool.into()))
}

/// Builder for failover runs.
///
/// # Example
///
/// ```rust,no_run
/// use tower_failover::Failover;
///
/// # async fn call_model(_key: &str) -> Result<String, tower_failover::BoxError> {
/// #     Ok(String::new())
/// # }
/// # async fn example() -> Result<(), tower_failover::BoxError> {
/// let answer = Failover::from_config_str("key-a, key-b")?
///     .max_attempts(3)
///     .run(|credential| async move { call_model(credential.as_str()).await })
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Failover {
    pool: CredentialPool,
    config: FailoverConfig,
}

impl Failover {
    /// Build from an already-parsed pool.
    pub fn new(pool: CredentialPool) -> Self {
        Self {
            pool,
            config: FailoverConfig::default(),
        }
    }

    /// Build from a raw comma-separated credential string.
    pub fn from_config_str(raw: &str) -> Result<Self, FailoverError> {
        Ok(Self::new(CredentialPool::parse(raw)?))
    }

    /// Build from a credential list held in an environment variable.
    pub fn from_env(var: &str) -> Result<Self, FailoverError> {
        Ok(Self::new(CredentialPool::from_env(var)?))
    }

    /// Replace the whole retry configuration.
    pub fn config(mut self, config: FailoverConfig) -> Self {
        self.config = config;
        self
    }

    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.config.max_attempts = attempts;
        self
    }

    pub fn initial_backoff(mut self, delay: std::time::Duration) -> Self {
        self.config.initial_backoff = delay;
        self
    }

    pub fn backoff_multiplier(mut self, multiplier: f32) -> Self {
        self.config.backoff_multiplier = multiplier;
        self
    }

    /// The pool this runner walks.
    pub fn pool(&self) -> &CredentialPool {
        &self.pool
    }

    /// Run the unit of work under the failover policy.
    pub async fn run<T, F, Fut>(&self, work: F) -> Result<T, BoxError>
    where
        F: FnMut(Credential) -> Fut,
        Fut: Future<Output = Result<T, BoxError>>,
    {
        invoke_with_failover(&self.pool, &self.config, work).await
    }
}
