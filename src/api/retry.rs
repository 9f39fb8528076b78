use std::fmt;
use std::future::Future;
use std::time::Duration;
use thiserror::Error;
use tokio::time::sleep;

/// How a failed attempt should be treated by [`RetryPolicy::run`]
#[derive(Debug)]
pub enum Attempt<E> {
    /// Server asked us to slow down: wait the cooldown, no exponential growth
    RateLimited(E),
    /// Timeout or transport hiccup: wait `base_delay * 2^attempt`
    Transient(E),
    /// Retrying cannot help, give up immediately
    Fatal(E),
}

#[derive(Debug, Error)]
pub enum RetryError<E> {
    #[error("{0}")]
    Fatal(E),
    #[error("all {attempts} attempts failed, last error: {last}")]
    Exhausted { attempts: u32, last: E },
}

/// Bounded retry loop shared by every API request
///
/// Rate-limit waits and backoff waits draw from the same attempt budget.
#[derive(Debug, Clone)]
pub struct RetryPolicy {
    max_attempts: u32,
    base_delay: Duration,
    rate_limit_cooldown: Duration,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, base_delay: Duration, rate_limit_cooldown: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            base_delay,
            rate_limit_cooldown,
        }
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Delay after the transient failure of attempt `attempt` (0-based)
    pub fn backoff_delay(&self, attempt: u32) -> Duration {
        self.base_delay
            .saturating_mul(2_u32.saturating_pow(attempt.min(16)))
    }

    /// Run `op` until it succeeds, fails fatally, or the budget is spent
    ///
    /// `op` receives the 0-based attempt index. No wait happens after the
    /// final attempt.
    pub async fn run<T, E, F, Fut>(&self, label: &str, mut op: F) -> Result<T, RetryError<E>>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T, Attempt<E>>>,
        E: fmt::Display,
    {
        let mut attempt = 0;

        loop {
            let failure = match op(attempt).await {
                Ok(value) => {
                    if attempt > 0 {
                        log::info!(
                            "✅ {} succeeded on attempt {}/{}",
                            label,
                            attempt + 1,
                            self.max_attempts
                        );
                    }
                    return Ok(value);
                }
                Err(failure) => failure,
            };

            let (delay, error) = match failure {
                Attempt::Fatal(e) => {
                    log::error!("❌ {} failed permanently: {}", label, e);
                    return Err(RetryError::Fatal(e));
                }
                Attempt::RateLimited(e) => {
                    log::warn!(
                        "⏳ {} rate limited ({}), cooling down {}s (attempt {}/{})",
                        label,
                        e,
                        self.rate_limit_cooldown.as_secs(),
                        attempt + 1,
                        self.max_attempts
                    );
                    (self.rate_limit_cooldown, e)
                }
                Attempt::Transient(e) => {
                    let delay = self.backoff_delay(attempt);
                    log::warn!(
                        "⏳ {} failed ({}), attempt {}/{}",
                        label,
                        e,
                        attempt + 1,
                        self.max_attempts
                    );
                    (delay, e)
                }
            };

            if attempt + 1 >= self.max_attempts {
                log::error!("❌ All retry attempts failed for {}", label);
                return Err(RetryError::Exhausted {
                    attempts: self.max_attempts,
                    last: error,
                });
            }

            log::debug!("Retrying {} in {}ms", label, delay.as_millis());
            sleep(delay).await;
            attempt += 1;
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(1), Duration::from_secs(60))
    }
}
