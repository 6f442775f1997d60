//! Bounded polling with an injectable sleeper.
//!
//! Every wait in the engine goes through [`poll_until`], so the whole
//! timeout budget is `max_attempts * interval` and tests can run it
//! without real elapsed time.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use crate::config::PollingConfig;

/// Fixed-iteration poll budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl PollPolicy {
    pub const fn new(max_attempts: u32, interval: Duration) -> Self {
        Self {
            max_attempts,
            interval,
        }
    }

    /// Budget for spot price polls (10 x 100ms by default).
    #[must_use]
    pub fn price(config: &PollingConfig) -> Self {
        Self::new(config.price_attempts, Duration::from_millis(config.interval_ms))
    }

    /// Budget for model-greeks polls (30 x 100ms by default).
    #[must_use]
    pub fn greeks(config: &PollingConfig) -> Self {
        Self::new(
            config.greeks_attempts,
            Duration::from_millis(config.interval_ms),
        )
    }

    /// Worst-case time spent sleeping.
    #[must_use]
    pub fn budget(&self) -> Duration {
        self.interval * self.max_attempts
    }
}

/// Suspension point between poll attempts.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeps on the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Sleeps, then probes, up to `policy.max_attempts` times.
///
/// Returns the first `Some` the probe yields, `None` once the budget is
/// spent. A probe error ends polling immediately and is returned as-is.
pub async fn poll_until<T, E, F, Fut>(
    policy: PollPolicy,
    sleeper: &dyn Sleeper,
    mut probe: F,
) -> Result<Option<T>, E>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<T>, E>>,
{
    for attempt in 1..=policy.max_attempts {
        sleeper.sleep(policy.interval).await;
        if let Some(value) = probe().await? {
            debug!(attempt, "Poll satisfied");
            return Ok(Some(value));
        }
    }
    debug!(attempts = policy.max_attempts, "Poll budget exhausted");
    Ok(None)
}
