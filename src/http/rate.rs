use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinHandle;
use tokio::time::{MissedTickBehavior, interval};

use crate::error::{AppError, AppResult, ValidationError};

/// Permits that may accumulate while nobody is waiting. Keeping this at one
/// spaces requests evenly instead of releasing a burst after an idle spell.
const MAX_STORED_PERMITS: usize = 1;

/// Token bucket refilled by a ticker task at a fixed period.
///
/// The first permit is available immediately; every following permit is
/// released one period after the previous tick.
pub struct RateLimiter {
    permits: Arc<Semaphore>,
    period: Duration,
    refill: JoinHandle<()>,
}

impl RateLimiter {
    /// Starts a limiter issuing `rate_per_sec` permits per second.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an error when `rate_per_sec` is not a positive finite number.
    pub fn per_second(rate_per_sec: f64) -> AppResult<Self> {
        let period = period_for_rate(rate_per_sec)?;
        let permits = Arc::new(Semaphore::new(0));
        let refill = spawn_fixed_rate_refill(permits.clone(), period);
        Ok(Self {
            permits,
            period,
            refill,
        })
    }

    /// Waits until one more request fits under the configured rate.
    pub async fn acquire(&self) {
        // The semaphore is never closed while `self` is alive.
        if let Ok(permit) = self.permits.acquire().await {
            permit.forget();
        }
    }

    #[must_use]
    pub const fn period(&self) -> Duration {
        self.period
    }
}

impl Drop for RateLimiter {
    fn drop(&mut self) {
        self.refill.abort();
    }
}

fn period_for_rate(rate_per_sec: f64) -> AppResult<Duration> {
    if !rate_per_sec.is_finite() || rate_per_sec <= 0.0 {
        return Err(AppError::validation(ValidationError::InvalidRate {
            value: rate_per_sec.to_string(),
        }));
    }
    Duration::try_from_secs_f64(rate_per_sec.recip()).map_err(|_err| {
        AppError::validation(ValidationError::InvalidRate {
            value: rate_per_sec.to_string(),
        })
    })
}

fn spawn_fixed_rate_refill(permits: Arc<Semaphore>, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut rate_tick = interval(period.max(Duration::from_micros(1)));
        rate_tick.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            rate_tick.tick().await;
            let available = permits.available_permits();
            if available < MAX_STORED_PERMITS {
                permits.add_permits(MAX_STORED_PERMITS.saturating_sub(available));
            }
        }
    })
}
