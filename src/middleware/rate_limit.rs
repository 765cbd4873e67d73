//! Per-client rate limiting for the payment endpoints

use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};
use std::num::NonZeroU32;

use crate::config::RateLimitConfig;
use crate::shared::error::{AppError, AppResult};

/// Keyed rate limiter shared by the mutating payment handlers
pub struct RateLimitMiddleware {
    limiter: Option<DefaultKeyedRateLimiter<String>>,
}

impl RateLimitMiddleware {
    pub fn new(config: &RateLimitConfig) -> Self {
        if !config.enabled {
            return Self { limiter: None };
        }

        let per_minute = NonZeroU32::new(config.requests_per_minute).unwrap_or(NonZeroU32::MIN);
        let burst = NonZeroU32::new(config.burst_size).unwrap_or(NonZeroU32::MIN);
        let quota = Quota::per_minute(per_minute).allow_burst(burst);

        Self {
            limiter: Some(RateLimiter::keyed(quota)),
        }
    }

    /// Check the quota for one client; `Err(AppError::RateLimit)` when the
    /// client is over budget.
    pub fn check(&self, client_ip: &str) -> AppResult<()> {
        match &self.limiter {
            Some(limiter) if limiter.check_key(&client_ip.to_string()).is_err() => {
                Err(AppError::RateLimit)
            }
            _ => Ok(()),
        }
    }
}
