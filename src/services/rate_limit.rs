// src/services/rate_limit.rs

//! Caller-facing rate limiting for batch link checks.
//!
//! A keyed GCRA limiter (token bucket equivalent) allows each caller a burst
//! of `n` batch checks, refilled evenly over an hour.

use std::fmt;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicU64, Ordering};

use governor::clock::{Clock, DefaultClock};
use governor::{DefaultKeyedRateLimiter, Quota, RateLimiter};

use crate::error::{AppError, Result};
use crate::models::RateLimitConfig;

/// Checks between sweeps of fully refilled callers.
const PRUNE_EVERY: u64 = 256;

/// Per-caller allowance for `check_post_batch` invocations.
pub struct BatchRateLimiter {
    limiter: DefaultKeyedRateLimiter<String>,
    clock: DefaultClock,
    per_hour: u32,
    checks: AtomicU64,
}

impl fmt::Debug for BatchRateLimiter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BatchRateLimiter")
            .field("per_hour", &self.per_hour)
            .field("tracked_callers", &self.tracked_callers())
            .finish()
    }
}

impl BatchRateLimiter {
    /// Allow `per_hour` batch checks per caller per hour.
    pub fn per_hour(per_hour: u32) -> Result<Self> {
        let quota = NonZeroU32::new(per_hour)
            .ok_or_else(|| AppError::validation("batch checks per hour must be > 0"))?;
        Ok(Self {
            limiter: RateLimiter::keyed(Quota::per_hour(quota)),
            clock: DefaultClock::default(),
            per_hour,
            checks: AtomicU64::new(0),
        })
    }

    pub fn from_config(config: &RateLimitConfig) -> Result<Self> {
        Self::per_hour(config.batch_checks_per_hour)
    }

    pub fn limit_per_hour(&self) -> u32 {
        self.per_hour
    }

    /// Callers currently holding limiter state.
    pub fn tracked_callers(&self) -> usize {
        self.limiter.len()
    }

    /// Consume one allowance for `caller`.
    ///
    /// Every `PRUNE_EVERY` checks, state for idle callers is dropped.
    pub fn check(&self, caller: &str) -> Result<()> {
        let seen = self.checks.fetch_add(1, Ordering::Relaxed) + 1;
        if seen % PRUNE_EVERY == 0 {
            self.prune();
        }

        self.limiter
            .check_key(&caller.to_string())
            .map_err(|not_until| {
                let wait = not_until.wait_time_from(self.clock.now());
                log::warn!(
                    "Batch check rate limit hit for '{}', next slot in {:?}",
                    caller,
                    wait
                );
                AppError::RateLimited {
                    caller: caller.to_string(),
                    retry_after_secs: wait.as_secs().max(1),
                }
            })
    }

    /// Drop state for callers whose allowance has fully refilled.
    pub fn prune(&self) {
        self.limiter.retain_recent();
    }
}
