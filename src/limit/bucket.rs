//! # Token bucket.
//!
//! The bucket starts full (`burst` tokens) and refills continuously at the
//! configured [`Limit`]. Refill is computed lazily from the time elapsed since
//! the last observation, so an idle limiter costs nothing.
//!
//! `wait` reserves a token up front and may drive the balance negative; the
//! caller then sleeps for exactly the deficit. A cancelled waiter hands its
//! reservation back.

use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::multi::RateLimit;
use super::rate::Limit;
use crate::error::{ConfigError, LimitError};

#[derive(Debug)]
struct Bucket {
    tokens: f64,
    last: Instant,
}

/// Single-tier token bucket limiter.
#[derive(Debug)]
pub struct Limiter {
    limit: Limit,
    burst: u32,
    bucket: Mutex<Bucket>,
}

impl Limiter {
    /// Creates a full bucket of `burst` tokens refilled at `limit`.
    ///
    /// Rejects a negative or NaN limit, and a zero burst for a finite,
    /// non-zero limit (such a bucket could never grant).
    pub fn new(limit: Limit, burst: u32) -> Result<Self, ConfigError> {
        let rate = limit.per_second();
        if rate.is_nan() || rate < 0.0 {
            return Err(ConfigError::InvalidLimit { limit: rate });
        }
        if burst == 0 && !limit.is_inf() && rate > 0.0 {
            return Err(ConfigError::ZeroBurst);
        }
        Ok(Self {
            limit,
            burst,
            bucket: Mutex::new(Bucket {
                tokens: f64::from(burst),
                last: Instant::now(),
            }),
        })
    }

    pub fn burst(&self) -> u32 {
        self.burst
    }

    /// Takes a token if one is available right now.
    pub fn try_acquire(&self) -> bool {
        if self.limit.is_inf() {
            return true;
        }
        let mut bucket = self.refilled();
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return true;
        }
        false
    }

    /// Tokens currently in the bucket (negative while waiters hold reservations).
    pub fn available(&self) -> f64 {
        if self.limit.is_inf() {
            return f64::INFINITY;
        }
        self.refilled().tokens
    }

    fn refilled(&self) -> MutexGuard<'_, Bucket> {
        let mut bucket = self.bucket.lock().unwrap_or_else(PoisonError::into_inner);
        let now = Instant::now();
        let elapsed = now.saturating_duration_since(bucket.last);
        bucket.tokens = (bucket.tokens + self.limit.tokens_for(elapsed)).min(f64::from(self.burst));
        bucket.last = now;
        bucket
    }

    fn reserve(&self) -> Result<Option<Instant>, LimitError> {
        let mut bucket = self.refilled();
        if bucket.tokens >= 1.0 {
            bucket.tokens -= 1.0;
            return Ok(None);
        }
        if self.limit.per_second() == 0.0 {
            return Err(LimitError::Starved);
        }
        bucket.tokens -= 1.0;
        let ready = bucket.last + self.limit.duration_for(-bucket.tokens);
        Ok(Some(ready))
    }

    fn unreserve(&self) {
        let mut bucket = self.refilled();
        bucket.tokens = (bucket.tokens + 1.0).min(f64::from(self.burst));
    }
}

#[async_trait]
impl RateLimit for Limiter {
    async fn wait(&self, ctx: &CancellationToken) -> Result<(), LimitError> {
        if ctx.is_cancelled() {
            return Err(LimitError::Canceled);
        }
        if self.limit.is_inf() {
            return Ok(());
        }
        let Some(ready) = self.reserve()? else {
            return Ok(());
        };
        tokio::select! {
            biased;
            _ = ctx.cancelled() => {
                self.unreserve();
                Err(LimitError::Canceled)
            }
            _ = time::sleep_until(ready) => Ok(()),
        }
    }

    fn limit(&self) -> Limit {
        self.limit
    }
}
