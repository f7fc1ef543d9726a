use std::sync::Arc;

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use super::rate::Limit;
use crate::error::{ConfigError, LimitError};

/// # Anything that can make a caller wait for a permit.
///
/// Implemented by [`Limiter`](crate::Limiter) and [`MultiLimiter`], so tiers
/// nest freely.
#[async_trait]
pub trait RateLimit: Send + Sync {
    /// Waits for one permit or fails on cancellation/starvation.
    async fn wait(&self, ctx: &CancellationToken) -> Result<(), LimitError>;

    /// The steady-state rate of this limiter.
    fn limit(&self) -> Limit;
}

/// # All tiers must grant.
///
/// Tiers are kept sorted from the tightest rate to the loosest; `wait` asks
/// each tier in that order and returns the first error. Asking the tightest
/// tier first means the looser ones have usually refilled by the time they
/// are asked.
///
/// # Example
/// ```rust
/// use std::sync::Arc;
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use wardkit::{Limiter, MultiLimiter, RateLimit, per};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let tiers: Vec<Arc<dyn RateLimit>> = vec![
///     Arc::new(Limiter::new(per(10, Duration::from_secs(1)), 10).unwrap()),
///     Arc::new(Limiter::new(per(2, Duration::from_millis(1)), 1).unwrap()),
/// ];
/// let api = MultiLimiter::new(tiers).unwrap();
/// assert_eq!(api.limit(), per(10, Duration::from_secs(1)));
/// api.wait(&CancellationToken::new()).await.unwrap();
/// # }
/// ```
pub struct MultiLimiter {
    tiers: Vec<Arc<dyn RateLimit>>,
}

impl MultiLimiter {
    /// Sorts `tiers` by rate; an empty set is rejected.
    pub fn new(mut tiers: Vec<Arc<dyn RateLimit>>) -> Result<Self, ConfigError> {
        if tiers.is_empty() {
            return Err(ConfigError::NoLimiters);
        }
        tiers.sort_by(|a, b| a.limit().per_second().total_cmp(&b.limit().per_second()));
        Ok(Self { tiers })
    }

    /// Number of tiers.
    pub fn len(&self) -> usize {
        self.tiers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiers.is_empty()
    }
}

#[async_trait]
impl RateLimit for MultiLimiter {
    async fn wait(&self, ctx: &CancellationToken) -> Result<(), LimitError> {
        for tier in &self.tiers {
            tier.wait(ctx).await?;
        }
        Ok(())
    }

    fn limit(&self) -> Limit {
        self.tiers.first().map_or(Limit::INF, |t| t.limit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::limit::{Limiter, per};
    use std::time::Duration;
    use tokio::time::Instant;

    fn tier(n: u32, every: Duration, burst: u32) -> Arc<dyn RateLimit> {
        Arc::new(Limiter::new(per(n, every), burst).unwrap())
    }

    #[test]
    fn empty_set_is_rejected() {
        assert!(matches!(MultiLimiter::new(Vec::new()), Err(ConfigError::NoLimiters)));
    }

    #[tokio::test(start_paused = true)]
    async fn tightest_tier_comes_first() {
        let multi = MultiLimiter::new(vec![
            tier(100, Duration::from_secs(1), 1),
            tier(2, Duration::from_secs(1), 1),
            tier(10, Duration::from_secs(1), 1),
        ])
        .unwrap();
        let rates: Vec<f64> = multi.tiers.iter().map(|t| t.limit().per_second()).collect();
        assert_eq!(rates, vec![2.0, 10.0, 100.0]);
        assert_eq!(multi.limit(), Limit::new(2.0));
    }

    #[tokio::test(start_paused = true)]
    async fn elapsed_time_follows_the_tightest_rate() {
        let multi = MultiLimiter::new(vec![
            tier(10, Duration::from_secs(1), 1),
            tier(2, Duration::from_secs(1), 1),
        ])
        .unwrap();
        let ctx = CancellationToken::new();
        let start = Instant::now();

        for _ in 0..5 {
            multi.wait(&ctx).await.unwrap();
        }
        let elapsed = start.elapsed();
        assert!(elapsed >= Duration::from_secs(2), "{elapsed:?}");
        assert!(elapsed < Duration::from_millis(2050), "{elapsed:?}");
    }

    #[tokio::test(start_paused = true)]
    async fn tiers_nest() {
        let inner: Arc<dyn RateLimit> =
            Arc::new(MultiLimiter::new(vec![tier(4, Duration::from_secs(1), 1)]).unwrap());
        let outer = MultiLimiter::new(vec![inner, tier(100, Duration::from_secs(1), 1)]).unwrap();
        assert_eq!(outer.limit(), Limit::new(4.0));

        let ctx = CancellationToken::new();
        ctx.cancel();
        assert_eq!(outer.wait(&ctx).await, Err(LimitError::Canceled));
    }
}
