//! # Ticker: a periodic job packaged as a ward.
//!
//! The job runs once right away, then every `period`. Between runs the ticker
//! beats its pulse at the interval its supervisor asked for. A job that hangs
//! stops the beats too, so a [`Steward`] around the ticker restarts it.
//!
//! ```text
//! start ──► job() ──► loop {
//!                       ctx cancelled → exit
//!                       period tick   → job()     (errors → TaskFailed, ticker keeps going)
//!                       pulse tick    → beat
//!                     }
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::heartbeat::{Heartbeat, heartbeat};
use super::steward::Steward;
use super::ward::Ward;
use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Periodic job that reports liveness.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use wardkit::{Bus, TaskError, Ticker, Ward};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let cleanup = Ticker::new("cleanup", Duration::from_secs(60), Bus::default(), |_ctx: CancellationToken| async {
///     // purge expired rows...
///     Ok::<(), TaskError>(())
/// });
/// let steward = cleanup.supervised(Duration::from_secs(10));
/// let root = CancellationToken::new();
/// let _heartbeat = steward.start(root.clone(), Duration::from_secs(5));
/// root.cancel();
/// # }
/// ```
pub struct Ticker<F> {
    name: Cow<'static, str>,
    period: Duration,
    bus: Bus,
    job: Arc<F>,
}

impl<F, Fut> Ticker<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    /// Creates a ticker running `job` every `period` (min 1ms).
    pub fn new(name: impl Into<Cow<'static, str>>, period: Duration, bus: Bus, job: F) -> Self {
        Self {
            name: name.into(),
            period: period.max(MIN_PERIOD),
            bus,
            job: Arc::new(job),
        }
    }

    /// Wraps the ticker in a [`Steward`] with the given silence `timeout`.
    pub fn supervised(self, timeout: Duration) -> Steward {
        let name = self.name.to_string();
        let bus = self.bus.clone();
        Steward::new(name, timeout, Arc::new(self), bus)
    }

    async fn run_job(job: &F, ctx: &CancellationToken, bus: &Bus, name: &str) {
        let res = tokio::select! {
            biased;
            _ = ctx.cancelled() => return,
            res = job(ctx.clone()) => res,
        };
        match res {
            Ok(()) | Err(TaskError::Canceled) => {}
            Err(e) => bus.publish(
                Event::new(EventKind::TaskFailed)
                    .with_task(name)
                    .with_reason(e.to_string()),
            ),
        }
    }
}

impl<F, Fut> Ward for Ticker<F>
where
    F: Fn(CancellationToken) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, ctx: CancellationToken, pulse_interval: Duration) -> Heartbeat {
        let (pulse, heartbeat) = heartbeat(1);
        let job = Arc::clone(&self.job);
        let bus = self.bus.clone();
        let name = self.name.clone();
        let period = self.period;
        let pulse_interval = pulse_interval.max(MIN_PERIOD);

        tokio::spawn(async move {
            let mut ticks = time::interval_at(Instant::now() + period, period);
            ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);
            let mut pulses = time::interval_at(Instant::now() + pulse_interval, pulse_interval);
            pulses.set_missed_tick_behavior(MissedTickBehavior::Delay);

            Self::run_job(&job, &ctx, &bus, &name).await;
            loop {
                tokio::select! {
                    biased;
                    _ = ctx.cancelled() => return,
                    _ = ticks.tick() => Self::run_job(&job, &ctx, &bus, &name).await,
                    _ = pulses.tick() => {
                        pulse.beat();
                    }
                }
            }
        });
        heartbeat
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test(start_paused = true)]
    async fn runs_immediately_then_every_period() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let ticker = Ticker::new("count", Duration::from_millis(100), Bus::new(8), move |_ctx| {
            let counter = counter.clone();
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let ctx = CancellationToken::new();
        let mut hb = ticker.start(ctx.clone(), Duration::from_millis(30));
        time::sleep(Duration::from_millis(350)).await;
        assert_eq!(runs.load(Ordering::SeqCst), 4);
        assert_eq!(hb.recv().await, Some(()));

        ctx.cancel();
        while hb.recv().await.is_some() {}
    }

    #[tokio::test(start_paused = true)]
    async fn job_errors_are_published_and_ticking_continues() {
        let bus = Bus::new(16);
        let mut events = bus.subscribe();
        let ticker = Ticker::new("bad", Duration::from_millis(100), bus, |_ctx| async {
            Err(TaskError::Fail {
                error: "db down".into(),
            })
        });

        let ctx = CancellationToken::new();
        let _hb = ticker.start(ctx.clone(), Duration::from_millis(50));
        time::sleep(Duration::from_millis(250)).await;
        ctx.cancel();

        let failures: Vec<_> = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| e.kind == EventKind::TaskFailed)
            .collect();
        assert_eq!(failures.len(), 3);
        assert_eq!(failures[0].reason.as_deref(), Some("execution failed: db down"));
    }

    #[tokio::test(start_paused = true)]
    async fn hung_job_is_restarted_by_its_steward() {
        let runs = Arc::new(AtomicU32::new(0));
        let counter = runs.clone();
        let ticker = Ticker::new("hang", Duration::from_millis(50), Bus::new(64), move |ctx: CancellationToken| {
            let first = counter.fetch_add(1, Ordering::SeqCst) == 0;
            async move {
                if first {
                    ctx.cancelled().await;
                }
                Ok(())
            }
        });
        let steward = ticker.supervised(Duration::from_millis(200));

        let root = CancellationToken::new();
        let _hb = steward.start(root.clone(), Duration::from_millis(100));
        time::sleep(Duration::from_secs(1)).await;

        assert_eq!(steward.restarts(), 1);
        assert!(runs.load(Ordering::SeqCst) > 2);
        root.cancel();
    }
}
