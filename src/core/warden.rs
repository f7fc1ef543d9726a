//! # Warden: owner of the ambient runtime context.
//!
//! The [`Warden`] owns the event [`Bus`], the [`SubscriberSet`] listener, the
//! root cancellation token and the [`Config`]. Stewards and pools built
//! through it share that context; nothing here is process-global.
//!
//! ```text
//! Warden::builder(cfg).with_subscribers(subs).build()
//!     ├─► Bus ──► listener ──► SubscriberSet::emit ──► subscriber workers
//!     └─► root token
//!            ├─► supervise(ward)     → Steward monitor (tracked by name)
//!            └─► worker_pool(name)   → WorkerPool (child token)
//!
//! run():
//!   termination signal | root cancelled
//!        └─► shutdown():
//!              publish ShutdownRequested
//!              cancel root
//!              wait for stewards until grace
//!                ├─ all done  → AllStoppedWithin
//!                └─ deadline  → GraceExceeded + RuntimeError::GraceExceeded { stuck }
//!              flush subscribers
//! ```

use std::mem;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::broadcast::{self, error::RecvError};
use tokio::task::JoinHandle;
use tokio::time::{self, Instant};
use tokio_util::sync::CancellationToken;

use super::builder::WardenBuilder;
use super::shutdown;
use crate::config::{Config, PoolConfig};
use crate::error::{ConfigError, RuntimeError};
use crate::events::{Bus, Event, EventKind};
use crate::pool::WorkerPool;
use crate::steward::{Heartbeat, Steward, Ward, WardRef};
use crate::subscribers::{Subscribe, SubscriberSet};

struct Listener {
    stop: CancellationToken,
    handle: JoinHandle<()>,
}

/// Runtime context for stewards and pools.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use wardkit::{Config, Pulse, WardFn, Warden};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let warden = Warden::new(Config::default());
/// let steward = warden.supervise(WardFn::arc("poller", |ctx: CancellationToken, pulse: Pulse, every: Duration| async move {
///     let mut tick = tokio::time::interval(every);
///     loop {
///         tokio::select! {
///             _ = ctx.cancelled() => return,
///             _ = tick.tick() => { pulse.beat(); }
///         }
///     }
/// }));
///
/// warden.token().cancel();
/// warden.run().await.expect("clean shutdown");
/// assert_eq!(steward.restarts(), 0);
/// # }
/// ```
pub struct Warden {
    cfg: Config,
    bus: Bus,
    token: CancellationToken,
    stewards: Mutex<Vec<(Arc<str>, JoinHandle<()>)>>,
    listener: Mutex<Option<Listener>>,
    closed: AtomicBool,
}

impl Warden {
    /// Creates a warden without subscribers.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(cfg: Config) -> Self {
        Self::with_subscribers(cfg, Vec::new())
    }

    /// Starts a builder.
    pub fn builder(cfg: Config) -> WardenBuilder {
        WardenBuilder::new(cfg)
    }

    pub(crate) fn with_subscribers(cfg: Config, subscribers: Vec<Arc<dyn Subscribe>>) -> Self {
        let bus = Bus::new(cfg.bus_capacity_clamped());
        let set = SubscriberSet::new(subscribers, bus.clone());
        let stop = CancellationToken::new();
        let handle = tokio::spawn(listen(bus.subscribe(), set, stop.clone()));

        Self {
            cfg,
            bus,
            token: CancellationToken::new(),
            stewards: Mutex::new(Vec::new()),
            listener: Mutex::new(Some(Listener { stop, handle })),
            closed: AtomicBool::new(false),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    /// The bus every collaborator built by this warden publishes to.
    pub fn bus(&self) -> &Bus {
        &self.bus
    }

    /// The root token; cancelling it makes [`run`](Self::run) shut down.
    pub fn token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Builds a steward for `ward` with the configured timeout and heartbeat capacity.
    pub fn steward(&self, ward: WardRef) -> Steward {
        let name: Arc<str> = Arc::from(ward.name());
        Steward::new(name, self.cfg.steward_timeout, ward, self.bus.clone())
            .with_heartbeat_capacity(self.cfg.heartbeat_capacity_clamped())
    }

    /// Starts `steward` under the root token and tracks it for shutdown.
    ///
    /// The returned heartbeat beats every `steward.timeout()`.
    pub fn watch(&self, steward: &Steward) -> Heartbeat {
        let (heartbeat, handle) = steward.spawn(self.token.clone(), steward.timeout());
        lock(&self.stewards).push((Arc::from(Ward::name(steward)), handle));
        heartbeat
    }

    /// Builds a steward for `ward`, starts it and returns it.
    pub fn supervise(&self, ward: WardRef) -> Steward {
        let steward = self.steward(ward);
        drop(self.watch(&steward));
        steward
    }

    /// Builds a worker pool on a child of the root token.
    ///
    /// `cfg = None` uses the configured default sizing.
    pub fn worker_pool(
        &self,
        name: impl Into<Arc<str>>,
        cfg: Option<PoolConfig>,
    ) -> Result<WorkerPool, ConfigError> {
        WorkerPool::new(
            name,
            cfg.unwrap_or(self.cfg.pool),
            self.bus.clone(),
            self.token.child_token(),
        )
    }

    /// Waits for a termination signal or root cancellation, then shuts down.
    pub async fn run(&self) -> Result<(), RuntimeError> {
        tokio::select! {
            _ = self.token.cancelled() => {}
            _ = shutdown::termination_or_never() => {}
        }
        self.shutdown().await
    }

    /// Cancels everything and waits for tracked stewards within `grace`.
    ///
    /// Later calls return `Ok(())` immediately.
    pub async fn shutdown(&self) -> Result<(), RuntimeError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        self.bus.publish(Event::new(EventKind::ShutdownRequested));
        self.token.cancel();

        let stewards = mem::take(&mut *lock(&self.stewards));
        let res = match self.cfg.grace() {
            Some(grace) => self.wait_within(grace, stewards).await,
            None => Ok(()),
        };
        self.close_listener().await;
        res
    }

    async fn wait_within(
        &self,
        grace: std::time::Duration,
        stewards: Vec<(Arc<str>, JoinHandle<()>)>,
    ) -> Result<(), RuntimeError> {
        let deadline = Instant::now() + grace;
        let mut stuck = Vec::new();
        for (name, handle) in stewards {
            if time::timeout_at(deadline, handle).await.is_err() {
                stuck.push(name.to_string());
            }
        }

        if stuck.is_empty() {
            self.bus.publish(Event::new(EventKind::AllStoppedWithin));
            return Ok(());
        }
        self.bus
            .publish(Event::new(EventKind::GraceExceeded).with_reason(stuck.join(", ")));
        Err(RuntimeError::GraceExceeded { grace, stuck })
    }

    async fn close_listener(&self) {
        let listener = lock(&self.listener).take();
        if let Some(Listener { stop, handle }) = listener {
            stop.cancel();
            let _ = handle.await;
        }
    }
}

/// Forwards bus events to the subscriber set until stopped, then flushes it.
async fn listen(mut rx: broadcast::Receiver<Event>, set: SubscriberSet, stop: CancellationToken) {
    loop {
        tokio::select! {
            biased;
            ev = rx.recv() => match ev {
                Ok(ev) => set.emit(ev),
                Err(RecvError::Lagged(_)) => continue,
                Err(RecvError::Closed) => break,
            },
            _ = stop.cancelled() => break,
        }
    }
    set.shutdown().await;
}

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::steward::{Pulse, WardFn};
    use async_trait::async_trait;
    use std::time::Duration;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<EventKind>>);

    #[async_trait]
    impl Subscribe for Recorder {
        async fn on_event(&self, ev: &Event) {
            lock(&self.0).push(ev.kind);
        }
        fn name(&self) -> &'static str {
            "recorder"
        }
    }

    fn cfg(grace: Duration) -> Config {
        Config {
            grace,
            steward_timeout: Duration::from_millis(100),
            ..Config::default()
        }
    }

    fn healthy(name: &'static str) -> WardRef {
        WardFn::arc(name, |ctx: CancellationToken, pulse: Pulse, every: Duration| async move {
            let mut tick = time::interval(every);
            loop {
                tokio::select! {
                    _ = ctx.cancelled() => return,
                    _ = tick.tick() => { pulse.beat(); }
                }
            }
        })
    }

    #[tokio::test(start_paused = true)]
    async fn shutdown_stops_wards_and_flushes_subscribers() {
        let recorder = Arc::new(Recorder::default());
        let warden = Warden::builder(cfg(Duration::from_secs(1)))
            .subscriber(recorder.clone())
            .build();
        let steward = warden.supervise(healthy("poller"));

        time::sleep(Duration::from_millis(500)).await;
        warden.shutdown().await.unwrap();
        assert_eq!(steward.restarts(), 0);

        let seen = lock(&recorder.0).clone();
        assert_eq!(seen.first(), Some(&EventKind::WardStarting));
        assert!(seen.contains(&EventKind::ShutdownRequested));
        assert!(seen.contains(&EventKind::WardStopped));
        assert_eq!(seen.last(), Some(&EventKind::AllStoppedWithin));

        assert!(warden.shutdown().await.is_ok());
    }

    #[tokio::test(start_paused = true)]
    async fn ward_ignoring_cancellation_exceeds_grace() {
        // Stewards give a deaf ward up to their timeout to let go; keep that past the grace.
        let warden = Warden::new(Config {
            steward_timeout: Duration::from_secs(1),
            ..cfg(Duration::from_millis(200))
        });
        let mut events = warden.bus().subscribe();
        warden.supervise(healthy("polite"));
        warden.supervise(WardFn::arc(
            "stubborn",
            |_ctx: CancellationToken, pulse: Pulse, _every: Duration| async move {
                loop {
                    pulse.beat();
                    time::sleep(Duration::from_millis(10)).await;
                }
            },
        ));

        time::sleep(Duration::from_millis(50)).await;
        let err = warden.shutdown().await.unwrap_err();
        match err {
            RuntimeError::GraceExceeded { grace, stuck } => {
                assert_eq!(grace, Duration::from_millis(200));
                assert_eq!(stuck, vec!["stubborn".to_string()]);
            }
        }

        let exceeded = std::iter::from_fn(|| events.try_recv().ok())
            .find(|e| e.kind == EventKind::GraceExceeded)
            .unwrap();
        assert_eq!(exceeded.reason.as_deref(), Some("stubborn"));
    }

    #[tokio::test(start_paused = true)]
    async fn run_returns_after_root_cancellation() {
        let warden = Warden::new(cfg(Duration::from_secs(1)));
        let mut pool = warden.worker_pool("jobs", Some(PoolConfig::new(2, 4, 1))).unwrap();
        assert_eq!(pool.live_workers(), 2);

        let token = warden.token();
        tokio::spawn(async move {
            time::sleep(Duration::from_millis(20)).await;
            token.cancel();
        });
        warden.run().await.unwrap();

        pool.stop().await;
        assert_eq!(pool.live_workers(), 0);
        assert_eq!(
            pool.submit(|_ctx| async { Ok(()) }).await,
            Err(crate::error::PoolError::Stopped)
        );
    }

    #[tokio::test]
    async fn zero_grace_does_not_wait() {
        let warden = Warden::new(cfg(Duration::ZERO));
        warden.supervise(healthy("quick"));
        assert!(warden.shutdown().await.is_ok());
    }
}
