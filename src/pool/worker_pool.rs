use std::future::Future;
use std::sync::Arc;

use futures::FutureExt;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::crew::{Crew, Job};
use crate::config::PoolConfig;
use crate::error::{ConfigError, PoolError, TaskError};
use crate::events::{Bus, Event, EventKind};

/// # Self-healing pool of executors fed from one bounded queue.
///
/// Jobs are fire-and-forget `FnOnce(CancellationToken) -> Future<Output = Result<(), TaskError>>`.
/// Each job gets a child of the pool token.
///
/// ### Outcomes
/// - `Ok(())`: nothing.
/// - `Fail` / `Canceled`: published as `TaskFailed`, the executor keeps going.
/// - `Fatal` / panic: forwarded to the fault queue (dropped when full), the
///   executor retires and a replacement starts right away.
///
/// ### Shutdown
/// - [`stop`](Self::stop) closes the queue and waits until it is drained.
/// - Cancelling the pool token makes executors exit without draining.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use wardkit::{Bus, PoolConfig, TaskError, WorkerPool};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let mut pool = WorkerPool::new("mailer", PoolConfig::new(2, 8, 4), Bus::default(), CancellationToken::new())
///     .expect("valid config");
/// pool.submit(|_ctx| async { Ok::<(), TaskError>(()) }).await.expect("queued");
/// pool.stop().await;
/// assert_eq!(pool.live_workers(), 0);
/// # }
/// ```
pub struct WorkerPool {
    name: Arc<str>,
    cfg: PoolConfig,
    bus: Bus,
    token: CancellationToken,
    jobs: Option<mpsc::Sender<Job>>,
    crew: Arc<Crew>,
    fault_tx: mpsc::Sender<TaskError>,
    fault_rx: Option<mpsc::Receiver<TaskError>>,
}

impl WorkerPool {
    /// Validates `cfg` and launches `cfg.workers` executors.
    ///
    /// Must be called inside a tokio runtime.
    pub fn new(
        name: impl Into<Arc<str>>,
        cfg: PoolConfig,
        bus: Bus,
        token: CancellationToken,
    ) -> Result<Self, ConfigError> {
        validate(&cfg)?;
        let name = name.into();
        let (fault_tx, fault_rx) = mpsc::channel(cfg.fault_capacity_clamped());
        let (jobs, crew) = launch(&name, &cfg, &fault_tx, &bus, &token);
        Ok(Self {
            name,
            cfg,
            bus,
            token,
            jobs: Some(jobs),
            crew,
            fault_tx,
            fault_rx: Some(fault_rx),
        })
    }

    /// Queues `job`, waiting for space.
    pub async fn submit<F, Fut>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(PoolError::Stopped)?;
        if self.token.is_cancelled() {
            return Err(PoolError::Canceled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(PoolError::Canceled),
            sent = jobs.send(erase(job)) => sent.map_err(|_| PoolError::Stopped),
        }
    }

    /// Queues `job` only if there is room right now.
    pub fn try_submit<F, Fut>(&self, job: F) -> Result<(), PoolError>
    where
        F: FnOnce(CancellationToken) -> Fut + Send + 'static,
        Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
    {
        let jobs = self.jobs.as_ref().ok_or(PoolError::Stopped)?;
        if self.token.is_cancelled() {
            return Err(PoolError::Canceled);
        }
        jobs.try_send(erase(job)).map_err(|e| match e {
            mpsc::error::TrySendError::Full(_) => PoolError::Full,
            mpsc::error::TrySendError::Closed(_) => PoolError::Stopped,
        })
    }

    /// Closes the queue and waits for every executor to drain it.
    ///
    /// A second call returns immediately.
    pub async fn stop(&mut self) {
        if self.jobs.take().is_none() {
            return;
        }
        self.crew.wait().await;
        self.bus
            .publish(Event::new(EventKind::PoolStopped).with_task(self.name.clone()));
    }

    /// Stops the pool, then relaunches it with `cfg` or the previous sizing.
    ///
    /// The fault queue survives the restart; its capacity does not change.
    pub async fn restart(&mut self, cfg: Option<PoolConfig>) -> Result<(), ConfigError> {
        let cfg = cfg.unwrap_or(self.cfg);
        validate(&cfg)?;
        self.stop().await;

        let (jobs, crew) = launch(&self.name, &cfg, &self.fault_tx, &self.bus, &self.token);
        self.cfg = cfg;
        self.jobs = Some(jobs);
        self.crew = crew;
        Ok(())
    }

    /// Takes the fault receiver; `None` after the first call.
    pub fn faults(&mut self) -> Option<mpsc::Receiver<TaskError>> {
        self.fault_rx.take()
    }

    /// Number of executors currently alive.
    pub fn live_workers(&self) -> usize {
        self.crew.live()
    }

    /// Current sizing.
    pub fn config(&self) -> PoolConfig {
        self.cfg
    }

    /// Returns true once [`stop`](Self::stop) was called and no restart followed.
    pub fn is_stopped(&self) -> bool {
        self.jobs.is_none()
    }
}

fn validate(cfg: &PoolConfig) -> Result<(), ConfigError> {
    if cfg.workers == 0 {
        return Err(ConfigError::ZeroWorkers);
    }
    if cfg.queue_capacity == 0 {
        return Err(ConfigError::ZeroQueue);
    }
    Ok(())
}

fn launch(
    name: &Arc<str>,
    cfg: &PoolConfig,
    faults: &mpsc::Sender<TaskError>,
    bus: &Bus,
    token: &CancellationToken,
) -> (mpsc::Sender<Job>, Arc<Crew>) {
    let (tx, rx) = mpsc::channel(cfg.queue_capacity);
    let crew = Crew::launch(
        Arc::clone(name),
        cfg.workers,
        rx,
        faults.clone(),
        bus.clone(),
        token.clone(),
    );
    (tx, crew)
}

fn erase<F, Fut>(job: F) -> Job
where
    F: FnOnce(CancellationToken) -> Fut + Send + 'static,
    Fut: Future<Output = Result<(), TaskError>> + Send + 'static,
{
    Box::new(move |ctx| job(ctx).boxed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tokio::sync::oneshot;
    use tokio::time::sleep;

    fn explode() -> Result<(), TaskError> {
        panic!("boom")
    }

    fn pool(workers: usize, queue: usize) -> WorkerPool {
        WorkerPool::new(
            "test",
            PoolConfig::new(workers, queue, 4),
            Bus::new(64),
            CancellationToken::new(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn rejects_empty_sizing() {
        let zero_workers = WorkerPool::new("p", PoolConfig::new(0, 1, 1), Bus::new(4), CancellationToken::new());
        assert!(matches!(zero_workers, Err(ConfigError::ZeroWorkers)));
        let zero_queue = WorkerPool::new("p", PoolConfig::new(1, 0, 1), Bus::new(4), CancellationToken::new());
        assert!(matches!(zero_queue, Err(ConfigError::ZeroQueue)));
    }

    #[tokio::test]
    async fn panicking_job_is_replaced_and_reported_once() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut pool = WorkerPool::new("heal", PoolConfig::new(3, 16, 4), bus, CancellationToken::new()).unwrap();
        let mut faults = pool.faults().unwrap();
        let done = Arc::new(AtomicUsize::new(0));

        pool.submit(|_ctx| async { explode() }).await.unwrap();
        for _ in 0..5 {
            let done = done.clone();
            pool.submit(move |_ctx| async move {
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        }

        let fault = faults.recv().await.unwrap();
        assert_eq!(fault, TaskError::Panicked { info: "boom".into() });
        sleep(Duration::from_millis(50)).await;
        assert_eq!(pool.live_workers(), 3);
        assert!(faults.try_recv().is_err());

        pool.stop().await;
        assert_eq!(done.load(Ordering::SeqCst), 5);

        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::WorkerRetired).count(), 1);
        assert_eq!(kinds.iter().filter(|k| **k == EventKind::WorkerReplaced).count(), 1);
        assert_eq!(kinds.last(), Some(&EventKind::PoolStopped));
    }

    #[tokio::test]
    async fn fail_keeps_the_executor_fatal_retires_it() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut pool = WorkerPool::new("classify", PoolConfig::new(1, 8, 4), bus, CancellationToken::new()).unwrap();
        let mut faults = pool.faults().unwrap();

        pool.submit(|_ctx| async { Err(TaskError::Fail { error: "retry later".into() }) })
            .await
            .unwrap();
        pool.submit(|_ctx| async { Err(TaskError::Fatal { error: "corrupt".into() }) })
            .await
            .unwrap();
        pool.stop().await;

        assert_eq!(faults.recv().await, Some(TaskError::Fatal { error: "corrupt".into() }));
        let kinds: Vec<_> = std::iter::from_fn(|| events.try_recv().ok()).map(|e| e.kind).collect();
        assert_eq!(
            kinds,
            vec![
                EventKind::TaskFailed,
                EventKind::WorkerRetired,
                EventKind::WorkerReplaced,
                EventKind::PoolStopped,
            ]
        );
    }

    #[tokio::test]
    async fn full_fault_queue_drops_and_reports() {
        let bus = Bus::new(64);
        let mut events = bus.subscribe();
        let mut pool = WorkerPool::new("faulty", PoolConfig::new(2, 8, 1), bus, CancellationToken::new()).unwrap();

        for _ in 0..3 {
            pool.submit(|_ctx| async { Err(TaskError::Fatal { error: "x".into() }) })
                .await
                .unwrap();
        }
        pool.stop().await;
        assert_eq!(pool.live_workers(), 0);

        let dropped = std::iter::from_fn(|| events.try_recv().ok())
            .filter(|e| e.kind == EventKind::FaultDropped)
            .count();
        assert_eq!(dropped, 2);
        let mut faults = pool.faults().unwrap();
        assert!(faults.try_recv().is_ok());
        assert!(faults.try_recv().is_err());
    }

    #[tokio::test]
    async fn stop_drains_the_queue_and_is_idempotent() {
        let mut pool = pool(2, 32);
        let done = Arc::new(AtomicUsize::new(0));
        for _ in 0..20 {
            let done = done.clone();
            pool.submit(move |_ctx| async move {
                sleep(Duration::from_millis(1)).await;
                done.fetch_add(1, Ordering::SeqCst);
                Ok(())
            })
            .await
            .unwrap();
        }

        pool.stop().await;
        assert_eq!(done.load(Ordering::SeqCst), 20);
        assert_eq!(pool.live_workers(), 0);
        assert!(pool.is_stopped());
        pool.stop().await;
    }

    #[tokio::test]
    async fn submit_after_stop_is_an_error() {
        let mut pool = pool(1, 1);
        pool.stop().await;
        let err = pool.submit(|_ctx| async { Ok(()) }).await.unwrap_err();
        assert_eq!(err, PoolError::Stopped);
        let err = pool.try_submit(|_ctx| async { Ok(()) }).unwrap_err();
        assert_eq!(err, PoolError::Stopped);
    }

    #[tokio::test]
    async fn try_submit_reports_a_full_queue() {
        let mut pool = pool(1, 1);
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        pool.submit(move |_ctx| async move {
            let _ = started_tx.send(());
            let _ = release_rx.await;
            Ok(())
        })
        .await
        .unwrap();
        started_rx.await.unwrap();

        pool.try_submit(|_ctx| async { Ok(()) }).unwrap();
        let err = pool.try_submit(|_ctx| async { Ok(()) }).unwrap_err();
        assert_eq!(err, PoolError::Full);

        release_tx.send(()).unwrap();
        pool.stop().await;
    }

    #[tokio::test]
    async fn cancellation_unblocks_submit_and_ends_executors() {
        let token = CancellationToken::new();
        let pool = WorkerPool::new("cancel", PoolConfig::new(1, 1, 1), Bus::new(8), token.clone()).unwrap();
        let (started_tx, started_rx) = oneshot::channel();
        let (release_tx, release_rx) = oneshot::channel::<()>();

        pool.submit(move |ctx| async move {
            let _ = started_tx.send(());
            tokio::select! {
                _ = ctx.cancelled() => Err(TaskError::Canceled),
                _ = release_rx => Ok(()),
            }
        })
        .await
        .unwrap();
        started_rx.await.unwrap();
        // Fill the queue so the next submit has to wait.
        while pool.try_submit(|_ctx| async { Ok(()) }).is_ok() {}

        let waiting = pool.submit(|_ctx| async { Ok(()) });
        let canceller = async {
            sleep(Duration::from_millis(10)).await;
            token.cancel();
        };
        let (res, ()) = tokio::join!(waiting, canceller);
        assert_eq!(res, Err(PoolError::Canceled));

        sleep(Duration::from_millis(10)).await;
        assert_eq!(pool.live_workers(), 0);
        drop(release_tx);
    }

    #[tokio::test]
    async fn restart_relaunches_and_keeps_faults() {
        let mut pool = pool(1, 4);
        let mut faults = pool.faults().unwrap();
        pool.submit(|_ctx| async { Err(TaskError::Fatal { error: "first".into() }) })
            .await
            .unwrap();

        pool.restart(Some(PoolConfig::new(3, 4, 4))).await.unwrap();
        assert!(!pool.is_stopped());
        assert_eq!(pool.live_workers(), 3);
        assert_eq!(pool.config().workers, 3);

        pool.submit(|_ctx| async { Err(TaskError::Fatal { error: "second".into() }) })
            .await
            .unwrap();
        pool.stop().await;

        assert_eq!(faults.recv().await, Some(TaskError::Fatal { error: "first".into() }));
        assert_eq!(faults.recv().await, Some(TaskError::Fatal { error: "second".into() }));
        assert!(matches!(pool.restart(Some(PoolConfig::new(0, 1, 1))).await, Err(ConfigError::ZeroWorkers)));
    }
}
