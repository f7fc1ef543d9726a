//! One generation of executors sharing a job queue.
//!
//! A crew lives from launch until its queue is closed and drained (or its
//! token fires). Executors that die on a fatal outcome hand their slot to a
//! replacement before exiting, so the live count never dips below the
//! configured size while the crew is running.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::sync::{Mutex, mpsc};
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;

use crate::error::TaskError;
use crate::events::{Bus, Event, EventKind};

/// Type-erased unit of pool work.
pub(super) type Job =
    Box<dyn FnOnce(CancellationToken) -> BoxFuture<'static, Result<(), TaskError>> + Send>;

pub(super) struct Crew {
    name: Arc<str>,
    bus: Bus,
    token: CancellationToken,
    jobs: Mutex<mpsc::Receiver<Job>>,
    faults: mpsc::Sender<TaskError>,
    live: AtomicUsize,
    next_id: AtomicU32,
    tracker: TaskTracker,
}

impl Crew {
    /// Spawns `workers` executors reading from `jobs`.
    pub(super) fn launch(
        name: Arc<str>,
        workers: usize,
        jobs: mpsc::Receiver<Job>,
        faults: mpsc::Sender<TaskError>,
        bus: Bus,
        token: CancellationToken,
    ) -> Arc<Self> {
        let crew = Arc::new(Self {
            name,
            bus,
            token,
            jobs: Mutex::new(jobs),
            faults,
            live: AtomicUsize::new(0),
            next_id: AtomicU32::new(1),
            tracker: TaskTracker::new(),
        });
        for _ in 0..workers {
            crew.live.fetch_add(1, Ordering::SeqCst);
            Self::spawn_executor(&crew);
        }
        crew
    }

    pub(super) fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Waits until every executor, replacements included, has exited.
    pub(super) async fn wait(&self) {
        self.tracker.close();
        self.tracker.wait().await;
    }

    fn spawn_executor(crew: &Arc<Self>) -> u32 {
        let id = crew.next_id.fetch_add(1, Ordering::Relaxed);
        crew.tracker.spawn(Arc::clone(crew).execute(id));
        id
    }

    async fn next_job(&self) -> Option<Job> {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => None,
            job = async { self.jobs.lock().await.recv().await } => job,
        }
    }

    async fn execute(self: Arc<Self>, id: u32) {
        while let Some(job) = self.next_job().await {
            let ctx = self.token.child_token();
            let outcome = AssertUnwindSafe(async move { job(ctx).await })
                .catch_unwind()
                .await
                .unwrap_or_else(|payload| Err(TaskError::from_panic(payload)));

            match outcome {
                Ok(()) => {}
                Err(err) if err.retires_executor() => {
                    self.retire(id, err);
                    return;
                }
                Err(err) => self.bus.publish(
                    Event::new(EventKind::TaskFailed)
                        .with_task(self.name.clone())
                        .with_worker(id)
                        .with_reason(err.to_string()),
                ),
            }
        }
        self.live.fetch_sub(1, Ordering::SeqCst);
    }

    /// Forwards the fault and hands the slot of `id` to a fresh executor.
    fn retire(self: &Arc<Self>, id: u32, err: TaskError) {
        let reason = err.to_string();
        match self.faults.try_send(err) {
            Ok(()) | Err(mpsc::error::TrySendError::Closed(_)) => {}
            Err(mpsc::error::TrySendError::Full(_)) => self.bus.publish(
                Event::new(EventKind::FaultDropped)
                    .with_task(self.name.clone())
                    .with_worker(id)
                    .with_reason(reason.clone()),
            ),
        }
        self.bus.publish(
            Event::new(EventKind::WorkerRetired)
                .with_task(self.name.clone())
                .with_worker(id)
                .with_reason(reason),
        );

        if self.token.is_cancelled() {
            self.live.fetch_sub(1, Ordering::SeqCst);
            return;
        }
        let successor = Self::spawn_executor(self);
        self.bus.publish(
            Event::new(EventKind::WorkerReplaced)
                .with_task(self.name.clone())
                .with_worker(successor),
        );
    }
}
