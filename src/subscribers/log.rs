//! # LogWriter: simple event printer
//!
//! A minimal subscriber that prints incoming [`Event`]s to stdout.
//! Use it for tests or demos.
//!
//! ## Example output
//! ```text
//! [ward-starting] ward="poller" attempt=1
//! [heartbeat-timeout] ward="poller" attempt=1 timeout_ms=2000
//! [worker-retired] pool="ingest" worker=3 err="panicked: boom"
//! [worker-replaced] pool="ingest" worker=5
//! [shutdown-requested]
//! ```

use crate::events::{Event, EventKind};
use crate::subscribers::Subscribe;
use async_trait::async_trait;

/// Event writer subscriber.
#[derive(Default)]
pub struct LogWriter;

impl LogWriter {
    /// Construct a new [`LogWriter`].
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

fn subject(e: &Event) -> &str {
    e.task.as_deref().unwrap_or("unknown")
}

fn why(e: &Event) -> &str {
    e.reason.as_deref().unwrap_or("unknown")
}

#[async_trait]
impl Subscribe for LogWriter {
    async fn on_event(&self, e: &Event) {
        match e.kind {
            EventKind::ShutdownRequested => println!("[shutdown-requested]"),
            EventKind::AllStoppedWithin => println!("[all-stopped-within-grace]"),
            EventKind::GraceExceeded => println!("[grace-exceeded] stuck={}", why(e)),
            EventKind::WardStarting => {
                println!("[ward-starting] ward={:?} attempt={:?}", subject(e), e.attempt);
            }
            EventKind::HeartbeatTimeout => {
                println!(
                    "[heartbeat-timeout] ward={:?} attempt={:?} timeout_ms={:?}",
                    subject(e),
                    e.attempt,
                    e.timeout_ms
                );
            }
            EventKind::WardStopped => {
                println!("[ward-stopped] ward={:?} attempt={:?}", subject(e), e.attempt);
            }
            EventKind::TaskFailed => {
                println!(
                    "[failed] task={:?} worker={:?} err={:?}",
                    subject(e),
                    e.worker,
                    why(e)
                );
            }
            EventKind::WorkerRetired => {
                println!(
                    "[worker-retired] pool={:?} worker={:?} err={:?}",
                    subject(e),
                    e.worker,
                    why(e)
                );
            }
            EventKind::WorkerReplaced => {
                println!("[worker-replaced] pool={:?} worker={:?}", subject(e), e.worker);
            }
            EventKind::FaultDropped => {
                println!("[fault-dropped] pool={:?} err={:?}", subject(e), why(e));
            }
            EventKind::PoolStopped => println!("[pool-stopped] pool={:?}", subject(e)),
            EventKind::SubscriberOverflow => {
                println!("[subscriber-overflow] {}", why(e));
            }
            EventKind::SubscriberPanicked => {
                println!(
                    "[subscriber-panicked] subscriber={} info={}",
                    subject(e),
                    why(e)
                );
            }
        }
    }

    fn name(&self) -> &'static str {
        "LogWriter"
    }
}
