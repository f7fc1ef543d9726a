//! # Events emitted by stewards, worker pools and the warden.
//!
//! The [`EventKind`] enum classifies event types across four categories:
//! - **Ward events**: supervision flow (starting, heartbeat timeout, stopped)
//! - **Pool events**: executor failures and replacements
//! - **Shutdown events**: warden shutdown progress
//! - **Subscriber events**: delivery problems of the fan-out itself
//!
//! The [`Event`] struct carries additional metadata such as timestamps, the
//! ward or pool name, reasons and timeouts.
//!
//! ## Ordering guarantees
//! Every event published through one [`Bus`](crate::events::Bus) gets a
//! sequence number from that bus, increasing monotonically. Use `seq` to
//! restore the order when events are delivered out of order.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use wardkit::{Event, EventKind};
//!
//! let ev = Event::new(EventKind::HeartbeatTimeout)
//!     .with_task("poller")
//!     .with_attempt(3)
//!     .with_timeout(Duration::from_secs(5));
//!
//! assert_eq!(ev.kind, EventKind::HeartbeatTimeout);
//! assert_eq!(ev.task.as_deref(), Some("poller"));
//! assert_eq!(ev.timeout_ms, Some(5_000));
//! ```

use std::sync::Arc;
use std::time::{Duration, SystemTime};

/// Classification of runtime events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventKind {
    // === Subscriber events ===
    /// Subscriber panicked during event processing.
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: panic info/message
    SubscriberPanicked,

    /// Subscriber dropped an event (queue full or worker closed).
    ///
    /// Sets:
    /// - `task`: subscriber name
    /// - `reason`: reason string (e.g., "full", "closed")
    SubscriberOverflow,

    // === Shutdown events ===
    /// Shutdown requested (OS signal observed or root token cancelled).
    ShutdownRequested,

    /// All stewards stopped within the configured grace period.
    AllStoppedWithin,

    /// Grace period exceeded; some stewards did not stop in time.
    ///
    /// Sets:
    /// - `reason`: comma-separated names of the stuck stewards
    GraceExceeded,

    // === Ward events ===
    /// A steward is (re)starting its ward.
    ///
    /// Sets:
    /// - `task`: ward name
    /// - `attempt`: start number (1-based, per steward)
    WardStarting,

    /// The ward stayed silent for the whole timeout window and is being restarted.
    ///
    /// Sets:
    /// - `task`: ward name
    /// - `attempt`: the start number that stalled
    /// - `timeout_ms`: the silence window
    HeartbeatTimeout,

    /// The steward observed parent cancellation and stopped its ward.
    ///
    /// Sets:
    /// - `task`: ward name
    /// - `attempt`: last start number
    WardStopped,

    // === Work events ===
    /// A unit of work returned a non-retiring error.
    ///
    /// Sets:
    /// - `task`: ticker or pool name
    /// - `worker`: executor id (pool only)
    /// - `reason`: error message
    TaskFailed,

    /// An executor retired after a fatal error or a caught panic.
    ///
    /// Sets:
    /// - `task`: pool name
    /// - `worker`: retired executor id
    /// - `reason`: error message
    WorkerRetired,

    /// A replacement executor was launched.
    ///
    /// Sets:
    /// - `task`: pool name
    /// - `worker`: new executor id
    WorkerReplaced,

    /// A fault could not be forwarded because the fault queue was full.
    ///
    /// Sets:
    /// - `task`: pool name
    /// - `reason`: the dropped fault
    FaultDropped,

    /// A pool closed its queue and every executor has drained.
    ///
    /// Sets:
    /// - `task`: pool name
    PoolStopped,
}

/// Runtime event with optional metadata.
///
/// - `seq`: sequence number stamped by the bus on publish
/// - `at`: wall-clock timestamp (for logs)
/// - other optional fields are set depending on the [`EventKind`]
#[derive(Clone, Debug)]
pub struct Event {
    /// Monotonically increasing sequence number (per bus; `0` until published).
    pub seq: u64,
    /// Wall-clock timestamp.
    pub at: SystemTime,
    /// Event classification.
    pub kind: EventKind,
    /// Name of the ward, pool or subscriber, if applicable.
    pub task: Option<Arc<str>>,
    /// Executor id inside a pool.
    pub worker: Option<u32>,
    /// Start number of a ward (starting from 1).
    pub attempt: Option<u32>,
    /// Heartbeat timeout in milliseconds (compact).
    pub timeout_ms: Option<u32>,
    /// Human-readable reason (errors, overflow details, etc.).
    pub reason: Option<Arc<str>>,
}

impl Event {
    /// Creates a new event of the given kind with the current timestamp.
    pub fn new(kind: EventKind) -> Self {
        Self {
            seq: 0,
            at: SystemTime::now(),
            kind,
            task: None,
            worker: None,
            attempt: None,
            timeout_ms: None,
            reason: None,
        }
    }

    /// Attaches a ward/pool name.
    #[inline]
    pub fn with_task(mut self, task: impl Into<Arc<str>>) -> Self {
        self.task = Some(task.into());
        self
    }

    /// Attaches an executor id.
    #[inline]
    pub fn with_worker(mut self, id: u32) -> Self {
        self.worker = Some(id);
        self
    }

    /// Attaches a start number.
    #[inline]
    pub fn with_attempt(mut self, n: u32) -> Self {
        self.attempt = Some(n);
        self
    }

    /// Attaches a timeout duration (stored as milliseconds).
    #[inline]
    pub fn with_timeout(mut self, d: Duration) -> Self {
        let ms = d.as_millis().min(u128::from(u32::MAX)) as u32;
        self.timeout_ms = Some(ms);
        self
    }

    /// Attaches a human-readable reason.
    #[inline]
    pub fn with_reason(mut self, reason: impl Into<Arc<str>>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    /// Creates a subscriber overflow event.
    #[inline]
    pub fn subscriber_overflow(subscriber: &'static str, reason: &'static str) -> Self {
        Event::new(EventKind::SubscriberOverflow)
            .with_task(subscriber)
            .with_reason(format!("subscriber={subscriber} reason={reason}"))
    }

    /// Creates a subscriber panic event.
    #[inline]
    pub fn subscriber_panicked(subscriber: &'static str, info: String) -> Self {
        Event::new(EventKind::SubscriberPanicked)
            .with_task(subscriber)
            .with_reason(info)
    }
}
