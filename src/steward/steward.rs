//! # Steward: heartbeat supervisor for a single ward.
//!
//! ## Architecture
//! ```text
//! parent ctx ──┐
//!              ├──► or(own scope, parent) ──► ward.start(scope, timeout/2) ──► ward heartbeat
//! own scope ───┘                                                                    │
//!                                                                                   ▼
//! upstream heartbeat ◄── pulse timer ◄── monitor loop ◄─────────────────────────────┘
//! ```
//!
//! The monitor loop races four events:
//! - parent cancelled → cancel the ward scope, wait up to `timeout` for the
//!   ward to drop its pulse, publish `WardStopped`, exit;
//! - ward beat → open a fresh timeout window;
//! - pulse timer → beat upstream without waiting (dropped if nobody listens);
//! - timeout window elapsed → publish `HeartbeatTimeout`, cancel the ward scope, start a new one.
//!
//! ## Rules
//! - Exactly one ward scope is live at a time.
//! - The steward only signals; the stalled ward must release its own resources.
//! - A closed ward heartbeat is not polled again; the ward is then caught by silence.
//! - Restarts are unbounded and immediate (no backoff, no cap).
//! - Cancelling a ward scope never cancels the parent.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::heartbeat::{Heartbeat, Pulse, heartbeat};
use super::ward::{Ward, WardRef};
use crate::events::{Bus, Event, EventKind};
use crate::pipeline::or;

/// Shortest accepted timeout and pulse interval.
const MIN_PERIOD: Duration = Duration::from_millis(1);

/// Supervises a [`Ward`], restarting it whenever it goes silent for `timeout`.
///
/// Cloning a steward shares its restart counter.
///
/// # Example
/// ```rust
/// use std::time::Duration;
/// use tokio_util::sync::CancellationToken;
/// use wardkit::{Bus, Pulse, Steward, Ward, WardFn};
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let ward = WardFn::arc("poller", |ctx: CancellationToken, pulse: Pulse, every: Duration| async move {
///     let mut tick = tokio::time::interval(every);
///     loop {
///         tokio::select! {
///             _ = ctx.cancelled() => return,
///             _ = tick.tick() => { pulse.beat(); }
///         }
///     }
/// });
///
/// let root = CancellationToken::new();
/// let steward = Steward::new("poller", Duration::from_secs(2), ward, Bus::default());
/// let mut heartbeat = steward.start(root.clone(), Duration::from_secs(1));
/// root.cancel();
/// while heartbeat.recv().await.is_some() {}
/// assert_eq!(steward.restarts(), 0);
/// # }
/// ```
#[derive(Clone)]
pub struct Steward {
    name: Arc<str>,
    timeout: Duration,
    ward: WardRef,
    bus: Bus,
    capacity: usize,
    restarts: Arc<AtomicU64>,
}

impl Steward {
    /// Creates a steward for `ward` with the given silence `timeout` (min 1ms).
    ///
    /// The ward is asked to beat every `timeout / 2`.
    pub fn new(name: impl Into<Arc<str>>, timeout: Duration, ward: WardRef, bus: Bus) -> Self {
        Self {
            name: name.into(),
            timeout: timeout.max(MIN_PERIOD),
            ward,
            bus,
            capacity: 1,
            restarts: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Sets the capacity of the steward's own upstream heartbeat (min 1).
    pub fn with_heartbeat_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }

    /// Returns the silence window.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns how many times the ward was restarted after a timeout.
    pub fn restarts(&self) -> u64 {
        self.restarts.load(Ordering::Relaxed)
    }

    /// Starts supervision under `ctx` and returns the monitor's join handle
    /// next to the steward's own heartbeat (beaten every `pulse_interval`).
    ///
    /// The heartbeat closes once the monitor exited. After `ctx` is cancelled
    /// the monitor waits at most `timeout` for the current ward to drop its
    /// pulse, then exits regardless.
    pub fn spawn(
        &self,
        ctx: CancellationToken,
        pulse_interval: Duration,
    ) -> (Heartbeat, JoinHandle<()>) {
        let (pulse, heartbeat) = heartbeat(self.capacity);
        let monitor = self.clone();
        let join = tokio::spawn(monitor.monitor(ctx, pulse_interval.max(MIN_PERIOD), pulse));
        (heartbeat, join)
    }

    async fn monitor(self, parent: CancellationToken, pulse_interval: Duration, upstream: Pulse) {
        let mut attempt: u32 = 0;
        let mut ward = self.start_ward(&parent, &mut attempt);

        let mut pulse = time::interval_at(Instant::now() + pulse_interval, pulse_interval);
        pulse.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            let window = time::sleep(self.timeout);
            tokio::pin!(window);

            loop {
                tokio::select! {
                    biased;
                    _ = parent.cancelled() => {
                        ward.scope.cancel();
                        if ward.open {
                            let drained = async { while ward.heartbeat.recv().await.is_some() {} };
                            let _ = time::timeout(self.timeout, drained).await;
                        }
                        self.bus.publish(
                            Event::new(EventKind::WardStopped)
                                .with_task(Arc::clone(&self.name))
                                .with_attempt(attempt),
                        );
                        return;
                    }
                    beat = ward.heartbeat.recv(), if ward.open => match beat {
                        Some(()) => break,
                        None => ward.open = false,
                    },
                    _ = pulse.tick() => {
                        upstream.beat();
                    }
                    _ = &mut window => {
                        self.bus.publish(
                            Event::new(EventKind::HeartbeatTimeout)
                                .with_task(Arc::clone(&self.name))
                                .with_attempt(attempt)
                                .with_timeout(self.timeout),
                        );
                        ward.scope.cancel();
                        self.restarts.fetch_add(1, Ordering::Relaxed);
                        ward = self.start_ward(&parent, &mut attempt);
                        break;
                    }
                }
            }
        }
    }

    fn start_ward(&self, parent: &CancellationToken, attempt: &mut u32) -> Incarnation {
        *attempt += 1;
        self.bus.publish(
            Event::new(EventKind::WardStarting)
                .with_task(Arc::clone(&self.name))
                .with_attempt(*attempt),
        );

        let scope = CancellationToken::new();
        let merged = or(&[scope.clone(), parent.clone()]);
        let heartbeat = self.ward.start(merged, self.timeout / 2);
        Incarnation {
            scope,
            heartbeat,
            open: true,
        }
    }
}

/// The currently running ward and its private scope.
struct Incarnation {
    scope: CancellationToken,
    heartbeat: Heartbeat,
    open: bool,
}

impl Ward for Steward {
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, ctx: CancellationToken, pulse_interval: Duration) -> Heartbeat {
        self.spawn(ctx, pulse_interval).0
    }
}
