//! # Monitored-task abstraction and function-backed implementation.
//!
//! [`Ward`] is the contract between a [`Steward`](crate::Steward) and the work
//! it supervises: given a cancellation scope and a requested beat interval,
//! start the work and hand back its [`Heartbeat`].
//!
//! [`WardFn`] wraps an async closure `Fn(CancellationToken, Pulse, Duration) -> Fut`,
//! producing a fresh future per start. Nothing is shared between restarts
//! unless the closure captures an `Arc` explicitly.
//!
//! ## Example
//! ```rust
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use wardkit::{Pulse, WardFn, WardRef};
//!
//! let poller: WardRef = WardFn::arc("poller", |ctx: CancellationToken, pulse: Pulse, every: Duration| async move {
//!     let mut tick = tokio::time::interval(every);
//!     loop {
//!         tokio::select! {
//!             _ = ctx.cancelled() => return,
//!             _ = tick.tick() => { pulse.beat(); }
//!         }
//!     }
//! });
//! assert_eq!(poller.name(), "poller");
//! ```

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::heartbeat::{Heartbeat, Pulse, heartbeat};

/// # Long-running, supervisable unit of work.
///
/// `start` must return promptly: it launches the work (typically with
/// `tokio::spawn`) and returns the heartbeat the work beats at roughly
/// `pulse_interval`. The work must stop when `ctx` is cancelled; supervisors
/// only ever signal, they never abort.
pub trait Ward: Send + Sync + 'static {
    /// Returns a stable, human-readable name.
    fn name(&self) -> &str;

    /// Starts one incarnation of the work under `ctx`.
    fn start(&self, ctx: CancellationToken, pulse_interval: Duration) -> Heartbeat;
}

/// Shared handle to a ward.
pub type WardRef = Arc<dyn Ward>;

/// Function-backed ward.
#[derive(Debug)]
pub struct WardFn<F> {
    name: Cow<'static, str>,
    capacity: usize,
    f: F,
}

impl<F> WardFn<F> {
    /// Creates a new function-backed ward with a one-slot heartbeat queue.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            capacity: 1,
            f,
        }
    }

    /// Creates the ward and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }

    /// Sets the heartbeat queue capacity (min 1).
    pub fn with_capacity(mut self, capacity: usize) -> Self {
        self.capacity = capacity.max(1);
        self
    }
}

impl<F, Fut> Ward for WardFn<F>
where
    F: Fn(CancellationToken, Pulse, Duration) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn start(&self, ctx: CancellationToken, pulse_interval: Duration) -> Heartbeat {
        let (pulse, heartbeat) = heartbeat(self.capacity);
        tokio::spawn((self.f)(ctx, pulse, pulse_interval));
        heartbeat
    }
}
