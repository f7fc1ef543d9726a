//! # wardkit
//!
//! **wardkit** is a small toolkit of concurrency primitives for long-lived
//! background work on tokio.
//!
//! It covers liveness supervision, cancellable channel pipelines, a
//! self-healing worker pool, per-key call deduplication and multi-tier rate
//! limiting. Every blocking point races a [`CancellationToken`](tokio_util::sync::CancellationToken).
//!
//! ## Architecture
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  Warden (ambient context)                                        │
//! │  - Config                                                        │
//! │  - Bus (broadcast events, per-bus sequence numbers)              │
//! │  - SubscriberSet (fans out to user subscribers)                  │
//! │  - root CancellationToken                                        │
//! └──────┬──────────────────────┬─────────────────────┬──────────────┘
//!        ▼                      ▼                     ▼
//! ┌──────────────┐      ┌──────────────┐      ┌──────────────┐
//! │   Steward    │      │   Steward    │      │  WorkerPool  │
//! │ (heartbeat   │      │  └─ Steward  │      │ (self-heal)  │
//! │  watchdog)   │      │     (nested) │      │              │
//! └──────┬───────┘      └──────┬───────┘      └──────┬───────┘
//!        ▼                     ▼                     │
//!      Ward                  Ward                    │
//!  (WardFn, Ticker)                                  │
//!        │ publishes: WardStarting, HeartbeatTimeout, │ publishes: TaskFailed,
//!        │            WardStopped, TaskFailed         │ WorkerRetired, WorkerReplaced,
//!        ▼                                            ▼ FaultDropped, PoolStopped
//! ┌──────────────────────────────────────────────────────────────────┐
//! │                        Bus (broadcast channel)                   │
//! └─────────────────────────────────┬────────────────────────────────┘
//!                                   ▼
//!                       warden listener ──► SubscriberSet
//!                                        ┌───────┼───────┐
//!                                        ▼       ▼       ▼
//!                                      sub1    sub2    subN
//! ```
//!
//! Standalone pieces that need no warden:
//! ```text
//! pipeline:   repeat ─► take ─► tee ─┬─► stage ─┐
//!                                    └─► stage ─┴─► fan_in ─► consumer
//!             or(tokens) ─► one token cancelled by any input
//!
//! Group:      call(k) ─► one in-flight execution per key, result shared
//!
//! limits:     PrefixLimiter ─► Limiter (per path rule)
//!             MultiLimiter  ─► tightest tier first ─► ... ─► loosest tier
//! ```
//!
//! ## Features
//! | Area              | Description                                                   | Key types / functions                          |
//! |-------------------|---------------------------------------------------------------|------------------------------------------------|
//! | **Supervision**   | Restart work that stops beating its heartbeat.                | [`Steward`], [`Ward`], [`WardFn`], [`Ticker`]  |
//! | **Pipelines**     | Cancellation-aware stream stages over bounded channels.       | [`pipeline`] module                            |
//! | **Worker pool**   | Bounded queue, panic isolation, executor replacement.         | [`WorkerPool`]                                 |
//! | **Singleflight**  | Deduplicate concurrent calls by key.                          | [`Group`]                                      |
//! | **Rate limiting** | Token buckets, tiers and path-prefix rules.                   | [`Limiter`], [`MultiLimiter`], [`PrefixLimiter`] |
//! | **Subscriber API**| Observe runtime events (logging, metrics, custom handlers).   | [`Subscribe`], [`Event`]                       |
//! | **Errors**        | Typed errors with stable labels.                              | [`TaskError`], [`PoolError`], [`LimitError`]   |
//! | **Configuration** | Warden and pool settings.                                     | [`Config`], [`PoolConfig`]                     |
//!
//! ## Optional features
//! - `logging`: exports a simple built-in [`LogWriter`] _(demo/reference only)_.
//!
//! ## Example
//! ```rust
//! use std::sync::Arc;
//! use std::time::Duration;
//! use tokio_util::sync::CancellationToken;
//! use wardkit::{Config, TaskError, Ticker, Warden};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let mut cfg = Config::default();
//!     cfg.grace = Duration::from_secs(5);
//!
//!     #[cfg(feature = "logging")]
//!     let subs: Vec<Arc<dyn wardkit::Subscribe>> = vec![Arc::new(wardkit::LogWriter::new())];
//!     #[cfg(not(feature = "logging"))]
//!     let subs: Vec<Arc<dyn wardkit::Subscribe>> = Vec::new();
//!
//!     let warden = Warden::builder(cfg).with_subscribers(subs).build();
//!
//!     let sweep = Ticker::new("sweep", Duration::from_millis(100), warden.bus().clone(), |_ctx: CancellationToken| async {
//!         Ok::<(), TaskError>(())
//!     })
//!     .supervised(Duration::from_secs(1));
//!     warden.watch(&sweep);
//!
//!     let mut pool = warden.worker_pool("jobs", None)?;
//!     pool.submit(|_ctx| async { Ok(()) }).await?;
//!     pool.stop().await;
//!
//!     warden.token().cancel();
//!     warden.run().await?;
//!     Ok(())
//! }
//! ```

mod config;
mod core;
mod error;
mod events;
mod limit;
pub mod pipeline;
mod pool;
mod singleflight;
mod steward;
mod subscribers;

// ---- Public re-exports ----

pub use config::{Config, PoolConfig};
pub use core::{Warden, WardenBuilder};
pub use error::{CallError, ConfigError, LimitError, PoolError, RuntimeError, TaskError};
pub use events::{Bus, Event, EventKind};
pub use limit::{Limit, Limiter, MultiLimiter, PrefixLimiter, PrefixTree, RateLimit, Rule, per};
pub use pool::WorkerPool;
pub use singleflight::Group;
pub use steward::{Beat, Heartbeat, Pulse, Steward, Ticker, Ward, WardFn, WardRef, heartbeat};
pub use subscribers::{Subscribe, SubscriberSet};

// Optional: expose a simple built-in logger subscriber (demo/reference).
// Enable with: `--features logging`
#[cfg(feature = "logging")]
pub use subscribers::LogWriter;
