//! # Heartbeat supervision.
//!
//! A [`Ward`] is a long-running unit of work that proves liveness by beating a
//! [`Pulse`]. A [`Steward`] starts the ward, watches its [`Heartbeat`], and
//! restarts it when it stays silent for a whole timeout window.
//!
//! ## Lifecycle
//! ```text
//! Starting ──► Running ──(silence ≥ timeout)──► cancel scope ──► Starting ...
//!                 │
//!                 └──(parent cancelled)──► Stopped
//! ```
//!
//! ## Contents
//! - [`heartbeat`], [`Pulse`], [`Heartbeat`]: bounded liveness queue (drop-on-full)
//! - [`Ward`], [`WardFn`], [`WardRef`]: the monitored-task contract
//! - [`Steward`]: the supervisor; itself a [`Ward`], so stewards nest
//! - [`Ticker`]: periodic job packaged as a ward

mod heartbeat;
mod steward;
mod ticker;
mod ward;

pub use heartbeat::{Beat, Heartbeat, Pulse, heartbeat};
pub use steward::Steward;
pub use ticker::Ticker;
pub use ward::{Ward, WardFn, WardRef};
