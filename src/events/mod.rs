//! Runtime events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to events emitted by stewards, tickers, worker pools,
//! subscriber workers and the warden.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast` that also stamps sequence numbers
//!
//! ## Quick reference
//! - **Publishers**: `Steward`, `Ticker`, `WorkerPool` executors, `SubscriberSet`
//!   workers (overflow/panic), `Warden` (shutdown).
//! - **Consumers**: the warden listener (fans out to `SubscriberSet`), or any
//!   receiver obtained from [`Bus::subscribe`].

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
