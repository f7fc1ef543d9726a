//! # Cancellation-aware pipeline combinators.
//!
//! Stages are tokio tasks connected by bounded `mpsc` channels. Every stage
//! takes a [`CancellationToken`](tokio_util::sync::CancellationToken); every
//! receive and every send races that token, so no stage blocks forever once
//! cancellation fires. A stage's output channel is closed on every exit path
//! (input drained, consumer gone, cancellation), so consumers can simply loop
//! on `recv()` until `None`.
//!
//! ```text
//!             ┌──────────┐
//! repeat ───► │ take(n)  │ ──► tee ──┬──► stage A ──┐
//!             └──────────┘           └──► stage B ──┴──► fan_in ──► consumer
//! ```
//!
//! ## Ordering
//! - `or_done`, `bridge`, `take` preserve the source order.
//! - `fan_in` and `tee` make no ordering guarantee across distinct outputs/sources.
//!
//! All constructors spawn tasks and must be called inside a tokio runtime.

mod generate;
mod or;
mod stages;

pub use generate::{repeat, repeat_fn};
pub use or::or;
pub use stages::{bridge, fan_in, or_done, take, tee};

/// Capacity of every stage output.
///
/// One slot keeps producers at most one value ahead of their consumer.
pub const STAGE_CAPACITY: usize = 1;

#[cfg(test)]
pub(crate) mod testing {
    use tokio::sync::mpsc;

    /// Finite source: a closed channel already holding `values`.
    pub fn source<T: Send + 'static>(values: Vec<T>) -> mpsc::Receiver<T> {
        let (tx, rx) = mpsc::channel(values.len().max(1));
        for v in values {
            tx.try_send(v).ok();
        }
        rx
    }

    /// Drains a stream to completion.
    pub async fn collect<T>(mut rx: mpsc::Receiver<T>) -> Vec<T> {
        let mut out = Vec::new();
        while let Some(v) = rx.recv().await {
            out.push(v);
        }
        out
    }
}
