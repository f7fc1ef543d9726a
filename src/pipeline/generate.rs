//! Unbounded generators: `repeat` and `repeat_fn`.
//!
//! Both produce values lazily (one ahead of the consumer at most) until the
//! token fires or the consumer drops the stream. A generator cannot be
//! rewound; build a new one to start over.

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::STAGE_CAPACITY;

/// Emits `f()` over and over until cancellation.
pub fn repeat_fn<T, F>(token: CancellationToken, mut f: F) -> mpsc::Receiver<T>
where
    T: Send + 'static,
    F: FnMut() -> T + Send + 'static,
{
    let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
    tokio::spawn(async move {
        while !token.is_cancelled() {
            let value = f();
            tokio::select! {
                biased;
                _ = token.cancelled() => return,
                sent = tx.send(value) => if sent.is_err() { return },
            }
        }
    });
    rx
}

/// Cycles through `values` until cancellation.
///
/// An empty list yields a stream that is already closed.
pub fn repeat<T: Clone + Send + 'static>(
    token: CancellationToken,
    values: Vec<T>,
) -> mpsc::Receiver<T> {
    if values.is_empty() {
        let (_, rx) = mpsc::channel(1);
        return rx;
    }
    let mut at = 0;
    repeat_fn(token, move || {
        let v = values[at].clone();
        at = (at + 1) % values.len();
        v
    })
}
