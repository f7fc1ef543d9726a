//! Relay stages: `or_done`, `bridge`, `tee`, `fan_in`, `take`.

use tokio::{sync::mpsc, task::JoinSet};
use tokio_util::sync::CancellationToken;

use super::STAGE_CAPACITY;

/// Receives the next value, or `None` on close or cancellation.
async fn next<T>(token: &CancellationToken, input: &mut mpsc::Receiver<T>) -> Option<T> {
    tokio::select! {
        biased;
        _ = token.cancelled() => None,
        v = input.recv() => v,
    }
}

/// Sends one value; `false` when cancelled or the consumer is gone.
async fn forward<T>(token: &CancellationToken, tx: &mpsc::Sender<T>, value: T) -> bool {
    tokio::select! {
        biased;
        _ = token.cancelled() => false,
        sent = tx.send(value) => sent.is_ok(),
    }
}

async fn relay<T>(token: &CancellationToken, input: &mut mpsc::Receiver<T>, tx: &mpsc::Sender<T>) {
    while let Some(v) = next(token, input).await {
        if !forward(token, tx, v).await {
            return;
        }
    }
}

/// Relays `input` until it closes or `token` fires.
///
/// The output is closed on every exit path, so a consumer looping on `recv()`
/// never hangs on a cancelled pipeline.
pub fn or_done<T: Send + 'static>(
    token: CancellationToken,
    mut input: mpsc::Receiver<T>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
    tokio::spawn(async move { relay(&token, &mut input, &tx).await });
    rx
}

/// Flattens a stream of streams, draining each inner stream before taking the next.
///
/// Order within and across inner streams is preserved. Exits when the outer
/// stream closes or `token` fires.
pub fn bridge<T: Send + 'static>(
    token: CancellationToken,
    mut streams: mpsc::Receiver<mpsc::Receiver<T>>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
    tokio::spawn(async move {
        while let Some(stream) = next(&token, &mut streams).await {
            let mut inner = or_done(token.clone(), stream);
            while let Some(v) = inner.recv().await {
                if !forward(&token, &tx, v).await {
                    return;
                }
            }
        }
    });
    rx
}

/// Duplicates every value of `input` onto two outputs.
///
/// Each value is written once to each output, in whichever order the outputs
/// become ready; an output is marked spent as soon as it took the value. A
/// dropped output counts as spent. Cancellation aborts the fan-out at once.
pub fn tee<T: Clone + Send + 'static>(
    token: CancellationToken,
    input: mpsc::Receiver<T>,
) -> (mpsc::Receiver<T>, mpsc::Receiver<T>) {
    let (tx1, rx1) = mpsc::channel(STAGE_CAPACITY);
    let (tx2, rx2) = mpsc::channel::<T>(STAGE_CAPACITY);
    tokio::spawn(async move {
        let mut input = or_done(token.clone(), input);
        while let Some(v) = input.recv().await {
            if tx1.is_closed() && tx2.is_closed() {
                return;
            }
            let (mut spent1, mut spent2) = (false, false);
            while !(spent1 && spent2) {
                tokio::select! {
                    biased;
                    _ = token.cancelled() => return,
                    permit = tx1.reserve(), if !spent1 => {
                        if let Ok(permit) = permit {
                            permit.send(v.clone());
                        }
                        spent1 = true;
                    }
                    permit = tx2.reserve(), if !spent2 => {
                        if let Ok(permit) = permit {
                            permit.send(v.clone());
                        }
                        spent2 = true;
                    }
                }
            }
        }
    });
    (rx1, rx2)
}

/// Merges `streams` into one output, one watcher task per input.
///
/// A finalizer owns the output sender and waits for every watcher, so the
/// output closes only after all inputs are drained or `token` fires.
pub fn fan_in<T: Send + 'static>(
    token: CancellationToken,
    streams: Vec<mpsc::Receiver<T>>,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
    let mut watchers = JoinSet::new();
    for mut stream in streams {
        let tx = tx.clone();
        let token = token.clone();
        watchers.spawn(async move { relay(&token, &mut stream, &tx).await });
    }
    tokio::spawn(async move {
        while watchers.join_next().await.is_some() {}
        drop(tx);
    });
    rx
}

/// Forwards the first `n` values received from `input`, then closes.
///
/// Closes early if `input` closes or `token` fires.
pub fn take<T: Send + 'static>(
    token: CancellationToken,
    mut input: mpsc::Receiver<T>,
    n: usize,
) -> mpsc::Receiver<T> {
    let (tx, rx) = mpsc::channel(STAGE_CAPACITY);
    tokio::spawn(async move {
        for _ in 0..n {
            let Some(v) = next(&token, &mut input).await else {
                return;
            };
            if !forward(&token, &tx, v).await {
                return;
            }
        }
    });
    rx
}
