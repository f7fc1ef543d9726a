//! # Cancellation fan-in.
//!
//! [`or`] merges N independent cancellation tokens into one that fires as soon
//! as any input fires.
//!
//! ```text
//! token 1 ──┐
//! token 2 ──┼──► watcher (select_all) ──► merged.cancel()
//!   ...     │            ▲
//! token N ──┘            └── merged itself (holder cancelled it)
//! ```
//!
//! A single watcher waits on every input at once, so the construction costs
//! one task regardless of N. The watcher holds a drop guard on the merged
//! token: whichever way it exits, the merged token ends up cancelled and the
//! watcher never outlives it.

use futures::future::select_all;
use tokio_util::sync::CancellationToken;

/// Returns a token cancelled as soon as any of `tokens` is cancelled.
///
/// - zero tokens → a fresh token that is never cancelled
/// - one token → a child of that token
/// - any token already cancelled → an already-cancelled token
///
/// Cancelling the returned token does **not** cancel the inputs.
///
/// # Example
/// ```rust
/// use tokio_util::sync::CancellationToken;
/// use wardkit::pipeline::or;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let caller = CancellationToken::new();
/// let own = CancellationToken::new();
/// let merged = or(&[caller.clone(), own.clone()]);
///
/// own.cancel();
/// merged.cancelled().await;
/// assert!(!caller.is_cancelled());
/// # }
/// ```
pub fn or(tokens: &[CancellationToken]) -> CancellationToken {
    match tokens {
        [] => return CancellationToken::new(),
        [only] => return only.child_token(),
        _ => {}
    }

    let merged = CancellationToken::new();
    if tokens.iter().any(CancellationToken::is_cancelled) {
        merged.cancel();
        return merged;
    }

    let mut watched: Vec<_> = tokens
        .iter()
        .cloned()
        .map(|t| Box::pin(t.cancelled_owned()))
        .collect();
    watched.push(Box::pin(merged.clone().cancelled_owned()));

    let guard = merged.clone().drop_guard();
    tokio::spawn(async move {
        let _guard = guard;
        let _ = select_all(watched).await;
    });
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tokio::time::timeout;

    #[test]
    fn zero_inputs_never_fire() {
        let t = or(&[]);
        assert!(!t.is_cancelled());
    }

    #[tokio::test]
    async fn single_input_yields_child() {
        let a = CancellationToken::new();
        let t = or(std::slice::from_ref(&a));
        t.cancel();
        assert!(!a.is_cancelled());

        let t = or(std::slice::from_ref(&a));
        a.cancel();
        assert!(t.is_cancelled());
    }

    #[tokio::test]
    async fn fires_after_any_of_many_inputs() {
        for k in [2usize, 3, 4, 7, 64] {
            for fired in [0, k / 2, k - 1] {
                let inputs: Vec<_> = (0..k).map(|_| CancellationToken::new()).collect();
                let merged = or(&inputs);
                assert!(!merged.is_cancelled());

                inputs[fired].cancel();
                timeout(Duration::from_secs(1), merged.cancelled())
                    .await
                    .unwrap_or_else(|_| panic!("k={k} fired={fired} not propagated"));

                for (i, t) in inputs.iter().enumerate() {
                    assert_eq!(t.is_cancelled(), i == fired, "leaked upward to {i}");
                }
            }
        }
    }

    #[tokio::test]
    async fn already_cancelled_input_short_circuits() {
        let a = CancellationToken::new();
        let b = CancellationToken::new();
        b.cancel();
        assert!(or(&[a.clone(), b]).is_cancelled());
        assert!(!a.is_cancelled());
    }

    #[tokio::test]
    async fn cancelling_merged_leaves_inputs_alone() {
        let inputs: Vec<_> = (0..5).map(|_| CancellationToken::new()).collect();
        let merged = or(&inputs);
        merged.cancel();
        tokio::task::yield_now().await;
        assert!(inputs.iter().all(|t| !t.is_cancelled()));
    }
}
