use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use crate::error::CallError;

type Outcome<V, E> = Option<Result<V, E>>;

enum Role<V, E> {
    Leader(watch::Sender<Outcome<V, E>>),
    Follower(watch::Receiver<Outcome<V, E>>),
}

/// # Per-key call deduplication.
///
/// While a call for `key` is in flight, further calls for the same key wait
/// for it and receive a clone of its result. The entry is removed as soon as
/// the call completes, so nothing is cached.
///
/// If the leading caller is dropped (cancelled, timed out, aborted) before its
/// work completes, the entry is removed and the waiting callers contend
/// again: one of them runs its own work as the new leader.
///
/// # Example
/// ```rust
/// use wardkit::Group;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let group: Group<&str, u32, String> = Group::new();
/// let v = group.call("answer", || async { Ok(42) }).await;
/// assert_eq!(v, Ok(42));
/// assert_eq!(group.in_flight(), 0);
/// # }
/// ```
pub struct Group<K, V, E> {
    calls: Mutex<HashMap<K, watch::Receiver<Outcome<V, E>>>>,
}

impl<K, V, E> Group<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    /// Creates an empty group.
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(HashMap::new()),
        }
    }

    /// Runs `f` for `key` unless a call for `key` is already in flight, in
    /// which case its result is shared.
    pub async fn call<F, Fut>(&self, key: K, f: F) -> Result<V, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        let tx = loop {
            let mut rx = match self.join(&key) {
                Role::Leader(tx) => break tx,
                Role::Follower(rx) => rx,
            };
            let shared = match rx.wait_for(Option::is_some).await {
                Ok(outcome) => (*outcome).clone(),
                // leader abandoned the call
                Err(_) => None,
            };
            if let Some(res) = shared {
                return res;
            }
        };

        let mut lease = Lease {
            group: self,
            key: Some(key),
        };
        let res = f().await;
        lease.release();
        let _ = tx.send(Some(res.clone()));
        res
    }

    /// Like [`call`](Self::call), but gives up when `token` is cancelled.
    ///
    /// A cancelled leader hands the key over to its followers.
    pub async fn call_until<F, Fut>(
        &self,
        token: &CancellationToken,
        key: K,
        f: F,
    ) -> Result<V, CallError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        tokio::select! {
            biased;
            _ = token.cancelled() => Err(CallError::Canceled),
            res = self.call(key, f) => res.map_err(CallError::Failed),
        }
    }

    /// Number of keys with a call in flight.
    pub fn in_flight(&self) -> usize {
        self.lock().len()
    }

    fn join(&self, key: &K) -> Role<V, E> {
        let mut calls = self.lock();
        if let Some(rx) = calls.get(key) {
            return Role::Follower(rx.clone());
        }
        let (tx, rx) = watch::channel(None);
        calls.insert(key.clone(), rx);
        Role::Leader(tx)
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<K, watch::Receiver<Outcome<V, E>>>> {
        self.calls.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<K, V, E> Default for Group<K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

/// Leader's claim on a key; dropping it unreleased frees the key.
struct Lease<'a, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    group: &'a Group<K, V, E>,
    key: Option<K>,
}

impl<K, V, E> Lease<'_, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn release(&mut self) {
        if let Some(key) = self.key.take() {
            self.group.lock().remove(&key);
        }
    }
}

impl<K, V, E> Drop for Lease<'_, K, V, E>
where
    K: Eq + Hash + Clone,
    V: Clone,
    E: Clone,
{
    fn drop(&mut self) {
        self.release();
    }
}
