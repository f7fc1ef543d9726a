//! # Cancellable pipeline with rate limiting and singleflight
//!
//! Demonstrates:
//! - `repeat_fn` → `take` → `tee` → two stages → `fan_in`
//! - `or` merging a deadline token with a manual one
//! - a `MultiLimiter` pacing the consumer
//! - `Group` collapsing duplicate lookups
//!
//! Run with:
//! ```bash
//! cargo run --example pipeline
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use wardkit::pipeline::{fan_in, or, repeat_fn, take, tee};
use wardkit::{Group, Limiter, MultiLimiter, RateLimit, per};

fn square(token: CancellationToken, mut rx: mpsc::Receiver<u64>) -> mpsc::Receiver<String> {
    let (tx, out) = mpsc::channel(1);
    tokio::spawn(async move {
        while let Some(v) = rx.recv().await {
            tokio::select! {
                _ = token.cancelled() => return,
                sent = tx.send(format!("{v}² = {}", v * v)) => if sent.is_err() { return },
            }
        }
    });
    out
}

fn halve(token: CancellationToken, mut rx: mpsc::Receiver<u64>) -> mpsc::Receiver<String> {
    let (tx, out) = mpsc::channel(1);
    tokio::spawn(async move {
        while let Some(v) = rx.recv().await {
            tokio::select! {
                _ = token.cancelled() => return,
                sent = tx.send(format!("{v}/2 = {}", v as f64 / 2.0)) => if sent.is_err() { return },
            }
        }
    });
    out
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let manual = CancellationToken::new();
    let deadline = CancellationToken::new();
    {
        let deadline = deadline.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(10)).await;
            deadline.cancel();
        });
    }
    let token = or(&[manual.clone(), deadline]);

    let mut n = 0u64;
    let numbers = take(
        token.clone(),
        repeat_fn(token.clone(), move || {
            n += 1;
            n
        }),
        8,
    );
    let (left, right) = tee(token.clone(), numbers);
    let mut merged = fan_in(
        token.clone(),
        vec![square(token.clone(), left), halve(token.clone(), right)],
    );

    let tiers: Vec<Arc<dyn RateLimit>> = vec![
        Arc::new(Limiter::new(per(20, Duration::from_secs(1)), 5)?),
        Arc::new(Limiter::new(per(5, Duration::from_secs(1)), 2)?),
    ];
    let pace = MultiLimiter::new(tiers)?;
    println!("consumer paced at {}", pace.limit());

    while let Some(line) = merged.recv().await {
        pace.wait(&token).await?;
        println!("{line}");
    }

    let lookups = Arc::new(AtomicU32::new(0));
    let group: Arc<Group<&'static str, u32, String>> = Arc::new(Group::new());
    let mut callers = Vec::new();
    for _ in 0..5 {
        let (group, lookups) = (group.clone(), lookups.clone());
        callers.push(tokio::spawn(async move {
            group
                .call("config", || async move {
                    lookups.fetch_add(1, Ordering::SeqCst);
                    tokio::time::sleep(Duration::from_millis(100)).await;
                    Ok(42)
                })
                .await
        }));
    }
    for caller in callers {
        println!("config = {:?}", caller.await?);
    }
    println!("backend lookups: {}", lookups.load(Ordering::SeqCst));

    manual.cancel();
    Ok(())
}
