//! # Supervised ticker with a self-healing pool
//!
//! Demonstrates:
//! - a `Ticker` that hangs once and is restarted by its `Steward`
//! - a `WorkerPool` replacing an executor after a panic
//! - events printed by `LogWriter`
//! - graceful shutdown through the `Warden`
//!
//! Run with:
//! ```bash
//! cargo run --example supervised_ticker --features logging
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use wardkit::{Config, LogWriter, PoolConfig, Subscribe, TaskError, Ticker, Warden};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cfg = Config {
        grace: Duration::from_secs(2),
        ..Config::default()
    };
    let subs: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let warden = Warden::builder(cfg).with_subscribers(subs).build();

    // The third run blocks until cancelled; the steward notices the silence.
    let runs = Arc::new(AtomicU32::new(0));
    let report = Ticker::new(
        "report",
        Duration::from_millis(300),
        warden.bus().clone(),
        move |ctx: CancellationToken| {
            let n = runs.fetch_add(1, Ordering::SeqCst);
            async move {
                println!("report: run #{n}");
                if n == 2 {
                    ctx.cancelled().await;
                    return Err(TaskError::Canceled);
                }
                Ok(())
            }
        },
    )
    .supervised(Duration::from_secs(1));
    warden.watch(&report);

    let mut pool = warden.worker_pool("ingest", Some(PoolConfig::new(2, 16, 4)))?;
    let mut faults = pool.faults().ok_or("fault queue already taken")?;
    for i in 0..6u32 {
        pool.submit(move |_ctx| async move {
            if i == 3 {
                panic!("bad record {i}");
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
            Ok(())
        })
        .await?;
    }
    if let Some(fault) = faults.recv().await {
        println!("fault: {fault} ({})", fault.as_label());
    }
    pool.stop().await;
    println!("pool: {} live executors after stop", pool.live_workers());

    let token = warden.token();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_secs(3)).await;
        token.cancel();
    });
    warden.run().await?;
    println!("report: restarted {} time(s)", report.restarts());
    Ok(())
}
