//! # Self-healing worker pool.
//!
//! ```text
//! submit ──► [job queue] ──► executor 1 ─┐
//!                        ├─► executor 2 ─┼─► Ok / Fail     → keep going
//!                        └─► executor N ─┘   Fatal / panic → fault queue,
//!                                                             retire, replace
//! ```
//!
//! Executors of one launch form a crew. `stop` closes the queue and waits for
//! the crew; `restart` launches a new crew that shares the old fault queue.

mod crew;
mod worker_pool;

pub use worker_pool::WorkerPool;
