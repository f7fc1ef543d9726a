//! # Rate limiting.
//!
//! ```text
//!            ┌──────────────┐   per-path rule    ┌─────────┐
//! request ──►│ PrefixLimiter│ ─────────────────► │ Limiter │ ──► permit
//!            └──────────────┘  (longest prefix)  └─────────┘
//!
//!            ┌──────────────┐   tightest → loosest
//! request ──►│ MultiLimiter │ ──► tier 1 ──► tier 2 ──► ... ──► permit
//!            └──────────────┘
//! ```
//!
//! - [`Limit`] / [`per`]: rates.
//! - [`Limiter`]: single token bucket.
//! - [`RateLimit`]: the waiting contract, shared by both limiters.
//! - [`PrefixTree`], [`Rule`], [`PrefixLimiter`]: path-based resolution.
//!
//! Every wait races the caller's cancellation token.

mod bucket;
mod multi;
mod prefix;
mod rate;
mod tree;

pub use bucket::Limiter;
pub use multi::{MultiLimiter, RateLimit};
pub use prefix::{PrefixLimiter, Rule};
pub use rate::{Limit, per};
pub use tree::PrefixTree;
