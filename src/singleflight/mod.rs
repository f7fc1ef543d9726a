//! # Duplicate call suppression.
//!
//! ```text
//! call(k) ──► leader  ──► f() ──► remove k ──► broadcast ──► result
//! call(k) ──► waiter  ─────────────────────────────┘ (clone)
//! call(k) ──► waiter  ─────────────────────────────┘ (clone)
//! ```
//!
//! Each key has at most one execution in flight. Results are not retained:
//! a call that starts after the broadcast runs again.

mod group;

pub use group::Group;
