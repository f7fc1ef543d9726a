//! # Core subscriber trait
//!
//! `Subscribe` is the extension point for plugging event handlers into the
//! runtime. Each subscriber is driven by a dedicated worker loop fed by a bounded
//! queue owned by the [`SubscriberSet`](crate::SubscriberSet).
//!
//! ## Contract
//! - Implementations may be slow; they do **not** block publishers nor other subscribers.
//! - If a subscriber's queue overflows, events for that subscriber are **dropped**.

use crate::events::Event;
use async_trait::async_trait;

/// Contract for event subscribers.
///
/// # Example
/// ```rust
/// use async_trait::async_trait;
/// use wardkit::{Event, EventKind, Subscribe};
///
/// struct Restarts;
///
/// #[async_trait]
/// impl Subscribe for Restarts {
///     async fn on_event(&self, ev: &Event) {
///         if ev.kind == EventKind::HeartbeatTimeout {
///             // page someone
///         }
///     }
///     fn name(&self) -> &'static str { "restarts" }
/// }
/// ```
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handle a single event for this subscriber.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs/metrics).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Preferred capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
