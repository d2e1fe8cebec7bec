//! # Subscriber trait
//!
//! `Subscribe` is the extension point for plugging custom event handlers into
//! the scheduler (metrics, audit trails, UI progress).
//!
//! ## Rules
//! - Implementations may be slow; they never block the publisher nor other subscribers.
//! - Each subscriber declares its queue capacity via [`Subscribe::queue_capacity`].
//!   When its queue is full, events for that subscriber are dropped.
//!
//! - `on_event` runs on the subscriber's own worker, one event at a time.
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use taskdeck::{Event, EventKind, Subscribe};
//!
//! #[derive(Default)]
//! struct FailureCounter(AtomicUsize);
//!
//! #[async_trait::async_trait]
//! impl Subscribe for FailureCounter {
//!     async fn on_event(&self, ev: &Event) {
//!         if ev.kind == EventKind::TaskFailed {
//!             self.0.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!     fn name(&self) -> &'static str { "failure-counter" }
//! }
//! ```

use async_trait::async_trait;

use crate::events::Event;

/// Receiver of lifecycle events.
#[async_trait]
pub trait Subscribe: Send + Sync + 'static {
    /// Handles one event.
    async fn on_event(&self, event: &Event);

    /// Human-readable name (for logs).
    fn name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Capacity of this subscriber's queue.
    fn queue_capacity(&self) -> usize {
        1024
    }
}
