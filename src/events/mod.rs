//! Scheduler events: types and broadcast bus.
//!
//! This module groups the event **data model** and the **bus** used to
//! publish/subscribe to lifecycle events emitted by the scheduler, the dispatch
//! loop, attempt workers and subscriber workers.
//!
//! ## Contents
//! - [`EventKind`], [`Event`] event classification and payload metadata
//! - [`Bus`] thin wrapper over `tokio::sync::broadcast`
//!
//! ## Quick reference
//! - **Publishers**: `Scheduler` (submit/cancel/stop), `Dispatcher` loop,
//!   `runner::run_attempt`, completion handling, `SubscriberSet` workers.
//! - **Consumers**: the fan-out listener spawned by the builder, which forwards
//!   to `SubscriberSet`.

mod bus;
mod event;

pub use bus::Bus;
pub use event::{Event, EventKind};
