//! # Event subscribers.
//!
//! Subscribers observe the lifecycle [`Event`](crate::Event) stream without
//! slowing down dispatch: each one is driven by its own worker task fed by a
//! bounded queue owned by [`SubscriberSet`].
//!
//! ```text
//! Bus ──► fan-out listener ──► SubscriberSet::emit(&Event)
//!                                   ├──► [queue S1] ─► worker ─► S1.on_event()
//!                                   ├──► [queue S2] ─► worker ─► S2.on_event()
//!                                   └──► [queue SN] ─► worker ─► SN.on_event()
//! ```
//!
//! Built-in: [`LogWriter`] (feature `logging`) forwards events to `tracing`.

mod set;
mod subscribe;

#[cfg(feature = "logging")]
mod log;

#[cfg(feature = "logging")]
pub use log::LogWriter;
pub use set::SubscriberSet;
pub use subscribe::Subscribe;
