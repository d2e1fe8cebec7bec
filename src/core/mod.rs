//! Runtime core: queueing, dispatch and lifecycle.
//!
//! The only public API from this module is [`Scheduler`] (built through
//! [`SchedulerBuilder`]) and the [`Stats`] snapshot it returns.
//!
//! Internal modules:
//! - [`queue`]: priority-ordered ready queue, FIFO within a priority;
//! - [`gate`]: dependency check run before every dispatch;
//! - [`registry`]: active/completed partitions and every status transition;
//! - [`runner`]: executes one attempt with timeout and panic capture;
//! - [`dispatcher`]: the loop feeding attempts to the bounded worker pool;
//! - [`shutdown`]: OS termination signals.

mod builder;
mod dispatcher;
mod gate;
mod queue;
mod registry;
mod runner;
mod scheduler;
mod shutdown;
mod stats;

pub use builder::SchedulerBuilder;
pub use scheduler::Scheduler;
pub use stats::Stats;
