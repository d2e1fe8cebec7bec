//! # Ready queue: priority-ordered, FIFO within a priority.
//!
//! Entries are ranked by `(priority desc, sequence asc)`. The sequence comes from
//! a per-queue counter:
//! - a fresh submission or a retry takes a **new** sequence number,
//! - a dependency re-check pushes the entry back with its **original** key.
//!
//! ```text
//! push ──► BinaryHeap<QueueEntry> (max-heap, see Ord) ──► pop(poll)
//!   └─► Notify::notify_one()                    ▲
//!                                               └─ waits ≤ poll, then gives up
//! ```
//!
//! Many producers (API, dispatcher, timers), one consumer (the dispatch loop).

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicU64, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::Notify;

use crate::tasks::{Priority, TaskId};

/// Ordering key plus task id.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct QueueEntry {
    pub id: TaskId,
    pub priority: Priority,
    pub seq: u64,
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        self.priority
            .cmp(&other.priority)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

pub(crate) struct ReadyQueue {
    heap: Mutex<BinaryHeap<QueueEntry>>,
    notify: Notify,
    next_seq: AtomicU64,
}

impl ReadyQueue {
    pub fn new() -> Self {
        Self {
            heap: Mutex::new(BinaryHeap::new()),
            notify: Notify::new(),
            next_seq: AtomicU64::new(0),
        }
    }

    /// Enqueues `id` under a fresh sequence number and returns its key.
    pub fn push_new(&self, id: TaskId, priority: Priority) -> QueueEntry {
        let entry = QueueEntry {
            id,
            priority,
            seq: self.next_seq.fetch_add(1, AtomicOrdering::Relaxed),
        };
        self.push(entry);
        entry
    }

    /// Enqueues an entry keeping its key.
    pub fn push(&self, entry: QueueEntry) {
        self.heap().push(entry);
        self.notify.notify_one();
    }

    pub fn try_pop(&self) -> Option<QueueEntry> {
        self.heap().pop()
    }

    /// Pops the best entry, waiting at most `poll` for one to arrive.
    pub async fn pop(&self, poll: Duration) -> Option<QueueEntry> {
        if let Some(entry) = self.try_pop() {
            return Some(entry);
        }
        let _ = tokio::time::timeout(poll, self.notify.notified()).await;
        self.try_pop()
    }

    fn heap(&self) -> MutexGuard<'_, BinaryHeap<QueueEntry>> {
        self.heap.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
