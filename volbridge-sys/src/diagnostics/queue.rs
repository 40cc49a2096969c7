// SPDX-License-Identifier: GPL-3.0-only

//! FIFO of diagnostics captured from the engine's logging callback.
//!
//! The engine may push from its own call stack (possibly nested, possibly on
//! another thread) while the host drains from its own. Every operation holds
//! the same mutex for its whole duration, so a pop never sees a half-linked
//! entry and pushes never interleave.

use std::collections::VecDeque;
use std::ffi::CString;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};

use thiserror::Error;

#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueueError {
    #[error("pop on empty diagnostic queue")]
    PopOnEmpty,
}

#[derive(Debug, Default)]
struct Shared {
    entries: Mutex<VecDeque<CString>>,
    dropped: AtomicU64,
}

/// Shared handle to a diagnostic queue. Clones refer to the same queue.
#[derive(Debug, Clone, Default)]
pub struct DiagnosticQueue {
    shared: Arc<Shared>,
}

static GLOBAL_QUEUE: OnceLock<DiagnosticQueue> = OnceLock::new();

impl DiagnosticQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Process-wide queue, created on first use.
    ///
    /// Repeated calls return the same queue and never discard its contents;
    /// use [`reset`](Self::reset) to clear it explicitly.
    pub fn global() -> &'static DiagnosticQueue {
        GLOBAL_QUEUE.get_or_init(DiagnosticQueue::new)
    }

    // A panic while the lock was held cannot leave the deque half-updated,
    // so a poisoned lock is still safe to use.
    fn entries(&self) -> MutexGuard<'_, VecDeque<CString>> {
        self.shared
            .entries
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Append at the tail.
    pub fn push(&self, entry: CString) {
        self.entries().push_back(entry);
    }

    /// Append at the tail without aborting on allocation failure.
    ///
    /// Returns the entry back when the queue could not grow; the drop is
    /// counted in [`dropped`](Self::dropped).
    pub fn try_push(&self, entry: CString) -> Result<(), CString> {
        let mut entries = self.entries();
        if entries.try_reserve(1).is_err() {
            drop(entries);
            self.record_drop();
            return Err(entry);
        }
        entries.push_back(entry);
        Ok(())
    }

    /// Remove and return the head, or None when empty.
    pub fn pop(&self) -> Option<CString> {
        self.entries().pop_front()
    }

    /// Like [`pop`](Self::pop), for callers that treat an empty queue as a
    /// contract violation.
    pub fn try_pop(&self) -> Result<CString, QueueError> {
        self.pop().ok_or(QueueError::PopOnEmpty)
    }

    pub fn is_empty(&self) -> bool {
        self.entries().is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    /// Pop every entry, head first, under a single lock.
    pub fn drain(&self) -> Vec<CString> {
        self.entries().drain(..).collect()
    }

    /// Discard all entries and the drop counter.
    pub fn reset(&self) {
        self.entries().clear();
        self.shared.dropped.store(0, Ordering::Relaxed);
    }

    /// Number of messages lost because storage could not be reserved.
    pub fn dropped(&self) -> u64 {
        self.shared.dropped.load(Ordering::Relaxed)
    }

    pub(crate) fn record_drop(&self) {
        self.shared.dropped.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(text: &str) -> CString {
        CString::new(text).unwrap()
    }

    #[test]
    fn new_queue_is_empty() {
        let queue = DiagnosticQueue::new();
        assert!(queue.is_empty());
        assert_eq!(queue.len(), 0);
        assert_eq!(queue.pop(), None);
        assert_eq!(queue.try_pop(), Err(QueueError::PopOnEmpty));
    }

    #[test]
    fn pops_in_push_order() {
        let queue = DiagnosticQueue::new();
        for text in ["one", "two", "three"] {
            queue.push(entry(text));
            assert!(!queue.is_empty());
        }

        assert_eq!(queue.pop(), Some(entry("one")));
        assert_eq!(queue.try_pop(), Ok(entry("two")));
        assert_eq!(queue.pop(), Some(entry("three")));
        assert!(queue.is_empty());
    }

    #[test]
    fn is_empty_does_not_consume() {
        let queue = DiagnosticQueue::new();
        queue.push(entry("kept"));
        assert!(!queue.is_empty());
        assert!(!queue.is_empty());
        assert_eq!(queue.len(), 1);
    }

    #[test]
    fn clones_share_entries() {
        let producer = DiagnosticQueue::new();
        let consumer = producer.clone();
        producer.push(entry("shared"));
        assert!(producer.try_push(entry("also shared")).is_ok());

        assert_eq!(consumer.drain(), vec![entry("shared"), entry("also shared")]);
        assert!(producer.is_empty());
    }

    #[test]
    fn reset_clears_entries_and_drop_count() {
        let queue = DiagnosticQueue::new();
        queue.push(entry("stale"));
        queue.record_drop();
        assert_eq!(queue.dropped(), 1);

        queue.reset();
        assert!(queue.is_empty());
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn global_queue_is_created_once() {
        let first = DiagnosticQueue::global();
        let second = DiagnosticQueue::global();
        assert!(Arc::ptr_eq(&first.shared, &second.shared));
    }
}
