// SPDX-License-Identifier: GPL-3.0-only

//! Process-wide slot holding the sink a native logging callback reaches.
//!
//! Every engine handle gets its own owner id. Only the handle that installed
//! the current sink can clear it, so dropping a stale handle never silences
//! a newer one.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, PoisonError};

use crate::diagnostics::CaptureSink;

pub(crate) struct SinkSlot {
    next_owner: AtomicU64,
    active: Mutex<Option<(u64, CaptureSink)>>,
}

impl SinkSlot {
    pub(crate) const fn new() -> Self {
        Self {
            next_owner: AtomicU64::new(1),
            active: Mutex::new(None),
        }
    }

    /// Allocate an id for a new engine handle.
    pub(crate) fn register(&self) -> u64 {
        self.next_owner.fetch_add(1, Ordering::Relaxed)
    }

    /// Replace the active sink with `owner`'s.
    pub(crate) fn install(&self, owner: u64, sink: CaptureSink) {
        *self.active.lock().unwrap_or_else(PoisonError::into_inner) = Some((owner, sink));
    }

    pub(crate) fn current(&self) -> Option<CaptureSink> {
        self.active
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .map(|(_, sink)| sink.clone())
    }

    /// Clear the slot if `owner` still holds it. Returns whether it did.
    pub(crate) fn release(&self, owner: u64) -> bool {
        let mut active = self.active.lock().unwrap_or_else(PoisonError::into_inner);
        if active.as_ref().is_some_and(|(holder, _)| *holder == owner) {
            *active = None;
            true
        } else {
            false
        }
    }
}
