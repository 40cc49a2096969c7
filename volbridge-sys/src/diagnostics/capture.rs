// SPDX-License-Identifier: GPL-3.0-only

//! Capture filter installed as the engine's logging sink.

use std::ffi::{CStr, CString};

use super::DiagnosticQueue;

/// Engine severity kept by the capture filter (liblvm2cmd level 4).
pub const CAPTURE_LEVEL: i32 = 4;

/// Arguments of one engine logging callback.
#[derive(Debug, Clone, Copy)]
pub struct LogRecord<'a> {
    pub level: i32,
    pub file: &'a CStr,
    pub line: i32,
    pub errno: i32,
    pub message: &'a CStr,
}

/// Handle the engine calls back into.
///
/// Holds only what the callback needs: the queue it feeds and the level it
/// accepts.
#[derive(Debug, Clone)]
pub struct CaptureSink {
    queue: DiagnosticQueue,
    level: i32,
}

impl CaptureSink {
    pub fn new(queue: DiagnosticQueue) -> Self {
        Self::with_level(queue, CAPTURE_LEVEL)
    }

    pub fn with_level(queue: DiagnosticQueue, level: i32) -> Self {
        Self { queue, level }
    }

    pub fn level(&self) -> i32 {
        self.level
    }

    pub fn queue(&self) -> &DiagnosticQueue {
        &self.queue
    }

    pub fn accepts(&self, level: i32) -> bool {
        level == self.level
    }

    /// Copy an accepted message into the queue; discard everything else.
    ///
    /// Never fails: a message that cannot be stored is dropped and counted.
    pub fn log(&self, record: &LogRecord<'_>) {
        if !self.accepts(record.level) {
            return;
        }

        match copy_message(record.message) {
            Some(owned) => {
                // A refused push already counts the drop.
                let _ = self.queue.try_push(owned);
            }
            None => self.queue.record_drop(),
        }
    }
}

fn copy_message(message: &CStr) -> Option<CString> {
    let bytes = message.to_bytes_with_nul();
    let mut owned = Vec::new();
    owned.try_reserve_exact(bytes.len()).ok()?;
    owned.extend_from_slice(bytes);
    CString::from_vec_with_nul(owned).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record<'a>(level: i32, message: &'a CStr) -> LogRecord<'a> {
        LogRecord {
            level,
            file: c"toollib.c",
            line: 42,
            errno: 0,
            message,
        }
    }

    #[test]
    fn keeps_only_capture_level_in_order() {
        let queue = DiagnosticQueue::new();
        let sink = CaptureSink::new(queue.clone());

        sink.log(&record(7, c"debug noise"));
        sink.log(&record(4, c"  Physical volume \"/dev/sda1\" successfully created."));
        sink.log(&record(3, c"error-level chatter"));
        sink.log(&record(5, c"notice"));
        sink.log(&record(4, c"second"));

        assert_eq!(
            queue.drain(),
            vec![
                CString::from(c"  Physical volume \"/dev/sda1\" successfully created."),
                CString::from(c"second"),
            ]
        );
    }

    #[test]
    fn rejected_levels_leave_queue_untouched() {
        let queue = DiagnosticQueue::new();
        let sink = CaptureSink::new(queue.clone());

        for level in [0, 1, 2, 3, 5, 6, 7, -1] {
            sink.log(&record(level, c"ignored"));
        }

        assert!(queue.is_empty());
        assert_eq!(queue.dropped(), 0);
    }

    #[test]
    fn copy_keeps_terminator_and_owns_storage() {
        let queue = DiagnosticQueue::new();
        let sink = CaptureSink::new(queue.clone());

        let transient = CString::new("transient").unwrap();
        sink.log(&record(CAPTURE_LEVEL, &transient));
        drop(transient);

        let entry = queue.pop().unwrap();
        assert_eq!(entry.as_bytes_with_nul(), b"transient\0");
    }

    #[test]
    fn custom_level() {
        let queue = DiagnosticQueue::new();
        let sink = CaptureSink::with_level(queue.clone(), 3);
        assert_eq!(sink.level(), 3);

        sink.log(&record(4, c"print"));
        sink.log(&record(3, c"err"));
        assert_eq!(sink.queue().pop(), Some(CString::from(c"err")));
        assert!(queue.is_empty());
    }
}
