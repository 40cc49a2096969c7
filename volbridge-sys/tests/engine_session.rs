// SPDX-License-Identifier: GPL-3.0-only

use std::ffi::CString;
use std::thread;

use volbridge_sys::{
    CaptureSink, DiagnosticQueue, EngineStatus, LogRecord, Lvm, SysError, VolumeEngine,
};

/// Engine that reports from worker threads and from nested callbacks, the
/// way a foreign engine may call back outside the host's control.
#[derive(Default)]
struct ThreadedEngine {
    sink: Option<CaptureSink>,
}

fn emit(sink: &CaptureSink, level: i32, text: &str) {
    let message = CString::new(text).unwrap();
    sink.log(&LogRecord {
        level,
        file: c"threaded.c",
        line: 0,
        errno: 0,
        message: &message,
    });
}

impl VolumeEngine for ThreadedEngine {
    fn install_log_sink(&mut self, sink: CaptureSink) {
        self.sink = Some(sink);
    }

    fn run(&mut self, command: &str) -> volbridge_sys::Result<EngineStatus> {
        let Some(sink) = self.sink.clone() else {
            return Ok(EngineStatus::InitFailed);
        };

        emit(&sink, 4, &format!("begin {command}"));
        thread::scope(|scope| {
            for worker in 0..4 {
                let sink = sink.clone();
                scope.spawn(move || {
                    emit(&sink, 6, "info chatter");
                    emit(&sink, 4, &format!("worker {worker}"));
                });
            }
        });
        emit(&sink, 4, "end");

        if command.starts_with("fail") {
            Ok(EngineStatus::CommandFailed)
        } else {
            Ok(EngineStatus::Processed)
        }
    }
}

#[test]
fn session_collects_lines_from_foreign_threads() {
    let mut lvm = Lvm::new(ThreadedEngine::default());
    let output = lvm.run("vgs").unwrap();

    let lines: Vec<&str> = output.lines().collect();
    assert_eq!(lines.len(), 6);
    assert_eq!(lines.first(), Some(&"begin vgs"));
    assert_eq!(lines.last(), Some(&"end"));
    for worker in 0..4 {
        assert!(lines.contains(&format!("worker {worker}").as_str()));
    }
    assert!(!output.contains("chatter"));
    assert!(lvm.queue().is_empty());
}

#[test]
fn failed_command_surfaces_status_and_output() {
    let mut lvm = Lvm::new(ThreadedEngine::default());

    let error = lvm.run("fail now").unwrap_err();
    match error {
        SysError::Engine { status, output, .. } => {
            assert_eq!(status, EngineStatus::CommandFailed);
            assert!(output.starts_with("begin fail now\n"));
        }
        other => panic!("unexpected error: {other}"),
    }

    assert!(lvm.queue().is_empty());
}

#[test]
fn shared_queue_observed_by_host() {
    let queue = DiagnosticQueue::new();
    let mut lvm = Lvm::with_sink(ThreadedEngine::default(), CaptureSink::new(queue.clone()));

    lvm.run("pvs").unwrap();
    assert!(queue.is_empty());

    // Lines the engine logs outside a session run stay queued for the host.
    let sink = CaptureSink::new(queue.clone());
    emit(&sink, 4, "late");
    assert_eq!(queue.pop(), Some(CString::new("late").unwrap()));
}
