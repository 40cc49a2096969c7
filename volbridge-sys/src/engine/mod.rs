// SPDX-License-Identifier: GPL-3.0-only

//! Engine boundary
//!
//! A [`VolumeEngine`] runs LVM command lines and reports their output only
//! through the logging sink installed on it. [`Lvm`] pairs an engine with the
//! queue behind that sink and turns each run into a command result.

#[cfg(feature = "lvm2cmd")]
pub mod lvm2cmd;
#[cfg(any(feature = "lvm2cmd", test))]
mod sink_slot;

use std::fmt;

use crate::diagnostics::{CaptureSink, DiagnosticQueue};
use crate::{Result, SysError};

/// Return code of an engine command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineStatus {
    Processed,
    NoSuchCommand,
    InvalidCommandLine,
    InitFailed,
    CommandFailed,
    Unknown(i32),
}

impl EngineStatus {
    pub fn from_code(code: i32) -> Self {
        match code {
            1 => Self::Processed,
            2 => Self::NoSuchCommand,
            3 => Self::InvalidCommandLine,
            4 => Self::InitFailed,
            5 => Self::CommandFailed,
            other => Self::Unknown(other),
        }
    }

    pub fn code(self) -> i32 {
        match self {
            Self::Processed => 1,
            Self::NoSuchCommand => 2,
            Self::InvalidCommandLine => 3,
            Self::InitFailed => 4,
            Self::CommandFailed => 5,
            Self::Unknown(code) => code,
        }
    }

    pub fn is_success(self) -> bool {
        self == Self::Processed
    }
}

impl fmt::Display for EngineStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Processed => "processed",
            Self::NoSuchCommand => "no such command",
            Self::InvalidCommandLine => "invalid command line",
            Self::InitFailed => "initialization failed",
            Self::CommandFailed => "command failed",
            Self::Unknown(_) => "unknown status",
        };
        write!(f, "{text} ({})", self.code())
    }
}

/// External volume-management engine.
pub trait VolumeEngine {
    /// Route the engine's logging callback to `sink`.
    fn install_log_sink(&mut self, sink: CaptureSink);

    /// Run one command line to completion.
    fn run(&mut self, command: &str) -> Result<EngineStatus>;
}

/// Command session over an engine.
///
/// Owns the diagnostic queue fed by the engine's sink; every run drains it,
/// so lines from one command never leak into the next.
pub struct Lvm<E: VolumeEngine> {
    engine: E,
    queue: DiagnosticQueue,
}

impl<E: VolumeEngine> Lvm<E> {
    pub fn new(engine: E) -> Self {
        Self::with_sink(engine, CaptureSink::new(DiagnosticQueue::new()))
    }

    /// Use an explicit sink, e.g. one with a configured capture level or one
    /// feeding a queue shared with other components.
    pub fn with_sink(mut engine: E, sink: CaptureSink) -> Self {
        let queue = sink.queue().clone();
        engine.install_log_sink(sink);
        Self { engine, queue }
    }

    pub fn queue(&self) -> &DiagnosticQueue {
        &self.queue
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn into_engine(self) -> E {
        self.engine
    }

    /// Run `command` and return the captured output, one line per message.
    pub fn run(&mut self, command: &str) -> Result<String> {
        tracing::debug!(command, "running engine command");

        let status = self.engine.run(command);
        let output = self.collect_output();
        let status = status?;

        if !status.is_success() {
            tracing::warn!(command, %status, "engine command failed");
            return Err(SysError::Engine {
                command: command.to_string(),
                status,
                output,
            });
        }

        tracing::trace!(command, lines = output.lines().count(), "engine command done");
        Ok(output)
    }

    fn collect_output(&self) -> String {
        let dropped = self.queue.dropped();
        if dropped > 0 {
            tracing::warn!(dropped, "diagnostic messages were dropped");
        }

        let mut output = String::new();
        for entry in self.queue.drain() {
            output.push_str(&entry.to_string_lossy());
            output.push('\n');
        }
        output
    }
}
