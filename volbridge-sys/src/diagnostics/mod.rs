// SPDX-License-Identifier: GPL-3.0-only

//! Diagnostic capture
//!
//! The engine's logging callback feeds a [`CaptureSink`], which keeps the
//! messages at the capture level and pushes them onto a
//! [`DiagnosticQueue`] the host drains later.

pub mod capture;
pub mod queue;

pub use capture::{CAPTURE_LEVEL, CaptureSink, LogRecord};
pub use queue::{DiagnosticQueue, QueueError};
