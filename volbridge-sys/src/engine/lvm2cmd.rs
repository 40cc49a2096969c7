// SPDX-License-Identifier: GPL-3.0-only

//! Native binding to liblvm2cmd.
//!
//! The library's logging callback carries no user data, so the sink it
//! reaches is held in a process-wide slot. Installing a sink on any
//! [`Lvm2Cmd`] handle replaces the previous one; dropping a handle clears the
//! slot only while that handle's sink is still the one installed.

use std::ffi::{CStr, CString};
use std::ptr::NonNull;

use libc::{c_char, c_int, c_void};

use super::sink_slot::SinkSlot;
use super::{EngineStatus, VolumeEngine};
use crate::diagnostics::{CaptureSink, LogRecord};
use crate::{Result, SysError};

type Lvm2LogFn = extern "C" fn(
    level: c_int,
    file: *const c_char,
    line: c_int,
    dm_errno: c_int,
    format: *const c_char,
);

#[link(name = "lvm2cmd")]
unsafe extern "C" {
    fn lvm2_log_fn(log_fn: Option<Lvm2LogFn>);
    fn lvm2_init() -> *mut c_void;
    fn lvm2_run(handle: *mut c_void, cmdline: *const c_char) -> c_int;
    fn lvm2_exit(handle: *mut c_void);
}

static ACTIVE_SINK: SinkSlot = SinkSlot::new();

/// Logging callback handed to liblvm2cmd.
///
/// Runs on the engine's stack; it must not unwind and never reports back.
extern "C" fn lvm_log_capture(
    level: c_int,
    file: *const c_char,
    line: c_int,
    dm_errno: c_int,
    format: *const c_char,
) {
    if format.is_null() {
        return;
    }
    // The lock is released before logging so a nested callback cannot
    // deadlock on it.
    let Some(sink) = ACTIVE_SINK.current() else {
        return;
    };
    if !sink.accepts(level) {
        return;
    }

    // SAFETY: liblvm2cmd passes NUL-terminated strings that stay valid for
    // the duration of the callback.
    let message = unsafe { CStr::from_ptr(format) };
    let file = if file.is_null() {
        c""
    } else {
        // SAFETY: as above.
        unsafe { CStr::from_ptr(file) }
    };

    sink.log(&LogRecord {
        level,
        file,
        line,
        errno: dm_errno,
        message,
    });
}

/// Handle to an initialized liblvm2cmd context.
pub struct Lvm2Cmd {
    handle: NonNull<c_void>,
    owner: u64,
}

impl Lvm2Cmd {
    pub fn new() -> Result<Self> {
        // SAFETY: registering a plain function pointer; the callback only
        // touches the sink slot.
        unsafe { lvm2_log_fn(Some(lvm_log_capture)) };

        // SAFETY: no preconditions; a null return signals failure.
        let handle = unsafe { lvm2_init() };
        let handle = NonNull::new(handle).ok_or(SysError::EngineInit)?;
        tracing::debug!("liblvm2cmd context initialized");

        Ok(Self {
            handle,
            owner: ACTIVE_SINK.register(),
        })
    }
}

impl VolumeEngine for Lvm2Cmd {
    fn install_log_sink(&mut self, sink: CaptureSink) {
        ACTIVE_SINK.install(self.owner, sink);
    }

    fn run(&mut self, command: &str) -> Result<EngineStatus> {
        let cmdline = CString::new(command)
            .map_err(|_| SysError::InvalidArgument(format!("NUL byte in command: {command:?}")))?;

        // SAFETY: the handle came from lvm2_init and is released only in Drop.
        let code = unsafe { lvm2_run(self.handle.as_ptr(), cmdline.as_ptr()) };
        Ok(EngineStatus::from_code(code))
    }
}

impl Drop for Lvm2Cmd {
    fn drop(&mut self) {
        if !ACTIVE_SINK.release(self.owner) {
            tracing::debug!("liblvm2cmd sink owned by a newer handle, left installed");
        }
        // SAFETY: the handle is valid and not used after this point.
        unsafe { lvm2_exit(self.handle.as_ptr()) };
    }
}
