// SPDX-License-Identifier: GPL-3.0-only

//! Bridge between a host and the LVM command engine
//!
//! This crate provides:
//! - the diagnostic queue and capture filter fed by the engine's logging
//!   callback
//! - the engine boundary and the `Lvm` command session built on it
//! - parsers for LVM report output
//! - disk discovery through parted/lsblk
//!
//! The native liblvm2cmd binding is behind the `lvm2cmd` feature.

pub mod config;
pub mod diagnostics;
pub mod discovery;
pub mod engine;
pub mod error;
pub mod logging;
pub mod lvm;

pub use config::{BridgeConfig, CaptureConfig, ConfigError, DiscoveryConfig, DiscoverySource};
pub use diagnostics::{CAPTURE_LEVEL, CaptureSink, DiagnosticQueue, LogRecord, QueueError};
pub use discovery::{locate_disk, parse_lsblk_json, parse_parted_json};
pub use engine::{EngineStatus, Lvm, VolumeEngine};
pub use error::{Result, SysError};
pub use lvm::{annotate_lvm_members, parse_lvs, parse_pvs, parse_vgs};

#[cfg(feature = "lvm2cmd")]
pub use engine::lvm2cmd::Lvm2Cmd;
