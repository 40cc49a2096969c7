// SPDX-License-Identifier: GPL-3.0-only

//! Storage topology model for volbridge
//!
//! This crate defines the records exchanged between the host and the volume
//! management bridge:
//!
//! - `DiskInfo` → a disk and the partitions it owns
//! - `PartitionInfo` → a partition, its ordinal and its derived device path
//! - `PhysicalVolumeInfo` / `VolumeGroupInfo` / `LogicalVolumeInfo` → LVM reports
//!
//! Partition device paths are never taken as input: they are synthesized from
//! the parent path and the ordinal by [`synthesize_paths`].

pub mod disk;
pub mod error;
pub mod lvm;
pub mod partition;
pub mod partition_path;

pub use disk::{BlockGeometry, DiskInfo, FreeRegion, parse_mib};
pub use error::{PathError, TopologyError};
pub use lvm::{
    AllocationPolicy, LogicalVolumeInfo, LogicalVolumeType, LvAttributes, LvDeviceState, LvHealth,
    LvPermission, LvState, LvTargetType, LvVolumeType, PhysicalVolumeInfo, PvAttributes,
    VgAttributes, VolumeGroupInfo,
};
pub use partition::{LvmMembership, MediaFlags, PartitionInfo};
pub use partition_path::{partition_device_path, split_partition_path, synthesize_paths};
