// SPDX-License-Identifier: GPL-3.0-only

//! Partition information - flat representation
//!
//! `PartitionInfo` is owned by its parent [`DiskInfo`](crate::DiskInfo) and
//! never outlives it. Its device path is derived from the parent path and
//! the ordinal by [`synthesize_paths`](crate::synthesize_paths).

use serde::{Deserialize, Serialize};

/// Removable/read-only flags reported by lsblk-style discovery
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFlags {
    pub removable: bool,
    pub read_only: bool,
}

/// Volume group membership of a partition initialised as an LVM PV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvmMembership {
    /// Volume group name (None for an unassigned PV)
    pub vg_name: Option<String>,
}

/// Detailed partition information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    /// Partition or kernel name (GPT name, or e.g. "sda1" for lsblk)
    #[serde(default)]
    pub name: String,

    /// Partition number (1-based, table order; gaps are legal)
    pub number: u32,

    /// Device path, filled in by path synthesis (e.g., "/dev/sda1")
    #[serde(default)]
    pub path: Option<String>,

    /// Start offset as reported, unit-suffixed (e.g., "1.00MiB")
    #[serde(default)]
    pub start: Option<String>,

    /// End offset as reported, unit-suffixed
    #[serde(default)]
    pub end: Option<String>,

    /// Size as reported, unit-suffixed (e.g., "512MiB", "20G")
    #[serde(default)]
    pub size: String,

    /// Partition type ("primary", "logical", "part", ...)
    #[serde(default)]
    pub part_type: String,

    /// Filesystem type, if any
    #[serde(default)]
    pub filesystem: Option<String>,

    /// Media flags (lsblk-derived records only)
    #[serde(default)]
    pub media: Option<MediaFlags>,

    /// Current mount points (empty if not mounted)
    #[serde(default)]
    pub mount_points: Vec<String>,

    /// LVM physical volume membership, if the partition is a PV
    #[serde(default)]
    pub lvm: Option<LvmMembership>,
}

impl PartitionInfo {
    /// Check if this partition is currently mounted
    pub fn is_mounted(&self) -> bool {
        !self.mount_points.is_empty()
    }

    /// Get a display name for this partition
    pub fn display_name(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if let Some(path) = &self.path {
            path.rsplit('/').next().unwrap_or(path).to_string()
        } else {
            format!("Partition {}", self.number)
        }
    }

    pub fn is_lvm_member(&self) -> bool {
        self.lvm.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_name_falls_back_to_path_then_number() {
        let mut part = PartitionInfo {
            number: 3,
            ..PartitionInfo::default()
        };
        assert_eq!(part.display_name(), "Partition 3");

        part.path = Some("/dev/nvme0n1p3".to_string());
        assert_eq!(part.display_name(), "nvme0n1p3");

        part.name = "root".to_string();
        assert_eq!(part.display_name(), "root");
    }

    #[test]
    fn mounted_when_any_mount_point() {
        let part = PartitionInfo {
            number: 1,
            mount_points: vec!["/boot/efi".to_string()],
            ..PartitionInfo::default()
        };
        assert!(part.is_mounted());
        assert!(!part.is_lvm_member());
    }
}
