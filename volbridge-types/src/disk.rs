// SPDX-License-Identifier: GPL-3.0-only

//! Disk data model
//!
//! One record covers both discovery sources: parted reports block geometry,
//! lsblk reports media flags and mount points. The capability blocks are
//! optional so a record carries exactly what its source described.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::TopologyError;
use crate::{MediaFlags, PartitionInfo, synthesize_paths};

/// Sector sizes reported by parted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BlockGeometry {
    pub logical_sector_size: u32,
    pub physical_sector_size: u32,
}

/// Unallocated span on a disk, in MiB
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeRegion {
    pub start_mib: f64,
    pub end_mib: f64,
}

impl FreeRegion {
    pub fn len_mib(&self) -> f64 {
        self.end_mib - self.start_mib
    }
}

/// Complete disk information
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskInfo {
    /// Device path (e.g., "/dev/sda")
    pub path: String,

    /// Size as reported, unit-suffixed (e.g., "51200MiB", "20G")
    #[serde(default)]
    pub size: String,

    /// Disk model name
    #[serde(default)]
    pub model: String,

    /// Connection transport (e.g., "nvme", "scsi", "usb")
    #[serde(default)]
    pub transport: String,

    /// Partition table label ("gpt", "msdos", "dos", "unknown", ...)
    #[serde(default)]
    pub label: String,

    /// Maximum number of partitions the table supports
    #[serde(default)]
    pub max_partitions: Option<u32>,

    /// Block geometry (parted-derived records only)
    #[serde(default)]
    pub geometry: Option<BlockGeometry>,

    /// Media flags (lsblk-derived records only)
    #[serde(default)]
    pub media: Option<MediaFlags>,

    /// Partitions in table order
    #[serde(default)]
    pub partitions: Vec<PartitionInfo>,

    /// Mount points of the whole device
    #[serde(default)]
    pub mount_points: Vec<String>,
}

impl DiskInfo {
    /// Find a partition by ordinal.
    ///
    /// Partition 3 is not necessarily at index 2: deleted partitions leave
    /// gaps in the numbering.
    pub fn partition(&self, number: u32) -> Option<&PartitionInfo> {
        self.partitions.iter().find(|part| part.number == number)
    }

    pub fn partition_mut(&mut self, number: u32) -> Option<&mut PartitionInfo> {
        self.partitions.iter_mut().find(|part| part.number == number)
    }

    /// Order partitions by ordinal.
    pub fn sort_partitions(&mut self) {
        self.partitions.sort_by_key(|part| part.number);
    }

    /// Check that every ordinal is positive and unique on this disk.
    pub fn validate_ordinals(&self) -> Result<(), TopologyError> {
        let mut seen = BTreeSet::new();
        for part in &self.partitions {
            if part.number == 0 {
                return Err(TopologyError::InvalidOrdinal {
                    disk: self.path.clone(),
                    number: part.number,
                });
            }
            if !seen.insert(part.number) {
                return Err(TopologyError::DuplicateOrdinal {
                    disk: self.path.clone(),
                    number: part.number,
                });
            }
        }
        Ok(())
    }

    /// Validate ordinals, then derive every partition's device path.
    pub fn fill_partition_paths(&mut self) -> Result<(), TopologyError> {
        self.validate_ordinals()?;
        synthesize_paths(&self.path, &mut self.partitions)?;
        Ok(())
    }

    /// Unallocated regions between partitions and after the last one.
    ///
    /// Works on MiB-suffixed figures, as produced by `parted unit MiB`.
    pub fn free_regions(&self) -> Result<Vec<FreeRegion>, TopologyError> {
        let disk_end = parse_mib(&self.size)?;

        let mut spans = Vec::with_capacity(self.partitions.len());
        for part in &self.partitions {
            let (Some(start), Some(end)) = (&part.start, &part.end) else {
                continue;
            };
            spans.push((parse_mib(start)?, parse_mib(end)?));
        }
        spans.sort_by(|a, b| a.0.total_cmp(&b.0));

        let Some(&(_, last_end)) = spans.last() else {
            return Ok(vec![FreeRegion {
                start_mib: 0.0,
                end_mib: disk_end,
            }]);
        };

        let mut regions: Vec<FreeRegion> = spans
            .windows(2)
            .filter(|pair| pair[0].1 < pair[1].0)
            .map(|pair| FreeRegion {
                start_mib: pair[0].1,
                end_mib: pair[1].0,
            })
            .collect();

        if last_end < disk_end {
            regions.push(FreeRegion {
                start_mib: last_end,
                end_mib: disk_end,
            });
        }

        Ok(regions)
    }
}

/// Parse a parted figure such as "512MiB" or "1.00MiB".
pub fn parse_mib(value: &str) -> Result<f64, TopologyError> {
    let invalid = || TopologyError::InvalidSize {
        value: value.to_string(),
    };
    let number = value.trim().strip_suffix("MiB").ok_or_else(invalid)?;
    let parsed: f64 = number.trim().parse().map_err(|_| invalid())?;
    if !parsed.is_finite() || parsed < 0.0 {
        return Err(invalid());
    }
    Ok(parsed)
}
