// SPDX-License-Identifier: GPL-3.0-only

//! Partition device path synthesis
//!
//! Block devices whose name already ends in a digit (NVMe namespaces, MMC,
//! loop devices) separate the partition number with a `p`:
//! `/dev/nvme0n1` → `/dev/nvme0n1p1`, while `/dev/sda` → `/dev/sda1`.

use crate::PartitionInfo;
use crate::error::PathError;

/// Infix placed between a digit-terminated parent path and the ordinal.
pub const DIGIT_SUFFIX_INFIX: &str = "p";

fn partition_infix(parent: &str) -> Result<&'static str, PathError> {
    let last = parent.chars().next_back().ok_or(PathError::EmptyParentPath)?;
    if last.is_ascii_digit() {
        Ok(DIGIT_SUFFIX_INFIX)
    } else {
        Ok("")
    }
}

/// Device path of partition `number` on the device at `parent`.
pub fn partition_device_path(parent: &str, number: u32) -> Result<String, PathError> {
    let infix = partition_infix(parent)?;
    if number == 0 {
        return Err(PathError::InvalidOrdinal(number));
    }
    Ok(format!("{parent}{infix}{number}"))
}

/// Fill the `path` of every partition from its ordinal.
///
/// Every ordinal is checked before any path is written, so on error the
/// slice is left untouched.
pub fn synthesize_paths(parent: &str, partitions: &mut [PartitionInfo]) -> Result<(), PathError> {
    let infix = partition_infix(parent)?;
    if let Some(bad) = partitions.iter().find(|part| part.number == 0) {
        return Err(PathError::InvalidOrdinal(bad.number));
    }

    for part in partitions.iter_mut() {
        part.path = Some(format!("{parent}{infix}{}", part.number));
    }

    Ok(())
}

/// Recover the ordinal from a partition path produced for `parent`.
///
/// Accepts either a full path (`/dev/nvme0n1p2`) or a bare kernel name
/// (`nvme0n1p2`) as long as it matches the form of `parent`.
pub fn split_partition_path(parent: &str, path: &str) -> Option<u32> {
    let infix = partition_infix(parent).ok()?;
    let rest = path.strip_prefix(parent)?.strip_prefix(infix)?;
    if rest.is_empty() || rest.starts_with('0') || !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    rest.parse().ok().filter(|number| *number > 0)
}
