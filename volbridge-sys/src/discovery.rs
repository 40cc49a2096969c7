// SPDX-License-Identifier: GPL-3.0-only

//! Build a [`DiskInfo`] from `parted` or `lsblk` JSON output.

use std::process::Command;

use serde::{Deserialize, Deserializer};
use volbridge_types::{BlockGeometry, DiskInfo, MediaFlags, PartitionInfo, split_partition_path};

use crate::config::{DiscoveryConfig, DiscoverySource};
use crate::{Result, SysError};

/// Columns requested from lsblk
pub const LSBLK_COLUMNS: &str = "NAME,PATH,SIZE,RM,RO,TYPE,FSTYPE,MOUNTPOINTS,MODEL,TRAN,PTTYPE";

#[derive(Debug, Deserialize)]
struct PartedOutput {
    disk: PartedDisk,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct PartedDisk {
    path: String,
    size: String,
    #[serde(default)]
    model: String,
    #[serde(default)]
    transport: String,
    #[serde(default)]
    label: String,
    logical_sector_size: Option<u32>,
    physical_sector_size: Option<u32>,
    max_partitions: Option<u32>,
    #[serde(default)]
    partitions: Vec<PartedPartition>,
}

#[derive(Debug, Deserialize)]
struct PartedPartition {
    number: u32,
    start: String,
    end: String,
    size: String,
    #[serde(rename = "type", default)]
    part_type: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    filesystem: Option<String>,
}

/// Parse `parted -sj <disk> unit MiB print`.
pub fn parse_parted_json(output: &str) -> Result<DiskInfo> {
    let PartedOutput { disk } = serde_json::from_str(output)?;

    let geometry = match (disk.logical_sector_size, disk.physical_sector_size) {
        (Some(logical_sector_size), Some(physical_sector_size)) => Some(BlockGeometry {
            logical_sector_size,
            physical_sector_size,
        }),
        _ => None,
    };

    let partitions = disk
        .partitions
        .into_iter()
        .map(|part| PartitionInfo {
            name: part.name,
            number: part.number,
            start: Some(part.start),
            end: Some(part.end),
            size: part.size,
            part_type: part.part_type,
            filesystem: part.filesystem.filter(|fs| !fs.is_empty()),
            ..PartitionInfo::default()
        })
        .collect();

    finish(DiskInfo {
        path: disk.path,
        size: disk.size,
        model: disk.model,
        transport: disk.transport,
        label: disk.label,
        max_partitions: disk.max_partitions,
        geometry,
        partitions,
        ..DiskInfo::default()
    })
}

/// lsblk prints flags as booleans, or as "0"/"1" strings on older versions.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Number(u64),
    Text(String),
}

impl Scalar {
    fn into_flag(self) -> bool {
        match self {
            Scalar::Bool(value) => value,
            Scalar::Number(value) => value != 0,
            Scalar::Text(value) => value == "1" || value.eq_ignore_ascii_case("true"),
        }
    }

    fn into_text(self) -> String {
        match self {
            Scalar::Bool(value) => value.to_string(),
            Scalar::Number(value) => value.to_string(),
            Scalar::Text(value) => value,
        }
    }
}

fn flag<'de, D: Deserializer<'de>>(deserializer: D) -> std::result::Result<bool, D::Error> {
    Ok(Option::<Scalar>::deserialize(deserializer)?.is_some_and(Scalar::into_flag))
}

#[derive(Debug, Deserialize)]
struct LsblkOutput {
    blockdevices: Vec<LsblkDevice>,
}

#[derive(Debug, Deserialize)]
struct LsblkDevice {
    name: String,
    #[serde(default)]
    path: Option<String>,
    #[serde(default)]
    size: Option<Scalar>,
    #[serde(default, deserialize_with = "flag")]
    rm: bool,
    #[serde(default, deserialize_with = "flag")]
    ro: bool,
    #[serde(rename = "type", default)]
    kind: String,
    #[serde(default)]
    fstype: Option<String>,
    #[serde(default)]
    mountpoints: Vec<Option<String>>,
    /// Single-valued column of lsblk before 2.37
    #[serde(default)]
    mountpoint: Option<String>,
    #[serde(default)]
    model: Option<String>,
    #[serde(default)]
    tran: Option<String>,
    #[serde(default)]
    pttype: Option<String>,
    #[serde(default)]
    children: Vec<LsblkDevice>,
}

impl LsblkDevice {
    fn media(&self) -> MediaFlags {
        MediaFlags {
            removable: self.rm,
            read_only: self.ro,
        }
    }

    fn mount_points(&mut self) -> Vec<String> {
        let mut points: Vec<String> = self.mountpoints.drain(..).flatten().collect();
        if let Some(point) = self.mountpoint.take() {
            points.push(point);
        }
        points
    }
}

/// Parse `lsblk -J -o <LSBLK_COLUMNS> <disk>` for a single disk.
pub fn parse_lsblk_json(output: &str) -> Result<DiskInfo> {
    let LsblkOutput { blockdevices } = serde_json::from_str(output)?;
    let [mut device]: [LsblkDevice; 1] = blockdevices.try_into().map_err(|found: Vec<_>| {
        SysError::Parse(format!(
            "expected exactly one block device, found {}",
            found.len()
        ))
    })?;

    let path = device
        .path
        .take()
        .unwrap_or_else(|| format!("/dev/{}", device.name));

    let mut partitions = Vec::new();
    for mut child in std::mem::take(&mut device.children) {
        if child.kind != "part" {
            continue;
        }
        let number = split_partition_path(&device.name, &child.name).ok_or_else(|| {
            SysError::Parse(format!(
                "cannot derive partition number of {} on {}",
                child.name, device.name
            ))
        })?;

        partitions.push(PartitionInfo {
            number,
            media: Some(child.media()),
            mount_points: child.mount_points(),
            size: child.size.take().map(Scalar::into_text).unwrap_or_default(),
            part_type: child.kind.clone(),
            filesystem: child.fstype.take(),
            name: child.name,
            ..PartitionInfo::default()
        });
    }

    finish(DiskInfo {
        media: Some(device.media()),
        mount_points: device.mount_points(),
        size: device.size.take().map(Scalar::into_text).unwrap_or_default(),
        model: device.model.take().unwrap_or_default().trim().to_string(),
        transport: device.tran.take().unwrap_or_default(),
        label: device.pttype.take().unwrap_or_default(),
        path,
        partitions,
        ..DiskInfo::default()
    })
}

fn finish(mut disk: DiskInfo) -> Result<DiskInfo> {
    disk.sort_partitions();
    disk.fill_partition_paths()?;
    Ok(disk)
}

/// Run `program` with `args`.
///
/// With `accept_partial`, a failing exit status is tolerated when the tool
/// still printed something: parted reports unlabeled disks that way.
fn run_tool(program: &str, args: &[&str], accept_partial: bool) -> Result<String> {
    let resolved =
        which::which(program).map_err(|_| SysError::ToolNotFound(program.to_string()))?;

    let output = Command::new(resolved).args(args).output()?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        if accept_partial && !stdout.trim().is_empty() {
            tracing::debug!(program, %stderr, "tool failed but produced output");
            return Ok(stdout);
        }
        return Err(SysError::OperationFailed(format!(
            "{program} failed: {stderr}"
        )));
    }

    Ok(stdout)
}

/// Describe the disk at `path` with the configured tool.
pub fn locate_disk(config: &DiscoveryConfig, path: &str) -> Result<DiskInfo> {
    if path.is_empty() {
        return Err(SysError::InvalidArgument("empty disk path".to_string()));
    }

    tracing::debug!(path, source = ?config.source, "locating disk");
    let disk = match config.source {
        DiscoverySource::Parted => {
            let output = run_tool(&config.parted, &["-sj", path, "unit", "MiB", "print"], true)?;
            parse_parted_json(&output)?
        }
        DiscoverySource::Lsblk => {
            let output = run_tool(&config.lsblk, &["-J", "-o", LSBLK_COLUMNS, path], false)?;
            parse_lsblk_json(&output)?
        }
    };

    tracing::info!(
        path = %disk.path,
        partitions = disk.partitions.len(),
        "located disk"
    );
    Ok(disk)
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARTED_NVME: &str = r#"{
       "disk": {
          "path": "/dev/nvme0n1",
          "size": "476940MiB",
          "model": "Samsung SSD 970 EVO Plus 500GB",
          "transport": "nvme",
          "logical-sector-size": 512,
          "physical-sector-size": 512,
          "label": "gpt",
          "uuid": "3b7a8f1c-8d2e-4a57-b8c4-2f7f0c6d1e11",
          "max-partitions": 128,
          "flags": [ "pmbr_boot" ],
          "partitions": [
             {
                "number": 3,
                "start": "1025MiB",
                "end": "476939MiB",
                "size": "475914MiB",
                "type": "primary",
                "name": "root",
                "filesystem": "btrfs"
             },{
                "number": 1,
                "start": "1.00MiB",
                "end": "513MiB",
                "size": "512MiB",
                "type": "primary",
                "name": "EFI",
                "filesystem": "fat32",
                "flags": [ "boot", "esp" ]
             }
          ]
       }
    }"#;

    const LSBLK_SDA: &str = r#"{
       "blockdevices": [
          {"name":"sda", "path":"/dev/sda", "size":"20G", "rm":false, "ro":false, "type":"disk",
           "fstype":null, "mountpoints":[null], "model":"QEMU HARDDISK   ", "tran":"sata", "pttype":"gpt",
             "children": [
                {"name":"sda1", "path":"/dev/sda1", "size":"512M", "rm":false, "ro":false, "type":"part",
                 "fstype":"vfat", "mountpoints":["/boot/efi"], "model":null, "tran":null, "pttype":"gpt"},
                {"name":"sda2", "path":"/dev/sda2", "size":"19.5G", "rm":false, "ro":false, "type":"part",
                 "fstype":"LVM2_member", "mountpoints":[null], "model":null, "tran":null, "pttype":"gpt",
                   "children": [
                      {"name":"vg0-root", "path":"/dev/mapper/vg0-root", "size":"19.5G", "rm":false, "ro":false,
                       "type":"lvm", "fstype":"ext4", "mountpoints":["/"], "model":null, "tran":null, "pttype":null}
                   ]
                }
             ]
          }
       ]
    }"#;

    #[test]
    fn parses_parted_geometry_and_sorts() {
        let disk = parse_parted_json(PARTED_NVME).unwrap();

        assert_eq!(disk.path, "/dev/nvme0n1");
        assert_eq!(disk.label, "gpt");
        assert_eq!(disk.max_partitions, Some(128));
        assert_eq!(
            disk.geometry,
            Some(BlockGeometry {
                logical_sector_size: 512,
                physical_sector_size: 512,
            })
        );
        assert!(disk.media.is_none());

        let numbers: Vec<u32> = disk.partitions.iter().map(|p| p.number).collect();
        assert_eq!(numbers, [1, 3]);
        assert_eq!(disk.partitions[0].path.as_deref(), Some("/dev/nvme0n1p1"));
        assert_eq!(disk.partitions[1].path.as_deref(), Some("/dev/nvme0n1p3"));
        assert_eq!(disk.partition(3).unwrap().filesystem.as_deref(), Some("btrfs"));

        let regions = disk.free_regions().unwrap();
        assert_eq!(regions.len(), 2);
        assert_eq!(regions[0].start_mib, 513.0);
        assert_eq!(regions[0].end_mib, 1025.0);
    }

    #[test]
    fn parses_unlabeled_parted_disk() {
        let disk = parse_parted_json(
            r#"{"disk":{"path":"/dev/loop0","size":"50.0MiB","model":"Loopback device",
                "transport":"loopback","logical-sector-size":512,"physical-sector-size":512,
                "label":"unknown","max-partitions":1}}"#,
        )
        .unwrap();
        assert!(disk.partitions.is_empty());
        assert_eq!(disk.free_regions().unwrap()[0].end_mib, 50.0);
    }

    #[test]
    fn parses_lsblk_media_and_mounts() {
        let disk = parse_lsblk_json(LSBLK_SDA).unwrap();

        assert_eq!(disk.path, "/dev/sda");
        assert_eq!(disk.model, "QEMU HARDDISK");
        assert_eq!(disk.transport, "sata");
        assert_eq!(disk.size, "20G");
        assert!(disk.mount_points.is_empty());
        assert!(disk.geometry.is_none());
        assert_eq!(disk.media, Some(MediaFlags::default()));

        assert_eq!(disk.partitions.len(), 2);
        let efi = disk.partition(1).unwrap();
        assert_eq!(efi.path.as_deref(), Some("/dev/sda1"));
        assert_eq!(efi.mount_points, ["/boot/efi"]);
        assert_eq!(efi.filesystem.as_deref(), Some("vfat"));
        assert!(efi.is_mounted());
        assert!(!disk.partition(2).unwrap().is_mounted());
    }

    #[test]
    fn parses_legacy_lsblk_flags() {
        let disk = parse_lsblk_json(
            r#"{"blockdevices":[{"name":"mmcblk0","size":"29.7G","rm":"1","ro":"0","type":"disk",
                "mountpoint":null,"children":[
                  {"name":"mmcblk0p1","size":"29.7G","rm":"1","ro":"0","type":"part","mountpoint":"/media/sd"}
                ]}]}"#,
        )
        .unwrap();

        assert_eq!(disk.path, "/dev/mmcblk0");
        assert_eq!(
            disk.media,
            Some(MediaFlags {
                removable: true,
                read_only: false,
            })
        );
        let part = disk.partition(1).unwrap();
        assert_eq!(part.path.as_deref(), Some("/dev/mmcblk0p1"));
        assert_eq!(part.mount_points, ["/media/sd"]);
    }

    #[test]
    fn lsblk_requires_exactly_one_device() {
        assert!(matches!(
            parse_lsblk_json(r#"{"blockdevices":[]}"#),
            Err(SysError::Parse(_))
        ));
    }

    #[test]
    fn lsblk_rejects_unrelated_child_names() {
        let result = parse_lsblk_json(
            r#"{"blockdevices":[{"name":"sda","type":"disk","children":[
                {"name":"sdb1","type":"part"}]}]}"#,
        );
        assert!(matches!(result, Err(SysError::Parse(_))));
    }

    #[test]
    fn parted_rejects_zero_ordinal() {
        let result = parse_parted_json(
            r#"{"disk":{"path":"/dev/sda","size":"100MiB","partitions":[
                {"number":0,"start":"1MiB","end":"2MiB","size":"1MiB"}]}}"#,
        );
        assert!(matches!(result, Err(SysError::Topology(_))));
    }

    #[test]
    fn locate_rejects_empty_path() {
        assert!(matches!(
            locate_disk(&DiscoveryConfig::default(), ""),
            Err(SysError::InvalidArgument(_))
        ));
    }

    #[test]
    fn locate_reports_missing_tool() {
        let config = DiscoveryConfig {
            parted: "volbridge-no-such-parted".to_string(),
            ..DiscoveryConfig::default()
        };
        assert!(matches!(
            locate_disk(&config, "/dev/sda"),
            Err(SysError::ToolNotFound(_))
        ));
    }
}
