// SPDX-License-Identifier: GPL-3.0-only

//! LVM commands issued through an engine session, and parsers for the
//! report lines they produce.

use volbridge_types::{
    DiskInfo, LogicalVolumeInfo, LogicalVolumeType, LvAttributes, LvmMembership,
    PhysicalVolumeInfo, PvAttributes, VgAttributes, VolumeGroupInfo,
};

use crate::engine::{Lvm, VolumeEngine};
use crate::{Result, SysError};

const REPORT_FLAGS: &str = "--noheadings --units b --nosuffix --separator ,";
const PV_COLUMNS: &str = "pv_name,vg_name,pv_fmt,pv_attr,pv_size,pv_free";
const VG_COLUMNS: &str = "vg_name,pv_count,lv_count,vg_attr,vg_size,vg_free";
const LV_COLUMNS: &str = "lv_name,vg_name,lv_attr,lv_size,pool_lv,lv_path";

fn parse_report_line(line: &str) -> Vec<&str> {
    line.split(',').map(str::trim).collect()
}

/// Report rows among the captured lines.
///
/// Warnings are captured at the same level as report rows, so lines that are
/// not shaped like a row are skipped rather than rejected.
fn report_rows(output: &str, columns: usize) -> impl Iterator<Item = Vec<&str>> {
    output
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(move |line| {
            if line.starts_with("WARNING:") {
                tracing::warn!("lvm: {line}");
                return None;
            }
            let cols = parse_report_line(line);
            if cols.len() != columns {
                tracing::debug!("skipping non-report line: {line:?}");
                return None;
            }
            Some(cols)
        })
}

fn parse_number<T: std::str::FromStr>(value: &str, column: &str) -> Result<T> {
    // Some LVM versions print sizes as "1048576.00" even with --units b.
    let integral = value.split_once('.').map_or(value, |(whole, _)| whole);
    integral
        .parse()
        .map_err(|_| SysError::Parse(format!("invalid {column}: {value:?}")))
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_string())
    }
}

pub fn parse_pvs(output: &str) -> Result<Vec<PhysicalVolumeInfo>> {
    report_rows(output, 6)
        .map(|cols| {
            let attributes = PvAttributes::parse(cols[3])
                .ok_or_else(|| SysError::Parse(format!("invalid pv_attr: {:?}", cols[3])))?;

            Ok(PhysicalVolumeInfo {
                device: cols[0].to_string(),
                vg_name: non_empty(cols[1]),
                format: cols[2].to_string(),
                attributes,
                size: parse_number(cols[4], "pv_size")?,
                free: parse_number(cols[5], "pv_free")?,
            })
        })
        .collect()
}

pub fn parse_vgs(output: &str) -> Result<Vec<VolumeGroupInfo>> {
    report_rows(output, 6)
        .map(|cols| {
            let attributes = VgAttributes::parse(cols[3])
                .ok_or_else(|| SysError::Parse(format!("invalid vg_attr: {:?}", cols[3])))?;

            Ok(VolumeGroupInfo {
                name: cols[0].to_string(),
                pv_count: parse_number(cols[1], "pv_count")?,
                lv_count: parse_number(cols[2], "lv_count")?,
                attributes,
                size: parse_number(cols[4], "vg_size")?,
                free: parse_number(cols[5], "vg_free")?,
            })
        })
        .collect()
}

pub fn parse_lvs(output: &str) -> Result<Vec<LogicalVolumeInfo>> {
    report_rows(output, 6)
        .map(|cols| {
            let attributes = LvAttributes::parse(cols[2])
                .ok_or_else(|| SysError::Parse(format!("invalid lv_attr: {:?}", cols[2])))?;

            Ok(LogicalVolumeInfo {
                name: cols[0].to_string(),
                vg_name: cols[1].to_string(),
                attributes,
                size: parse_number(cols[3], "lv_size")?,
                pool: non_empty(cols[4]),
                device_path: cols[5].to_string(),
            })
        })
        .collect()
}

/// Mark the partitions of `disk` that are physical volumes.
pub fn annotate_lvm_members(disk: &mut DiskInfo, pvs: &[PhysicalVolumeInfo]) {
    for part in &mut disk.partitions {
        let Some(path) = part.path.as_deref() else {
            continue;
        };
        part.lvm = pvs
            .iter()
            .find(|pv| pv.device == path)
            .map(|pv| LvmMembership {
                vg_name: pv.vg_name.clone(),
            });
    }
}

/// The engine splits command lines on whitespace itself, so every argument
/// must be a single non-empty word.
fn check_arg<'a>(what: &str, value: &'a str) -> Result<&'a str> {
    if value.is_empty()
        || value
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\'')
    {
        return Err(SysError::InvalidArgument(format!("{what}: {value:?}")));
    }
    Ok(value)
}

fn check_args(what: &str, values: &[&str]) -> Result<String> {
    if values.is_empty() {
        return Err(SysError::InvalidArgument(format!("no {what} provided")));
    }
    for value in values {
        check_arg(what, value)?;
    }
    Ok(values.join(" "))
}

fn filter_args(filter: &[&str]) -> Result<String> {
    for value in filter {
        check_arg("filter", value)?;
    }
    Ok(filter.join(" "))
}

fn report_command(tool: &str, columns: &str, filter: &[&str]) -> Result<String> {
    let filter = filter_args(filter)?;
    Ok(format!("{tool} {REPORT_FLAGS} -o {columns} {filter}")
        .trim_end()
        .to_string())
}

impl<E: VolumeEngine> Lvm<E> {
    pub fn pvcreate(&mut self, device: &str) -> Result<()> {
        let device = check_arg("pv", device)?;
        self.run(&format!("pvcreate -y {device}"))?;
        Ok(())
    }

    pub fn pvs(&mut self, filter: &[&str]) -> Result<Vec<PhysicalVolumeInfo>> {
        let output = self.run(&report_command("pvs", PV_COLUMNS, filter)?)?;
        parse_pvs(&output)
    }

    /// Grow or shrink a PV to `size_bytes`, or to its device size when None.
    pub fn pvresize(&mut self, device: &str, size_bytes: Option<u64>) -> Result<()> {
        let device = check_arg("pv", device)?;
        let command = match size_bytes {
            Some(size) => format!("pvresize -y --setphysicalvolumesize {size}b {device}"),
            None => format!("pvresize -y {device}"),
        };
        self.run(&command)?;
        Ok(())
    }

    pub fn pvremove(&mut self, device: &str) -> Result<()> {
        let device = check_arg("pv", device)?;
        self.run(&format!("pvremove -y {device}"))?;
        Ok(())
    }

    pub fn vgcreate(&mut self, name: &str, pvs: &[&str]) -> Result<()> {
        let name = check_arg("vg", name)?;
        let pvs = check_args("PVs", pvs)?;
        self.run(&format!("vgcreate {name} {pvs}"))?;
        Ok(())
    }

    pub fn vgs(&mut self, filter: &[&str]) -> Result<Vec<VolumeGroupInfo>> {
        let output = self.run(&report_command("vgs", VG_COLUMNS, filter)?)?;
        parse_vgs(&output)
    }

    pub fn vgrename(&mut self, old_name: &str, new_name: &str) -> Result<VolumeGroupInfo> {
        let old_name = check_arg("vg", old_name)?;
        let new_name = check_arg("vg", new_name)?;
        self.run(&format!("vgrename {old_name} {new_name}"))?;

        self.vgs(&[new_name])?
            .into_iter()
            .next()
            .ok_or_else(|| SysError::OperationFailed(format!("vg {new_name} missing after rename")))
    }

    pub fn vgextend(&mut self, vg: &str, pvs: &[&str]) -> Result<()> {
        let vg = check_arg("vg", vg)?;
        let pvs = check_args("PVs", pvs)?;
        self.run(&format!("vgextend {vg} {pvs}"))?;
        Ok(())
    }

    pub fn vgreduce(&mut self, vg: &str, pvs: &[&str]) -> Result<()> {
        let vg = check_arg("vg", vg)?;
        let pvs = check_args("PVs", pvs)?;
        self.run(&format!("vgreduce {vg} {pvs}"))?;
        Ok(())
    }

    pub fn vgremove(&mut self, vg: &str) -> Result<()> {
        let vg = check_arg("vg", vg)?;
        self.run(&format!("vgremove -y {vg}"))?;
        Ok(())
    }

    pub fn lvcreate(
        &mut self,
        name: &str,
        vg: &str,
        lv_type: LogicalVolumeType,
        size_bytes: u64,
    ) -> Result<()> {
        let name = check_arg("lv", name)?;
        let vg = check_arg("vg", vg)?;
        self.run(&format!(
            "lvcreate -y --type {} -L {size_bytes}b {vg} -n {name}",
            lv_type.as_str()
        ))?;
        Ok(())
    }

    /// Create a thin volume of virtual size `size_bytes` in `pool`.
    pub fn lv_thin_create(
        &mut self,
        name: &str,
        vg: &str,
        pool: &str,
        size_bytes: u64,
    ) -> Result<()> {
        let name = check_arg("lv", name)?;
        let vg = check_arg("vg", vg)?;
        let pool = check_arg("pool", pool)?;
        self.run(&format!(
            "lvcreate -y -n {name} -V {size_bytes}b --thinpool {pool} {vg}"
        ))?;
        Ok(())
    }

    /// Turn the data LV `pool` into a thin pool with `metadata` as its
    /// metadata LV. Both live in `vg`.
    pub fn lvconvert_thin_pool(&mut self, vg: &str, metadata: &str, pool: &str) -> Result<()> {
        let vg = check_arg("vg", vg)?;
        let metadata = check_arg("lv", metadata)?;
        let pool = check_arg("pool", pool)?;
        self.run(&format!(
            "lvconvert -y --type thin-pool --poolmetadata {vg}/{metadata} {vg}/{pool}"
        ))?;
        Ok(())
    }

    pub fn lvs(&mut self, filter: &[&str]) -> Result<Vec<LogicalVolumeInfo>> {
        let output = self.run(&report_command("lvs", LV_COLUMNS, filter)?)?;
        parse_lvs(&output)
    }

    pub fn lvrename(
        &mut self,
        vg: &str,
        old_name: &str,
        new_name: &str,
    ) -> Result<LogicalVolumeInfo> {
        let vg = check_arg("vg", vg)?;
        let old_name = check_arg("lv", old_name)?;
        let new_name = check_arg("lv", new_name)?;
        self.run(&format!("lvrename {vg} {old_name} {new_name}"))?;

        let target = format!("{vg}/{new_name}");
        self.lvs(&[target.as_str()])?
            .into_iter()
            .next()
            .ok_or_else(|| {
                SysError::OperationFailed(format!("lv {vg}/{new_name} missing after rename"))
            })
    }

    pub fn lvremove(&mut self, vg: &str, lv: &str) -> Result<()> {
        let vg = check_arg("vg", vg)?;
        let lv = check_arg("lv", lv)?;
        self.run(&format!("lvremove -y {vg}/{lv}"))?;
        Ok(())
    }
}
