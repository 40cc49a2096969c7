// SPDX-License-Identifier: GPL-3.0-only

//! LVM (Logical Volume Manager) types
//!
//! Records built from `pvs`/`vgs`/`lvs` reports captured from the engine.
//! Sizes are in bytes (reports are requested with `--units b --nosuffix`).
//! Attribute columns are decoded character by character; an unknown
//! character makes the whole column invalid.

use serde::{Deserialize, Serialize};

/// Decoded `pv_attr` column
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PvAttributes {
    pub allocatable: bool,
    pub used: bool,
    pub duplicate: bool,
    pub exported: bool,
    pub missing: bool,
}

impl PvAttributes {
    /// Decode an attribute string such as "a--" or "u-m".
    ///
    /// Returns None when the string is too short or the first column holds
    /// an unknown allocation state.
    pub fn parse(attr: &str) -> Option<Self> {
        let bytes = attr.as_bytes();
        if bytes.len() < 3 {
            return None;
        }

        let mut attrs = PvAttributes {
            exported: bytes[1] != b'-',
            missing: bytes[2] != b'-',
            ..PvAttributes::default()
        };
        match bytes[0] {
            b'a' => attrs.allocatable = true,
            b'u' => attrs.used = true,
            b'd' => attrs.duplicate = true,
            b'-' => {}
            _ => return None,
        }
        Some(attrs)
    }
}

/// Extent allocation policy of a VG or LV
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AllocationPolicy {
    Anywhere,
    Contiguous,
    Cling,
    Normal,
    /// LV only: follow the volume group's policy
    Inherited,
}

impl AllocationPolicy {
    fn from_code(code: u8) -> Option<Self> {
        match code {
            b'a' => Some(Self::Anywhere),
            b'c' => Some(Self::Contiguous),
            b'l' => Some(Self::Cling),
            b'n' => Some(Self::Normal),
            b'i' => Some(Self::Inherited),
            _ => None,
        }
    }
}

/// Decoded `vg_attr` column (six characters, e.g. "wz--n-")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VgAttributes {
    /// `w` writable, `r` read-only
    pub writable: bool,
    pub resizable: bool,
    pub exported: bool,
    pub partial: bool,
    pub allocation: AllocationPolicy,
    pub clustered: bool,
    pub shared: bool,
}

impl VgAttributes {
    pub fn parse(attr: &str) -> Option<Self> {
        let bytes = attr.as_bytes();
        if bytes.len() < 6 {
            return None;
        }

        let writable = match bytes[0] {
            b'w' => true,
            b'r' => false,
            _ => return None,
        };
        let allocation = match AllocationPolicy::from_code(bytes[4])? {
            AllocationPolicy::Inherited => return None,
            policy => policy,
        };
        let (clustered, shared) = match bytes[5] {
            b'c' => (true, false),
            b's' => (false, true),
            b'-' => (false, false),
            _ => return None,
        };

        Some(Self {
            writable,
            resizable: bytes[1] != b'-',
            exported: bytes[2] != b'-',
            partial: bytes[3] != b'-',
            allocation,
            clustered,
            shared,
        })
    }

    pub fn is_read_only(&self) -> bool {
        !self.writable
    }
}

/// First `lv_attr` column
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvVolumeType {
    Plain,
    Cache,
    Mirrored,
    MirroredNoInitialSync,
    Origin,
    OriginMergingSnapshot,
    Raid,
    RaidNoInitialSync,
    Snapshot,
    MergingSnapshot,
    PvMove,
    Virtual,
    Image,
    ImageOutOfSync,
    MirrorLog,
    UnderConversion,
    ThinVolume,
    ThinPool,
    ThinPoolData,
    VdoPool,
    VdoPoolData,
    Metadata,
}

impl LvVolumeType {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::Plain,
            b'C' => Self::Cache,
            b'm' => Self::Mirrored,
            b'M' => Self::MirroredNoInitialSync,
            b'o' => Self::Origin,
            b'O' => Self::OriginMergingSnapshot,
            b'r' => Self::Raid,
            b'R' => Self::RaidNoInitialSync,
            b's' => Self::Snapshot,
            b'S' => Self::MergingSnapshot,
            b'p' => Self::PvMove,
            b'v' => Self::Virtual,
            b'i' => Self::Image,
            b'I' => Self::ImageOutOfSync,
            b'l' => Self::MirrorLog,
            b'c' => Self::UnderConversion,
            b'V' => Self::ThinVolume,
            b't' => Self::ThinPool,
            b'T' => Self::ThinPoolData,
            b'd' => Self::VdoPool,
            b'D' => Self::VdoPoolData,
            b'e' => Self::Metadata,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvPermission {
    Unknown,
    Writable,
    ReadOnly,
    /// Read-only activation of a volume that is not itself read-only
    ReadOnlyActivation,
}

impl LvPermission {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::Unknown,
            b'w' => Self::Writable,
            b'r' => Self::ReadOnly,
            b'R' => Self::ReadOnlyActivation,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvState {
    Inactive,
    Active,
    Historical,
    Suspended,
    InvalidSnapshot,
    InvalidSuspendedSnapshot,
    SnapshotMergeFailed,
    SuspendedSnapshotMergeFailed,
    MappedWithoutTables,
    MappedWithInactiveTable,
    ThinPoolCheckNeeded,
    SuspendedThinPoolCheckNeeded,
    Unknown,
}

impl LvState {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::Inactive,
            b'a' => Self::Active,
            b'h' => Self::Historical,
            b's' => Self::Suspended,
            b'I' => Self::InvalidSnapshot,
            b'S' => Self::InvalidSuspendedSnapshot,
            b'm' => Self::SnapshotMergeFailed,
            b'M' => Self::SuspendedSnapshotMergeFailed,
            b'd' => Self::MappedWithoutTables,
            b'i' => Self::MappedWithInactiveTable,
            b'c' => Self::ThinPoolCheckNeeded,
            b'C' => Self::SuspendedThinPoolCheckNeeded,
            b'X' => Self::Unknown,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvDeviceState {
    Closed,
    Open,
    Unknown,
}

impl LvDeviceState {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::Closed,
            b'o' => Self::Open,
            b'X' => Self::Unknown,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvTargetType {
    None,
    Cache,
    Mirror,
    Raid,
    Snapshot,
    Thin,
    Unknown,
    Virtual,
}

impl LvTargetType {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::None,
            b'C' => Self::Cache,
            b'm' => Self::Mirror,
            b'r' => Self::Raid,
            b's' => Self::Snapshot,
            b't' => Self::Thin,
            b'u' => Self::Unknown,
            b'v' => Self::Virtual,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LvHealth {
    Ok,
    Partial,
    Unknown,
    RaidRefreshNeeded,
    RaidMismatchesExist,
    RaidWriteMostly,
    ThinFailed,
    ThinPoolOutOfDataSpace,
    ThinPoolMetadataReadOnly,
    WritecacheError,
}

impl LvHealth {
    fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            b'-' => Self::Ok,
            b'p' => Self::Partial,
            b'X' => Self::Unknown,
            b'r' => Self::RaidRefreshNeeded,
            b'm' => Self::RaidMismatchesExist,
            b'w' => Self::RaidWriteMostly,
            b'F' => Self::ThinFailed,
            b'D' => Self::ThinPoolOutOfDataSpace,
            b'M' => Self::ThinPoolMetadataReadOnly,
            b'E' => Self::WritecacheError,
            _ => return None,
        })
    }
}

fn flag(code: u8, set: u8) -> Option<bool> {
    match code {
        b'-' => Some(false),
        c if c == set => Some(true),
        _ => None,
    }
}

/// Decoded `lv_attr` column (ten characters, e.g. "-wi-a-----")
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LvAttributes {
    pub volume_type: LvVolumeType,
    pub permission: LvPermission,
    /// None when `-`
    pub allocation: Option<AllocationPolicy>,
    pub fixed_minor: bool,
    pub state: LvState,
    pub device: LvDeviceState,
    pub target_type: LvTargetType,
    /// Newly allocated blocks are zeroed before use
    pub zeroed: bool,
    pub health: LvHealth,
    pub skip_activation: bool,
}

impl LvAttributes {
    pub fn parse(attr: &str) -> Option<Self> {
        let bytes = attr.as_bytes();
        if bytes.len() < 10 {
            return None;
        }

        let allocation = match bytes[2] {
            b'-' => None,
            code => Some(AllocationPolicy::from_code(code)?),
        };

        Some(Self {
            volume_type: LvVolumeType::from_code(bytes[0])?,
            permission: LvPermission::from_code(bytes[1])?,
            allocation,
            fixed_minor: flag(bytes[3], b'm')?,
            state: LvState::from_code(bytes[4])?,
            device: LvDeviceState::from_code(bytes[5])?,
            target_type: LvTargetType::from_code(bytes[6])?,
            zeroed: flag(bytes[7], b'z')?,
            health: LvHealth::from_code(bytes[8])?,
            skip_activation: flag(bytes[9], b'k')?,
        })
    }
}

/// Volume group information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VolumeGroupInfo {
    /// Volume group name
    pub name: String,

    pub attributes: VgAttributes,

    /// Total size in bytes
    pub size: u64,

    /// Free space in bytes
    pub free: u64,

    /// Number of physical volumes
    pub pv_count: u32,

    /// Number of logical volumes
    pub lv_count: u32,
}

impl VolumeGroupInfo {
    /// Allocated bytes
    pub fn used(&self) -> u64 {
        self.size.saturating_sub(self.free)
    }
}

/// Logical volume information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogicalVolumeInfo {
    pub name: String,

    /// Parent volume group name
    pub vg_name: String,

    pub attributes: LvAttributes,

    /// Size in bytes
    pub size: u64,

    /// Thin pool backing this volume, if any
    pub pool: Option<String>,

    /// Device path (e.g., "/dev/vg0/lv0")
    pub device_path: String,
}

impl LogicalVolumeInfo {
    pub fn is_active(&self) -> bool {
        self.attributes.state == LvState::Active
    }

    pub fn is_writable(&self) -> bool {
        self.attributes.permission == LvPermission::Writable
    }

    pub fn is_thin_pool(&self) -> bool {
        self.attributes.volume_type == LvVolumeType::ThinPool
    }
}

/// Physical volume information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PhysicalVolumeInfo {
    /// Device path (e.g., "/dev/sda1")
    pub device: String,

    /// Volume group name (None if not assigned)
    pub vg_name: Option<String>,

    /// Metadata format ("lvm2")
    pub format: String,

    pub attributes: PvAttributes,

    /// Total size in bytes
    pub size: u64,

    /// Free space in bytes
    pub free: u64,
}

impl PhysicalVolumeInfo {
    pub fn is_assigned(&self) -> bool {
        self.vg_name.is_some()
    }

    pub fn used(&self) -> u64 {
        self.size.saturating_sub(self.free)
    }
}

/// Segment type passed to `lvcreate --type`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LogicalVolumeType {
    Linear,
    Striped,
    Raid1,
    Raid5,
    ThinPool,
}

impl LogicalVolumeType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Linear => "linear",
            Self::Striped => "striped",
            Self::Raid1 => "raid1",
            Self::Raid5 => "raid5",
            Self::ThinPool => "thin-pool",
        }
    }
}
