// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;

/// Precondition violations reported by the partition path synthesizer.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PathError {
    #[error("parent device path is empty")]
    EmptyParentPath,

    #[error("invalid partition ordinal: {0}")]
    InvalidOrdinal(u32),
}

/// Violations of the disk/partition model invariants.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TopologyError {
    #[error("duplicate partition ordinal {number} on {disk}")]
    DuplicateOrdinal { disk: String, number: u32 },

    #[error("partition ordinal {number} on {disk} is not positive")]
    InvalidOrdinal { disk: String, number: u32 },

    #[error("cannot parse size {value:?}")]
    InvalidSize { value: String },

    #[error(transparent)]
    Path(#[from] PathError),
}
