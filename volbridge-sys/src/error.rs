// SPDX-License-Identifier: GPL-3.0-only

use thiserror::Error;
use volbridge_types::{PathError, TopologyError};

use crate::engine::EngineStatus;

/// Error types for engine and discovery operations
#[derive(Error, Debug)]
pub enum SysError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("`{command}` returned {status}")]
    Engine {
        command: String,
        status: EngineStatus,
        output: String,
    },

    #[error("engine initialization failed")]
    EngineInit,

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Operation failed: {0}")]
    OperationFailed(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Topology(#[from] TopologyError),
}

/// Result type alias for system operations
pub type Result<T> = std::result::Result<T, SysError>;
