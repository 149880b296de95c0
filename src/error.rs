//! Error types for secsweep.
//!
//! `SweepError` covers request-level failures: a tool id that is not
//! registered, a target that is missing or of the wrong kind, and tool
//! configuration problems. Failures of a running tool are never errors at
//! this level; the dispatcher folds them into a `tool_error` scan result
//! so one broken tool cannot abort a batch.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SweepError {
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Target not found: {0}")]
    TargetNotFound(PathBuf),

    #[error("Invalid target {path}: {reason}")]
    InvalidTarget { path: PathBuf, reason: String },

    #[error("Finding rejected: {0}")]
    InvalidFinding(String),

    #[error("Failed to read tool config: {path}")]
    ConfigRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse tool config: {path}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, SweepError>;
