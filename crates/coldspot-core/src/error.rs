//! Error types for configuration and scanning.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Invalid user-supplied configuration. Always raised before traversal starts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// A tiering policy segment could not be parsed.
    #[error("Invalid tiering policy '{input}': {reason}")]
    InvalidPolicy { input: String, reason: String },

    /// The policy list contained no policies.
    #[error("Tiering policy list is empty")]
    EmptyPolicyList,

    /// The same policy was listed more than once.
    #[error("Tiering policy '{policy}' is listed more than once")]
    DuplicatePolicy { policy: String },

    /// Unknown time field name.
    #[error("Invalid time field '{value}': expected mtime or atime")]
    InvalidTimeField { value: String },

    /// Unknown sort key.
    #[error("Invalid sort key '{value}': expected one of Size, SizeRatio, Count, CountRatio")]
    InvalidSortKey { value: String },

    /// Directory levels must be at least 1.
    #[error("Directory levels must be at least 1")]
    InvalidDirLevels,

    /// Top-N must be at least 1.
    #[error("Top N must be at least 1")]
    InvalidTopN,

    /// A builder was missing a field or failed validation.
    #[error("Invalid configuration: {message}")]
    Builder { message: String },
}

/// Errors that abort a scan.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Permission denied for a path.
    #[error("Permission denied: {path}")]
    PermissionDenied { path: PathBuf },

    /// Path not found.
    #[error("Path not found: {path}")]
    NotFound { path: PathBuf },

    /// Generic I/O error.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Root path is not a directory.
    #[error("Root path is not a directory: {path}")]
    NotADirectory { path: PathBuf },

    /// Invalid configuration.
    #[error(transparent)]
    InvalidConfig(#[from] ConfigError),

    /// Worker pool could not be created.
    #[error("Failed to build scan thread pool: {message}")]
    ThreadPool { message: String },
}

impl ScanError {
    /// Create an I/O error with path context.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::NotFound => Self::NotFound { path },
            _ => Self::Io { path, source },
        }
    }
}

/// Kind of scan warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WarningKind {
    /// Permission was denied.
    PermissionDenied,
    /// Error listing a directory.
    ReadError,
    /// Error reading metadata.
    MetadataError,
}

/// Non-fatal problem with a single entry. The entry is skipped and the scan goes on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    /// Path where the warning occurred.
    pub path: PathBuf,
    /// Human-readable message.
    pub message: String,
    /// Kind of warning.
    pub kind: WarningKind,
}

impl ScanWarning {
    /// Create a new scan warning.
    pub fn new(path: impl Into<PathBuf>, message: impl Into<String>, kind: WarningKind) -> Self {
        Self {
            path: path.into(),
            message: message.into(),
            kind,
        }
    }

    /// Warning for a directory that could not be listed.
    pub fn read_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            WarningKind::ReadError
        };
        Self {
            message: format!("Cannot list directory: {error}"),
            path,
            kind,
        }
    }

    /// Warning for an entry whose metadata could not be read.
    pub fn metadata_error(path: impl Into<PathBuf>, error: &std::io::Error) -> Self {
        let path = path.into();
        let kind = if error.kind() == std::io::ErrorKind::PermissionDenied {
            WarningKind::PermissionDenied
        } else {
            WarningKind::MetadataError
        };
        Self {
            message: format!("Cannot stat entry: {error}"),
            path,
            kind,
        }
    }
}
