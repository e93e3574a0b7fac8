//! Core types for coldspot.
//!
//! This crate provides the data model shared by the scanner and the ranker:
//! tiering policies, the per-directory statistics record with its fold
//! operations, the per-level record map, configuration, and errors.

mod config;
mod error;
mod policy;
mod stats;
mod tree;

pub use config::{DEFAULT_DIR_LEVELS, ScanConfig, ScanConfigBuilder, ScanConfigBuilderError};
pub use error::{ConfigError, ScanError, ScanWarning, WarningKind};
pub use policy::{TieringPolicy, TimeField, Timestamps, age_in_days, parse_policies};
pub use stats::{DirStats, FileSample, PolicyStats, VALID_SIZE, VALID_SIZE_LABEL, ratio};
pub use tree::{ColdnessScan, LevelMap, ScanTotals};
