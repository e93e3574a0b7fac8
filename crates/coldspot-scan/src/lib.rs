//! Directory walker for coldspot.
//!
//! This crate traverses a directory tree and builds one coldness record per
//! directory down to a configured level.
//!
//! # Overview
//!
//! - **Level-bounded expansion**: directories above the cutoff get their own
//!   record and are expanded child by child
//! - **Flattened subtrees**: at the cutoff, the whole subtree is folded into
//!   one record with jwalk
//! - **Optional parallelism**: sibling subtrees can be expanded on a rayon
//!   pool with results identical to a sequential run
//! - **Progress updates** via broadcast channels
//!
//! # Example
//!
//! ```rust,no_run
//! use coldspot_scan::{LevelWalker, ScanConfig, parse_policies};
//!
//! let config = ScanConfig::builder()
//!     .root("/path/to/scan")
//!     .dir_levels(3u32)
//!     .policies(parse_policies("14-atime,30-mtime").unwrap())
//!     .build()
//!     .unwrap();
//!
//! let scan = LevelWalker::new().scan(&config).unwrap();
//! if let Some(root) = scan.root_stats() {
//!     println!("{} files, {} bytes", root.file_count, root.total_bytes);
//! }
//! ```

mod dataset;
mod progress;
mod walker;

pub use dataset::{COLDNESS_LEVELS, ColdnessDataset, DATASET_FILES};
pub use progress::ScanProgress;
pub use walker::LevelWalker;

// Re-export core types for convenience
pub use coldspot_core::{
    ColdnessScan, ConfigError, DirStats, LevelMap, ScanConfig, ScanError, ScanWarning,
    TieringPolicy, TimeField, WarningKind, parse_policies,
};
