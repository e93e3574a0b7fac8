//! Ranking and reporting for coldspot.
//!
//! Given the per-level records of a completed scan, the [`Ranker`] orders the
//! directories of each level under each tiering policy and keeps the top N.
//! The sort metric is always policy-scoped: `Size` ranks by cold bytes,
//! `SizeRatio` by cold bytes over qualifying bytes, and so on.
//!
//! ```rust,ignore
//! use coldspot_analyze::{RankConfig, Ranker, SortKey};
//! use coldspot_scan::{LevelWalker, ScanConfig};
//!
//! let scan = LevelWalker::new().scan(&ScanConfig::new("/path/to/scan")).unwrap();
//!
//! let config = RankConfig::builder().top_n(3usize).sort_key(SortKey::SizeRatio).build().unwrap();
//! let report = Ranker::with_config(config).rank(&scan);
//!
//! for entry in report.entries() {
//!     println!("{} {} {}", entry.slot_id(), entry.path.display(), entry.metric);
//! }
//! ```

pub mod format;
mod rank;

pub use format::{format_count, format_ratio, format_size, render_entry, render_report};
pub use rank::{RankConfig, RankConfigBuilder, RankConfigBuilderError, RankEntry, RankReport, Ranker, SortKey};

// Re-export core types
pub use coldspot_core::{ColdnessScan, LevelMap, TieringPolicy};
