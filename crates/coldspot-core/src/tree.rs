//! Per-level directory records and the completed scan result.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::config::ScanConfig;
use crate::error::ScanWarning;
use crate::stats::DirStats;

/// Records keyed by level (root = 1), then by absolute directory path.
///
/// Both maps are ordered, so iteration (and therefore ranking ties) is
/// deterministic regardless of the order directories were visited in.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LevelMap {
    levels: BTreeMap<u32, BTreeMap<PathBuf, DirStats>>,
}

impl LevelMap {
    /// Create an empty map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace the record for `path` at `level`.
    pub fn insert(&mut self, level: u32, path: impl Into<PathBuf>, stats: DirStats) {
        self.levels.entry(level).or_default().insert(path.into(), stats);
    }

    /// Record for `path` at `level`.
    pub fn get(&self, level: u32, path: &Path) -> Option<&DirStats> {
        self.levels.get(&level).and_then(|records| records.get(path))
    }

    /// Mutable record for `path` at `level`.
    pub fn get_mut(&mut self, level: u32, path: &Path) -> Option<&mut DirStats> {
        self.levels.get_mut(&level).and_then(|records| records.get_mut(path))
    }

    /// All records at `level`, in path order.
    pub fn level(&self, level: u32) -> Option<&BTreeMap<PathBuf, DirStats>> {
        self.levels.get(&level)
    }

    /// Iterate levels in ascending order.
    pub fn levels(&self) -> impl Iterator<Item = (u32, &BTreeMap<PathBuf, DirStats>)> {
        self.levels.iter().map(|(level, records)| (*level, records))
    }

    /// Iterate every record as `(level, path, stats)`.
    pub fn records(&self) -> impl Iterator<Item = (u32, &Path, &DirStats)> {
        self.levels.iter().flat_map(|(level, records)| {
            records
                .iter()
                .map(move |(path, stats)| (*level, path.as_path(), stats))
        })
    }

    /// Deepest level present.
    pub fn max_level(&self) -> Option<u32> {
        self.levels.keys().next_back().copied()
    }

    /// Total number of records.
    pub fn record_count(&self) -> usize {
        self.levels.values().map(BTreeMap::len).sum()
    }

    /// Check if there are no records.
    pub fn is_empty(&self) -> bool {
        self.record_count() == 0
    }

    /// The single level-1 record.
    pub fn root(&self) -> Option<(&Path, &DirStats)> {
        self.levels
            .get(&1)
            .and_then(|records| records.iter().next())
            .map(|(path, stats)| (path.as_path(), stats))
    }

    /// Move all records of `other` into this map.
    pub fn merge(&mut self, other: LevelMap) {
        for (level, records) in other.levels {
            self.levels.entry(level).or_default().extend(records);
        }
    }
}

/// Running counts of what a scan has touched.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanTotals {
    /// Directories that received their own record.
    pub directories: u64,
    /// Regular files counted.
    pub files: u64,
    /// Bytes in counted files.
    pub bytes: u64,
}

impl ScanTotals {
    /// Create new empty totals.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add another set of totals.
    pub fn add(&mut self, other: &ScanTotals) {
        self.directories += other.directories;
        self.files += other.files;
        self.bytes += other.bytes;
    }
}

/// Completed coldness scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColdnessScan {
    /// Canonical root path that was scanned.
    pub root_path: PathBuf,

    /// When this scan finished.
    pub scanned_at: DateTime<Utc>,

    /// Duration of the scan.
    pub scan_duration: Duration,

    /// Scan configuration used.
    pub config: ScanConfig,

    /// All directory records.
    pub levels: LevelMap,

    /// Summary counts.
    pub totals: ScanTotals,

    /// Entries skipped because they could not be listed or stat'ed.
    pub warnings: Vec<ScanWarning>,
}

impl ColdnessScan {
    /// Create a new scan result.
    pub fn new(
        root_path: PathBuf,
        config: ScanConfig,
        levels: LevelMap,
        totals: ScanTotals,
        scan_duration: Duration,
        warnings: Vec<ScanWarning>,
    ) -> Self {
        Self {
            root_path,
            scanned_at: Utc::now(),
            scan_duration,
            config,
            levels,
            totals,
            warnings,
        }
    }

    /// Aggregate record of the scan root.
    pub fn root_stats(&self) -> Option<&DirStats> {
        self.levels.get(1, &self.root_path)
    }

    /// Check if there were any warnings during scanning.
    pub fn has_warnings(&self) -> bool {
        !self.warnings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_level_map_insert_and_get() {
        let mut map = LevelMap::new();
        map.insert(1, "/root", DirStats::new(1));
        map.insert(2, "/root/b", DirStats::new(1));
        map.insert(2, "/root/a", DirStats::new(1));

        assert_eq!(map.record_count(), 3);
        assert_eq!(map.max_level(), Some(2));
        assert!(map.get(2, Path::new("/root/a")).is_some());
        assert!(map.get(1, Path::new("/root/a")).is_none());

        let paths: Vec<_> = map.level(2).unwrap().keys().cloned().collect();
        assert_eq!(paths, vec![PathBuf::from("/root/a"), PathBuf::from("/root/b")]);
        assert_eq!(map.root().map(|(p, _)| p), Some(Path::new("/root")));
    }

    #[test]
    fn test_level_map_merge() {
        let mut left = LevelMap::new();
        left.insert(2, "/r/a", DirStats::new(0));
        let mut right = LevelMap::new();
        right.insert(2, "/r/b", DirStats::new(0));
        right.insert(3, "/r/b/c", DirStats::new(0));

        left.merge(right);
        assert_eq!(left.record_count(), 3);
        assert_eq!(left.records().count(), 3);
    }

    #[test]
    fn test_scan_totals_add() {
        let mut totals = ScanTotals::new();
        totals.add(&ScanTotals {
            directories: 1,
            files: 2,
            bytes: 3,
        });
        totals.add(&ScanTotals {
            directories: 1,
            files: 1,
            bytes: 1,
        });
        assert_eq!(
            totals,
            ScanTotals {
                directories: 2,
                files: 3,
                bytes: 4
            }
        );
    }
}
