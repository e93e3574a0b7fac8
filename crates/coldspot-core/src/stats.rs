//! Per-directory coldness statistics and the fold operations over them.
//!
//! A [`DirStats`] is created zeroed when its directory is first visited,
//! grows additively as files and finished subtrees are folded in, and has its
//! ratios computed once by [`DirStats::finalize_ratios`]. Ratios are always
//! derived from the raw counters and are never summed across records.

use std::time::SystemTime;

use serde::{Deserialize, Serialize};

use crate::policy::{TieringPolicy, Timestamps};

/// Size floor for a file to take part in coldness accounting (64 KiB).
pub const VALID_SIZE: u64 = 64 * 1024;

/// Label for the qualifying-size floor, as used in report keys.
pub const VALID_SIZE_LABEL: &str = ">=64KB";

/// What a single `stat` contributes to a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FileSample {
    /// Size in bytes.
    pub size: u64,
    /// Modification and access times.
    pub timestamps: Timestamps,
}

impl FileSample {
    /// Create a new sample.
    pub fn new(size: u64, timestamps: Timestamps) -> Self {
        Self { size, timestamps }
    }

    /// Build a sample from file metadata. Fails when the platform cannot
    /// report a modification time.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> std::io::Result<Self> {
        Ok(Self {
            size: metadata.len(),
            timestamps: Timestamps::from_metadata(metadata)?,
        })
    }

    /// Whether the file meets the [`VALID_SIZE`] floor.
    pub fn is_qualifying(&self) -> bool {
        self.size >= VALID_SIZE
    }
}

/// Cold counters for one tiering policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PolicyStats {
    /// Qualifying files that are cold under the policy.
    pub cold_count: u64,
    /// Bytes in those files.
    pub cold_bytes: u64,
    /// `cold_count / qualifying_count`.
    pub cold_count_ratio: f64,
    /// `cold_bytes / qualifying_bytes`.
    pub cold_byte_ratio: f64,
}

/// Aggregate record for one directory at one level.
///
/// `policies[i]` always corresponds to the `i`-th policy of the scan that
/// produced the record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirStats {
    /// Files in the subtree.
    pub file_count: u64,
    /// Bytes in the subtree.
    pub total_bytes: u64,
    /// Files at or above [`VALID_SIZE`].
    pub qualifying_count: u64,
    /// Bytes in qualifying files.
    pub qualifying_bytes: u64,
    /// `qualifying_count / file_count`.
    pub qualifying_count_ratio: f64,
    /// `qualifying_bytes / total_bytes`.
    pub qualifying_byte_ratio: f64,
    /// Per-policy cold counters.
    pub policies: Vec<PolicyStats>,
}

impl DirStats {
    /// Zeroed record with one zero counter per policy.
    pub fn new(policy_count: usize) -> Self {
        Self {
            file_count: 0,
            total_bytes: 0,
            qualifying_count: 0,
            qualifying_bytes: 0,
            qualifying_count_ratio: 0.0,
            qualifying_byte_ratio: 0.0,
            policies: vec![PolicyStats::default(); policy_count],
        }
    }

    /// Count one file into this record.
    pub fn fold_file(&mut self, file: &FileSample, policies: &[TieringPolicy], reference: SystemTime) {
        debug_assert_eq!(policies.len(), self.policies.len());

        self.file_count += 1;
        self.total_bytes += file.size;

        if !file.is_qualifying() {
            return;
        }

        self.qualifying_count += 1;
        self.qualifying_bytes += file.size;

        for (policy, stats) in policies.iter().zip(self.policies.iter_mut()) {
            if policy.is_cold(&file.timestamps, reference) {
                stats.cold_count += 1;
                stats.cold_bytes += file.size;
            }
        }
    }

    /// Add every counter of a finished child record into this one.
    ///
    /// Ratios are left untouched; call [`finalize_ratios`](Self::finalize_ratios)
    /// once all folds are done.
    pub fn fold_subtree(&mut self, child: &DirStats) {
        debug_assert_eq!(child.policies.len(), self.policies.len());

        self.file_count += child.file_count;
        self.total_bytes += child.total_bytes;
        self.qualifying_count += child.qualifying_count;
        self.qualifying_bytes += child.qualifying_bytes;

        for (mine, theirs) in self.policies.iter_mut().zip(&child.policies) {
            mine.cold_count += theirs.cold_count;
            mine.cold_bytes += theirs.cold_bytes;
        }
    }

    /// Compute all ratio fields from the current counters.
    pub fn finalize_ratios(&mut self) {
        self.qualifying_count_ratio = ratio(self.qualifying_count, self.file_count);
        self.qualifying_byte_ratio = ratio(self.qualifying_bytes, self.total_bytes);

        for stats in &mut self.policies {
            stats.cold_count_ratio = ratio(stats.cold_count, self.qualifying_count);
            stats.cold_byte_ratio = ratio(stats.cold_bytes, self.qualifying_bytes);
        }
    }

    /// Counters for the `index`-th policy.
    pub fn policy(&self, index: usize) -> Option<&PolicyStats> {
        self.policies.get(index)
    }

    /// Whether any file has been counted.
    pub fn is_empty(&self) -> bool {
        self.file_count == 0
    }

    /// Check the containment invariants between counters.
    pub fn is_consistent(&self) -> bool {
        self.qualifying_count <= self.file_count
            && self.qualifying_bytes <= self.total_bytes
            && self.policies.iter().all(|p| {
                p.cold_count <= self.qualifying_count && p.cold_bytes <= self.qualifying_bytes
            })
    }
}

/// `dividend / divisor`, or 0 when the divisor is 0.
pub fn ratio(dividend: u64, divisor: u64) -> f64 {
    if divisor == 0 {
        0.0
    } else {
        dividend as f64 / divisor as f64
    }
}
