//! Per-level ranking of directories by cold data.

use std::path::PathBuf;
use std::str::FromStr;

use derive_builder::Builder;
use indexmap::IndexMap;
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use tracing::debug;

use coldspot_core::{ColdnessScan, ConfigError, DirStats, LevelMap, TieringPolicy};

/// Metric used to order directories, always taken under one policy.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumIter, Serialize, Deserialize,
)]
pub enum SortKey {
    /// Cold bytes.
    #[default]
    Size,
    /// Cold bytes over qualifying bytes.
    SizeRatio,
    /// Cold file count.
    Count,
    /// Cold file count over qualifying file count.
    CountRatio,
}

impl SortKey {
    /// Value of this metric for the `policy_index`-th policy of `stats`.
    pub fn metric(self, stats: &DirStats, policy_index: usize) -> f64 {
        let Some(policy) = stats.policy(policy_index) else {
            return 0.0;
        };
        match self {
            SortKey::Size => policy.cold_bytes as f64,
            SortKey::SizeRatio => policy.cold_byte_ratio,
            SortKey::Count => policy.cold_count as f64,
            SortKey::CountRatio => policy.cold_count_ratio,
        }
    }
}

impl FromStr for SortKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "size" => Ok(SortKey::Size),
            "sizeratio" => Ok(SortKey::SizeRatio),
            "count" => Ok(SortKey::Count),
            "countratio" => Ok(SortKey::CountRatio),
            _ => Err(ConfigError::InvalidSortKey {
                value: s.to_string(),
            }),
        }
    }
}

/// Configuration for ranking.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct RankConfig {
    /// Entries kept per (level, policy).
    #[builder(default = "2")]
    pub top_n: usize,

    /// Metric to order by.
    #[builder(default)]
    pub sort_key: SortKey,
}

impl RankConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        if self.top_n == Some(0) {
            return Err(ConfigError::InvalidTopN.to_string());
        }
        Ok(())
    }
}

impl Default for RankConfig {
    fn default() -> Self {
        Self {
            top_n: 2,
            sort_key: SortKey::Size,
        }
    }
}

impl RankConfig {
    /// Create a new config builder.
    pub fn builder() -> RankConfigBuilder {
        RankConfigBuilder::default()
    }
}

/// One ranked directory under one policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    /// Level the directory was recorded at (root = 1).
    pub level: u32,
    /// Policy the ranking was computed under.
    pub policy: TieringPolicy,
    /// Position within the (level, policy) ranking, starting at 0.
    pub rank_slot: usize,
    /// Directory path.
    pub path: PathBuf,
    /// Value of the sort metric.
    pub metric: f64,
    /// Bytes in all files.
    pub size: u64,
    /// Bytes in qualifying files.
    pub qualifying_size: u64,
    /// Bytes in cold files.
    pub policy_size: u64,
    /// Cold bytes over qualifying bytes.
    pub policy_size_ratio: f64,
    /// All files.
    pub count: u64,
    /// Qualifying files.
    pub qualifying_count: u64,
    /// Cold files.
    pub policy_count: u64,
    /// Cold files over qualifying files.
    pub policy_count_ratio: f64,
}

impl RankEntry {
    fn new(
        level: u32,
        policy: TieringPolicy,
        policy_index: usize,
        rank_slot: usize,
        path: PathBuf,
        stats: &DirStats,
        sort_key: SortKey,
    ) -> Self {
        let cold = stats.policy(policy_index).copied().unwrap_or_default();
        Self {
            level,
            policy,
            rank_slot,
            path,
            metric: sort_key.metric(stats, policy_index),
            size: stats.total_bytes,
            qualifying_size: stats.qualifying_bytes,
            policy_size: cold.cold_bytes,
            policy_size_ratio: cold.cold_byte_ratio,
            count: stats.file_count,
            qualifying_count: stats.qualifying_count,
            policy_count: cold.cold_count,
            policy_count_ratio: cold.cold_count_ratio,
        }
    }

    /// Identifier of this entry within its level, e.g. `Rank#0#Atime#14`.
    pub fn slot_id(&self) -> String {
        format!("Rank#{}#{}#{}", self.rank_slot, self.policy.field, self.policy.days)
    }
}

/// Ranked entries grouped by level, in emission order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RankReport {
    /// Metric the entries were ordered by.
    pub sort_key: SortKey,
    /// Maximum entries per (level, policy).
    pub top_n: usize,
    /// `"level-N"` to slot id to entry.
    pub levels: IndexMap<String, IndexMap<String, RankEntry>>,
}

impl RankReport {
    /// Key used for a level.
    pub fn level_key(level: u32) -> String {
        format!("level-{level}")
    }

    /// Entries of one level, if any were emitted.
    pub fn level(&self, level: u32) -> Option<&IndexMap<String, RankEntry>> {
        self.levels.get(&Self::level_key(level))
    }

    /// Every entry in emission order.
    pub fn entries(&self) -> impl Iterator<Item = &RankEntry> {
        self.levels.values().flat_map(IndexMap::values)
    }

    /// Entries of one level under one policy, in rank order.
    pub fn ranking(&self, level: u32, policy: &TieringPolicy) -> Vec<&RankEntry> {
        self.entries()
            .filter(|e| e.level == level && e.policy == *policy)
            .collect()
    }

    /// Check if no entries were emitted.
    pub fn is_empty(&self) -> bool {
        self.levels.is_empty()
    }
}

/// Ranks directories within each level.
pub struct Ranker {
    config: RankConfig,
}

impl Ranker {
    /// Create a new ranker with default config.
    pub fn new() -> Self {
        Self {
            config: RankConfig::default(),
        }
    }

    /// Create a new ranker with custom config.
    pub fn with_config(config: RankConfig) -> Self {
        Self { config }
    }

    /// Rank a completed scan.
    pub fn rank(&self, scan: &ColdnessScan) -> RankReport {
        self.rank_levels(&scan.levels, &scan.config.policies)
    }

    /// Rank every level of `levels` under every policy.
    ///
    /// Directories are ordered by the sort metric, descending. Ties keep path
    /// order. Levels with fewer than `top_n` directories emit what they have.
    /// `policies` must be distinct, as `ScanConfig` validation guarantees for
    /// a scan; a repeated policy maps to the same slot ids.
    pub fn rank_levels(&self, levels: &LevelMap, policies: &[TieringPolicy]) -> RankReport {
        let sort_key = self.config.sort_key;
        let mut report = RankReport {
            sort_key,
            top_n: self.config.top_n,
            levels: IndexMap::new(),
        };

        for (level, records) in levels.levels() {
            for (policy_index, policy) in policies.iter().enumerate() {
                let ranked = records
                    .iter()
                    .sorted_by(|(_, a), (_, b)| {
                        sort_key
                            .metric(b, policy_index)
                            .total_cmp(&sort_key.metric(a, policy_index))
                    })
                    .take(self.config.top_n);

                for (rank_slot, (path, stats)) in ranked.enumerate() {
                    let entry = RankEntry::new(
                        level,
                        *policy,
                        policy_index,
                        rank_slot,
                        path.clone(),
                        stats,
                        sort_key,
                    );
                    debug!(level, slot = %entry.slot_id(), path = %path.display(), metric = entry.metric, "ranked");
                    report
                        .levels
                        .entry(RankReport::level_key(level))
                        .or_default()
                        .insert(entry.slot_id(), entry);
                }
            }
        }

        report
    }
}

impl Default for Ranker {
    fn default() -> Self {
        Self::new()
    }
}
