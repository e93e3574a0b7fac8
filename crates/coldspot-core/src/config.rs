//! Scan configuration types.

use std::path::PathBuf;
use std::time::SystemTime;

use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::policy::{TieringPolicy, check_distinct};

/// Default number of directory levels to report.
pub const DEFAULT_DIR_LEVELS: u32 = 3;

/// Configuration for a coldness scan.
#[derive(Debug, Clone, Builder, Serialize, Deserialize)]
#[builder(setter(into), build_fn(validate = "Self::validate"))]
pub struct ScanConfig {
    /// Root directory to scan.
    pub root: PathBuf,

    /// Deepest level that gets its own records (root = 1). Everything below
    /// is folded into the record of its ancestor at this level.
    #[builder(default = "DEFAULT_DIR_LEVELS")]
    #[serde(default = "default_dir_levels")]
    pub dir_levels: u32,

    /// Tiering policies evaluated for every file.
    #[builder(default = "vec![TieringPolicy::default()]")]
    #[serde(default = "default_policies")]
    pub policies: Vec<TieringPolicy>,

    /// Follow symbolic links when reading file metadata.
    #[builder(default = "false")]
    #[serde(default)]
    pub follow_symlinks: bool,

    /// Worker threads for expanding subtrees (1 = sequential, 0 = auto-detect).
    #[builder(default = "1")]
    #[serde(default = "default_threads")]
    pub threads: usize,

    /// The "now" file ages are measured against.
    #[builder(default = "SystemTime::now()")]
    #[serde(default = "SystemTime::now")]
    pub reference_time: SystemTime,
}

fn default_dir_levels() -> u32 {
    DEFAULT_DIR_LEVELS
}

fn default_policies() -> Vec<TieringPolicy> {
    vec![TieringPolicy::default()]
}

fn default_threads() -> usize {
    1
}

impl ScanConfigBuilder {
    fn validate(&self) -> Result<(), String> {
        match self.root {
            Some(ref root) if root.as_os_str().is_empty() => {
                return Err("Root path cannot be empty".to_string());
            }
            None => return Err("Root path is required".to_string()),
            _ => {}
        }
        if self.dir_levels == Some(0) {
            return Err(ConfigError::InvalidDirLevels.to_string());
        }
        if let Some(ref policies) = self.policies {
            if policies.is_empty() {
                return Err(ConfigError::EmptyPolicyList.to_string());
            }
            check_distinct(policies).map_err(|e| e.to_string())?;
        }
        Ok(())
    }
}

impl ScanConfig {
    /// Create a new scan config builder.
    pub fn builder() -> ScanConfigBuilder {
        ScanConfigBuilder::default()
    }

    /// Create a config with defaults for everything but the root.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            dir_levels: DEFAULT_DIR_LEVELS,
            policies: default_policies(),
            follow_symlinks: false,
            threads: 1,
            reference_time: SystemTime::now(),
        }
    }

    /// Check values that the builder cannot enforce on directly constructed configs.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.root.as_os_str().is_empty() {
            return Err(ConfigError::Builder {
                message: "Root path cannot be empty".to_string(),
            });
        }
        if self.dir_levels == 0 {
            return Err(ConfigError::InvalidDirLevels);
        }
        if self.policies.is_empty() {
            return Err(ConfigError::EmptyPolicyList);
        }
        check_distinct(&self.policies)
    }
}

impl From<ScanConfigBuilderError> for ConfigError {
    fn from(err: ScanConfigBuilderError) -> Self {
        ConfigError::Builder {
            message: err.to_string(),
        }
    }
}
