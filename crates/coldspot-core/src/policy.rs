//! Tiering policies: age thresholds on modification or access time.

use std::fmt;
use std::io;
use std::str::FromStr;
use std::time::{Duration, SystemTime};

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};

use crate::error::ConfigError;

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Which file timestamp a policy looks at.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, Serialize, Deserialize,
)]
pub enum TimeField {
    /// Last modification time (`mtime`).
    #[strum(to_string = "Mtime")]
    Modified,
    /// Last access time (`atime`).
    #[strum(to_string = "Atime")]
    Accessed,
}

impl TimeField {
    /// Short lowercase name used in policy strings.
    pub fn short_name(self) -> &'static str {
        match self {
            TimeField::Modified => "mtime",
            TimeField::Accessed => "atime",
        }
    }
}

impl FromStr for TimeField {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mtime" => Ok(TimeField::Modified),
            "atime" => Ok(TimeField::Accessed),
            _ => Err(ConfigError::InvalidTimeField {
                value: s.to_string(),
            }),
        }
    }
}

/// File metadata timestamps relevant to tiering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timestamps {
    /// Last modification time.
    pub modified: SystemTime,
    /// Last access time (if the platform reports it).
    pub accessed: Option<SystemTime>,
}

impl Timestamps {
    /// Create timestamps with only modified time.
    pub fn with_modified(modified: SystemTime) -> Self {
        Self {
            modified,
            accessed: None,
        }
    }

    /// Create timestamps with both times.
    pub fn new(modified: SystemTime, accessed: Option<SystemTime>) -> Self {
        Self { modified, accessed }
    }

    /// Read timestamps from file metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> io::Result<Self> {
        Self::from_times(metadata.modified(), metadata.accessed())
    }

    /// Combine raw timestamp reads. A missing modification time is an error;
    /// a missing access time is not.
    pub fn from_times(
        modified: io::Result<SystemTime>,
        accessed: io::Result<SystemTime>,
    ) -> io::Result<Self> {
        Ok(Self {
            modified: modified?,
            accessed: accessed.ok(),
        })
    }

    /// The timestamp a policy field refers to. Access time falls back to
    /// modification time when unavailable.
    pub fn get(&self, field: TimeField) -> SystemTime {
        match field {
            TimeField::Modified => self.modified,
            TimeField::Accessed => self.accessed.unwrap_or(self.modified),
        }
    }
}

/// A `(days, time field)` pair. Files whose selected timestamp is at least
/// `days` whole days old are cold under this policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TieringPolicy {
    /// Age threshold in whole days.
    pub days: u64,
    /// Timestamp the threshold applies to.
    pub field: TimeField,
}

impl TieringPolicy {
    /// Create a new policy.
    pub fn new(days: u64, field: TimeField) -> Self {
        Self { days, field }
    }

    /// Whether a file with these timestamps is cold at `reference`.
    ///
    /// Age is truncated to whole days and compared with `>=`. Timestamps in
    /// the future have age zero.
    pub fn is_cold(&self, timestamps: &Timestamps, reference: SystemTime) -> bool {
        age_in_days(timestamps.get(self.field), reference) >= self.days
    }
}

impl Default for TieringPolicy {
    fn default() -> Self {
        Self::new(14, TimeField::Accessed)
    }
}

impl fmt::Display for TieringPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.days, self.field.short_name())
    }
}

impl FromStr for TieringPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split('-').collect();
        if parts.len() != 2 {
            return Err(ConfigError::InvalidPolicy {
                input: s.to_string(),
                reason: format!("expected <days>-<mtime|atime>, got {} segment(s)", parts.len()),
            });
        }

        let days = parts[0]
            .trim()
            .parse::<u64>()
            .map_err(|e| ConfigError::InvalidPolicy {
                input: s.to_string(),
                reason: format!("day count '{}' is not a non-negative integer: {e}", parts[0]),
            })?;

        let field = parts[1].parse::<TimeField>()?;

        Ok(Self { days, field })
    }
}

/// Parse a comma-separated policy list such as `14-atime,30-mtime`.
pub fn parse_policies(input: &str) -> Result<Vec<TieringPolicy>, ConfigError> {
    if input.trim().is_empty() {
        return Err(ConfigError::EmptyPolicyList);
    }
    let policies: Vec<TieringPolicy> = input.split(',').map(str::parse).collect::<Result<_, _>>()?;
    check_distinct(&policies)?;
    Ok(policies)
}

/// Reject a policy list naming the same policy twice. Rankings are keyed by
/// policy, so a repeat would overwrite its own entries.
pub(crate) fn check_distinct(policies: &[TieringPolicy]) -> Result<(), ConfigError> {
    for (i, policy) in policies.iter().enumerate() {
        if policies[..i].contains(policy) {
            return Err(ConfigError::DuplicatePolicy {
                policy: policy.to_string(),
            });
        }
    }
    Ok(())
}

/// Whole days elapsed between `timestamp` and `reference`.
pub fn age_in_days(timestamp: SystemTime, reference: SystemTime) -> u64 {
    reference
        .duration_since(timestamp)
        .unwrap_or(Duration::ZERO)
        .as_secs()
        / SECS_PER_DAY
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: Duration = Duration::from_secs(SECS_PER_DAY);

    #[test]
    fn test_timestamps_require_modified_time() {
        let now = SystemTime::now();
        let unsupported = || Err(io::Error::from(io::ErrorKind::Unsupported));

        let missing = Timestamps::from_times(unsupported(), Ok(now));
        assert_eq!(missing.unwrap_err().kind(), io::ErrorKind::Unsupported);

        let no_atime = Timestamps::from_times(Ok(now), unsupported()).unwrap();
        assert_eq!(no_atime, Timestamps::with_modified(now));
        assert_eq!(no_atime.get(TimeField::Accessed), now);
    }

    #[test]
    fn test_parse_single_policy() {
        let policy: TieringPolicy = "14-atime".parse().unwrap();
        assert_eq!(policy, TieringPolicy::new(14, TimeField::Accessed));
        assert_eq!(policy.to_string(), "14-atime");
    }

    #[test]
    fn test_parse_policy_case_insensitive() {
        let policy: TieringPolicy = "30-MTime".parse().unwrap();
        assert_eq!(policy.field, TimeField::Modified);
        assert_eq!(policy.days, 30);
    }

    #[test]
    fn test_parse_policy_list() {
        let policies = parse_policies("14-atime,30-mtime").unwrap();
        assert_eq!(
            policies,
            vec![
                TieringPolicy::new(14, TimeField::Accessed),
                TieringPolicy::new(30, TimeField::Modified),
            ]
        );
    }

    #[test]
    fn test_parse_policy_errors() {
        assert!(matches!(
            "14".parse::<TieringPolicy>(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            "1-2-atime".parse::<TieringPolicy>(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            "x-atime".parse::<TieringPolicy>(),
            Err(ConfigError::InvalidPolicy { .. })
        ));
        assert!(matches!(
            "14-ctime".parse::<TieringPolicy>(),
            Err(ConfigError::InvalidTimeField { .. })
        ));
        assert_eq!(parse_policies(""), Err(ConfigError::EmptyPolicyList));
        assert!(parse_policies("14-atime,").is_err());
    }

    #[test]
    fn test_parse_policy_list_rejects_repeats() {
        assert_eq!(
            parse_policies("14-atime,30-mtime,14-ATIME"),
            Err(ConfigError::DuplicatePolicy {
                policy: "14-atime".to_string()
            })
        );
        // Same days on a different field is a distinct policy.
        assert_eq!(parse_policies("14-atime,14-mtime").unwrap().len(), 2);
    }

    #[test]
    fn test_time_field_display() {
        assert_eq!(TimeField::Modified.to_string(), "Mtime");
        assert_eq!(TimeField::Accessed.to_string(), "Atime");
    }

    #[test]
    fn test_age_truncates_to_whole_days() {
        let reference = SystemTime::UNIX_EPOCH + DAY * 100;
        assert_eq!(age_in_days(reference - DAY * 3, reference), 3);
        assert_eq!(age_in_days(reference - DAY * 3 + Duration::from_secs(1), reference), 2);
        assert_eq!(age_in_days(reference + DAY, reference), 0);
    }

    #[test]
    fn test_is_cold_boundary_inclusive() {
        let reference = SystemTime::UNIX_EPOCH + DAY * 100;
        let policy = TieringPolicy::new(14, TimeField::Accessed);

        let exactly = Timestamps::new(reference, Some(reference - DAY * 14));
        assert!(policy.is_cold(&exactly, reference));

        let almost = Timestamps::new(reference, Some(reference - DAY * 14 + Duration::from_secs(60)));
        assert!(!policy.is_cold(&almost, reference));
    }

    #[test]
    fn test_access_time_falls_back_to_modified() {
        let reference = SystemTime::UNIX_EPOCH + DAY * 100;
        let timestamps = Timestamps::with_modified(reference - DAY * 20);
        assert!(TieringPolicy::new(14, TimeField::Accessed).is_cold(&timestamps, reference));
    }
}
