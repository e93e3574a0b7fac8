//! Synthetic dataset with known coldness, for trying out scans and rankings.
//!
//! Layout under the target directory:
//!
//! ```text
//! Mtime_Hot/          Atime_Hot/
//! Mtime_7-Days-Cold/  Atime_7-Days-Cold/
//! ...                 ...
//! Mtime_90-Days-Cold/ Atime_90-Days-Cold/
//! ```
//!
//! Every directory holds the same set of sparse files, one of them below the
//! 64 KiB qualifying floor. `Mtime_*` files have their modification time moved
//! back by the directory's day count; `Atime_*` files their access time.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};

use strum::IntoEnumIterator;
use tracing::info;

use coldspot_core::{ScanError, TimeField};

const SECS_PER_DAY: u64 = 24 * 60 * 60;

/// Day offsets and directory suffixes.
pub const COLDNESS_LEVELS: [(u64, &str); 6] = [
    (0, "Hot"),
    (7, "7-Days-Cold"),
    (14, "14-Days-Cold"),
    (30, "30-Days-Cold"),
    (60, "60-Days-Cold"),
    (90, "90-Days-Cold"),
];

/// File names and sizes written into every directory.
pub const DATASET_FILES: [(&str, u64); 4] = [
    ("Size63KB", 63 * 1024),
    ("Size1MB", 1024 * 1024),
    ("Size64MB", 64 * 1024 * 1024),
    ("Size1GB", 1024 * 1024 * 1024),
];

/// Builder for the synthetic dataset.
#[derive(Debug, Clone)]
pub struct ColdnessDataset {
    root: PathBuf,
    reference_time: SystemTime,
}

impl ColdnessDataset {
    /// Dataset rooted at `root`, aged relative to now.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            reference_time: SystemTime::now(),
        }
    }

    /// Age files relative to `reference_time` instead of now.
    pub fn with_reference_time(mut self, reference_time: SystemTime) -> Self {
        self.reference_time = reference_time;
        self
    }

    /// Directory name for a time field and coldness level.
    pub fn dir_name(field: TimeField, suffix: &str) -> String {
        format!("{field}_{suffix}")
    }

    /// Write the dataset. The root must be missing or empty.
    pub fn create(&self) -> Result<Vec<PathBuf>, ScanError> {
        if self.root.exists() {
            let mut entries = fs::read_dir(&self.root).map_err(|e| ScanError::io(&self.root, e))?;
            if entries.next().is_some() {
                return Err(ScanError::io(
                    &self.root,
                    std::io::Error::new(
                        std::io::ErrorKind::AlreadyExists,
                        "dataset target directory is not empty",
                    ),
                ));
            }
        }
        fs::create_dir_all(&self.root).map_err(|e| ScanError::io(&self.root, e))?;

        let mut created = Vec::new();
        for field in TimeField::iter() {
            for (days, suffix) in COLDNESS_LEVELS {
                let dir = self.root.join(Self::dir_name(field, suffix));
                fs::create_dir(&dir).map_err(|e| ScanError::io(&dir, e))?;

                let aged = self.reference_time - Duration::from_secs(days * SECS_PER_DAY);
                for (name, size) in DATASET_FILES {
                    let path = dir.join(name);
                    write_sparse(&path, size, field, aged, self.reference_time)?;
                    created.push(path);
                }
            }
        }

        info!(root = %self.root.display(), files = created.len(), "created coldness dataset");
        Ok(created)
    }
}

fn write_sparse(
    path: &Path,
    size: u64,
    field: TimeField,
    aged: SystemTime,
    fresh: SystemTime,
) -> Result<(), ScanError> {
    let file = File::create(path).map_err(|e| ScanError::io(path, e))?;
    file.set_len(size).map_err(|e| ScanError::io(path, e))?;

    let times = match field {
        TimeField::Modified => FileTimes::new().set_modified(aged).set_accessed(fresh),
        TimeField::Accessed => FileTimes::new().set_modified(fresh).set_accessed(aged),
    };
    file.set_times(times).map_err(|e| ScanError::io(path, e))
}
