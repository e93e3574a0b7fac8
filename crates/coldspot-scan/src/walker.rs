//! Level-bounded directory walker.
//!
//! Directories above the configured cutoff are expanded one level at a time
//! and each gets its own record. A directory at the cutoff is flattened: its
//! whole subtree, however deep, is folded into that single record with jwalk.
//! Children finish before their parent folds them in, so a parent never sees
//! a partial child record.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use jwalk::{Parallelism, WalkDir};
use rayon::prelude::*;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use coldspot_core::{
    ColdnessScan, DirStats, FileSample, LevelMap, ScanConfig, ScanError, ScanTotals, ScanWarning,
    WarningKind,
};

use crate::progress::{ProgressTracker, ScanProgress};

/// Files between progress broadcasts.
const PROGRESS_INTERVAL: u64 = 1000;

/// Walks a directory tree and produces per-level coldness records.
pub struct LevelWalker {
    progress_tx: broadcast::Sender<ScanProgress>,
}

impl LevelWalker {
    /// Create a new walker.
    pub fn new() -> Self {
        let (progress_tx, _) = broadcast::channel(100);
        Self { progress_tx }
    }

    /// Subscribe to scan progress updates.
    pub fn subscribe(&self) -> broadcast::Receiver<ScanProgress> {
        self.progress_tx.subscribe()
    }

    /// Scan `config.root` and build a record for every directory up to
    /// `config.dir_levels`.
    pub fn scan(&self, config: &ScanConfig) -> Result<ColdnessScan, ScanError> {
        config.validate()?;

        let start = Instant::now();
        let root_path = config
            .root
            .canonicalize()
            .map_err(|e| ScanError::io(&config.root, e))?;

        if !root_path.is_dir() {
            return Err(ScanError::NotADirectory { path: root_path });
        }

        info!(
            root = %root_path.display(),
            dir_levels = config.dir_levels,
            policies = config.policies.len(),
            threads = config.threads,
            "starting coldness scan"
        );

        let tracker = ProgressTracker::new();
        let walk = Walk {
            config,
            tracker: &tracker,
            progress_tx: &self.progress_tx,
        };

        let subtree = if config.threads == 1 {
            walk.expand(1, &root_path)
        } else {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(config.threads)
                .build()
                .map_err(|e| ScanError::ThreadPool {
                    message: e.to_string(),
                })?;
            pool.install(|| walk.expand(1, &root_path))
        };

        let final_progress = tracker.snapshot(&root_path, true);
        let files_per_second = final_progress.files_per_second();
        let _ = self.progress_tx.send(final_progress);

        let scan_duration = start.elapsed();
        info!(
            directories = subtree.totals.directories,
            files = subtree.totals.files,
            bytes = subtree.totals.bytes,
            warnings = subtree.warnings.len(),
            elapsed_ms = scan_duration.as_millis() as u64,
            files_per_second = files_per_second.round() as u64,
            "coldness scan finished"
        );

        Ok(ColdnessScan::new(
            root_path,
            config.clone(),
            subtree.records,
            subtree.totals,
            scan_duration,
            subtree.warnings,
        ))
    }
}

impl Default for LevelWalker {
    fn default() -> Self {
        Self::new()
    }
}

/// Everything produced by one finished subtree.
struct Subtree {
    stats: DirStats,
    records: LevelMap,
    totals: ScanTotals,
    warnings: Vec<ScanWarning>,
}

impl Subtree {
    fn new(policy_count: usize) -> Self {
        Self {
            stats: DirStats::new(policy_count),
            records: LevelMap::new(),
            totals: ScanTotals::new(),
            warnings: Vec::new(),
        }
    }

    /// Fold a finished child subtree into this one.
    fn absorb(&mut self, child: Subtree) {
        self.stats.fold_subtree(&child.stats);
        self.records.merge(child.records);
        self.totals.add(&child.totals);
        self.warnings.extend(child.warnings);
    }

    /// Seal the record for `path` at `level`.
    fn finish(&mut self, level: u32, path: &Path) {
        self.stats.finalize_ratios();
        self.totals.directories += 1;
        self.records.insert(level, path, self.stats.clone());
    }
}

/// State shared by every directory of one scan.
struct Walk<'a> {
    config: &'a ScanConfig,
    tracker: &'a ProgressTracker,
    progress_tx: &'a broadcast::Sender<ScanProgress>,
}

impl Walk<'_> {
    fn expand(&self, level: u32, path: &Path) -> Subtree {
        if level >= self.config.dir_levels {
            return self.flatten(level, path);
        }

        debug!(level, path = %path.display(), "expanding directory");

        let mut subtree = Subtree::new(self.config.policies.len());
        let child_dirs = self.collect_entries(path, &mut subtree);

        let children: Vec<Subtree> = if self.config.threads == 1 {
            child_dirs
                .iter()
                .map(|child| self.expand(level + 1, child))
                .collect()
        } else {
            child_dirs
                .par_iter()
                .map(|child| self.expand(level + 1, child))
                .collect()
        };

        for child in children {
            subtree.absorb(child);
        }

        subtree.finish(level, path);
        self.tracker.record_dir();
        debug!(
            level,
            path = %path.display(),
            files = subtree.stats.file_count,
            bytes = subtree.stats.total_bytes,
            "collected directory"
        );
        subtree
    }

    /// List `path`, folding its files into `subtree` and returning its child
    /// directories in name order.
    fn collect_entries(&self, path: &Path, subtree: &mut Subtree) -> Vec<PathBuf> {
        let mut child_dirs = Vec::new();

        let entries = match fs::read_dir(path) {
            Ok(entries) => entries,
            Err(err) => {
                self.skip(subtree, ScanWarning::read_error(path, &err));
                return child_dirs;
            }
        };

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip(subtree, ScanWarning::read_error(path, &err));
                    continue;
                }
            };

            let child = entry.path();
            let metadata = if self.config.follow_symlinks {
                fs::metadata(&child)
            } else {
                entry.metadata()
            };

            match metadata {
                Ok(metadata) if metadata.is_dir() => child_dirs.push(child),
                Ok(metadata) if metadata.is_file() => self.sample_file(subtree, &metadata, &child),
                Ok(_) => {}
                Err(err) => self.skip(subtree, ScanWarning::metadata_error(&child, &err)),
            }
        }

        child_dirs.sort();
        child_dirs
    }

    /// Fold the whole subtree under `path` into one record at `level`.
    fn flatten(&self, level: u32, path: &Path) -> Subtree {
        debug!(level, path = %path.display(), "flattening subtree");

        let mut subtree = Subtree::new(self.config.policies.len());

        let walker = WalkDir::new(path)
            .parallelism(Parallelism::Serial)
            .skip_hidden(false)
            .follow_links(self.config.follow_symlinks);

        for entry_result in walker {
            let mut entry = match entry_result {
                Ok(entry) => entry,
                Err(err) => {
                    self.skip(&mut subtree, jwalk_warning(&err, path, WarningKind::ReadError));
                    continue;
                }
            };

            let entry_path = entry.path();

            // jwalk yields an unlistable directory as Ok and parks the error on the entry.
            if let Some(err) = entry.read_children_error.take() {
                self.skip(&mut subtree, jwalk_warning(&err, &entry_path, WarningKind::ReadError));
            }

            if entry.file_type().is_dir() {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) if metadata.is_file() => {
                    self.sample_file(&mut subtree, &metadata, &entry_path);
                }
                Ok(_) => {}
                Err(err) => {
                    self.skip(&mut subtree, jwalk_warning(&err, &entry_path, WarningKind::MetadataError));
                }
            }
        }

        subtree.finish(level, path);
        self.tracker.record_dir();
        subtree
    }

    /// Count a regular file, or skip it if its timestamps cannot be read.
    fn sample_file(&self, subtree: &mut Subtree, metadata: &fs::Metadata, path: &Path) {
        match FileSample::from_metadata(metadata) {
            Ok(file) => self.count_file(subtree, &file, path),
            Err(err) => self.skip(subtree, ScanWarning::metadata_error(path, &err)),
        }
    }

    fn count_file(&self, subtree: &mut Subtree, file: &FileSample, path: &Path) {
        subtree
            .stats
            .fold_file(file, &self.config.policies, self.config.reference_time);
        subtree.totals.files += 1;
        subtree.totals.bytes += file.size;

        let count = self.tracker.record_file(file.size);
        if count % PROGRESS_INTERVAL == 0 {
            let _ = self.progress_tx.send(self.tracker.snapshot(path, false));
        }
    }

    fn skip(&self, subtree: &mut Subtree, warning: ScanWarning) {
        warn!(path = %warning.path.display(), kind = ?warning.kind, "{}", warning.message);
        self.tracker.record_error();
        subtree.warnings.push(warning);
    }
}

/// Convert a jwalk error into a warning, keeping permission failures distinct.
fn jwalk_warning(err: &jwalk::Error, fallback: &Path, kind: WarningKind) -> ScanWarning {
    let path = err
        .path()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| fallback.to_path_buf());
    let kind = match err.io_error().map(std::io::Error::kind) {
        Some(std::io::ErrorKind::PermissionDenied) => WarningKind::PermissionDenied,
        _ => kind,
    };
    ScanWarning::new(path, err.to_string(), kind)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();

        fs::create_dir(root.join("dir1")).unwrap();
        fs::create_dir(root.join("dir2")).unwrap();
        fs::create_dir(root.join("dir1/subdir")).unwrap();
        fs::create_dir(root.join("dir1/subdir/deeper")).unwrap();

        fs::write(root.join("file1.txt"), "hello").unwrap();
        fs::write(root.join("dir1/file2.txt"), "world world world").unwrap();
        fs::write(root.join("dir1/subdir/file3.txt"), "test").unwrap();
        fs::write(root.join("dir1/subdir/deeper/file4.txt"), "deep").unwrap();
        fs::write(root.join("dir2/file5.txt"), "another file here").unwrap();

        temp
    }

    #[test]
    fn test_basic_scan() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());

        let scan = LevelWalker::new().scan(&config).unwrap();

        assert_eq!(scan.totals.files, 5);
        let root = scan.root_stats().unwrap();
        assert_eq!(root.file_count, 5);
        assert_eq!(root.total_bytes, 5 + 17 + 4 + 4 + 17);
        assert!(!scan.has_warnings());
    }

    #[test]
    fn test_records_per_level() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path());
        let scan = LevelWalker::new().scan(&config).unwrap();
        let root = &scan.root_path;

        assert_eq!(scan.levels.level(1).unwrap().len(), 1);
        assert_eq!(scan.levels.level(2).unwrap().len(), 2);
        assert_eq!(scan.levels.level(3).unwrap().len(), 1);
        assert_eq!(scan.levels.max_level(), Some(3));

        let subdir = scan.levels.get(3, &root.join("dir1/subdir")).unwrap();
        assert_eq!(subdir.file_count, 2);

        let dir1 = scan.levels.get(2, &root.join("dir1")).unwrap();
        assert_eq!(dir1.file_count, 3);
    }

    #[test]
    fn test_root_must_be_directory() {
        let temp = create_test_tree();
        let config = ScanConfig::new(temp.path().join("file1.txt"));
        let result = LevelWalker::new().scan(&config);
        assert!(matches!(result, Err(ScanError::NotADirectory { .. })));

        let config = ScanConfig::new(temp.path().join("missing"));
        let result = LevelWalker::new().scan(&config);
        assert!(matches!(result, Err(ScanError::NotFound { .. })));
    }

    #[test]
    fn test_progress_final_snapshot() {
        let temp = create_test_tree();
        let walker = LevelWalker::new();
        let mut rx = walker.subscribe();

        walker.scan(&ScanConfig::new(temp.path())).unwrap();

        let mut last = None;
        while let Ok(progress) = rx.try_recv() {
            last = Some(progress);
        }
        let last = last.unwrap();
        assert!(last.finished);
        assert_eq!(last.files_scanned, 5);
        assert_eq!(last.dirs_scanned, 4);
    }
}
