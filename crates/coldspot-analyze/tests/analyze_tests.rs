use coldspot_analyze::{RankConfig, RankReport, Ranker, SortKey, render_report};
use coldspot_scan::{LevelWalker, ScanConfig, TieringPolicy, parse_policies};
use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tempfile::TempDir;

const DAY: Duration = Duration::from_secs(24 * 60 * 60);
const KIB: u64 = 1024;

fn write_file(path: &Path, size: u64, atime_days: u32, now: SystemTime) {
    let file = File::create(path).unwrap();
    file.set_len(size).unwrap();
    file.set_times(
        FileTimes::new()
            .set_accessed(now - DAY * atime_days)
            .set_modified(now),
    )
    .unwrap();
}

/// Root with sibling directories `A` (one cold file) and `B` (hot files).
fn sibling_tree(b_size: u64, now: SystemTime) -> TempDir {
    let temp = TempDir::new().unwrap();
    fs::create_dir(temp.path().join("A")).unwrap();
    fs::create_dir(temp.path().join("B")).unwrap();
    write_file(&temp.path().join("A/cold.bin"), 80 * KIB, 20, now);
    write_file(&temp.path().join("B/hot.bin"), b_size, 1, now);
    temp
}

fn scan_and_rank(root: &Path, policies: &str, now: SystemTime, config: RankConfig) -> (PathBuf, RankReport) {
    let scan_config = ScanConfig::builder()
        .root(root)
        .dir_levels(2u32)
        .policies(parse_policies(policies).unwrap())
        .reference_time(now)
        .build()
        .unwrap();
    let scan = LevelWalker::new().scan(&scan_config).unwrap();
    let report = Ranker::with_config(config).rank(&scan);
    (scan.root_path, report)
}

#[test]
fn test_cold_size_ranks_sibling_first() {
    let now = SystemTime::now();
    let temp = sibling_tree(70 * KIB, now);
    let config = RankConfig::builder()
        .top_n(1usize)
        .sort_key(SortKey::Size)
        .build()
        .unwrap();

    let (root, report) = scan_and_rank(temp.path(), "14-atime", now, config);
    let policy: TieringPolicy = "14-atime".parse().unwrap();

    let level2 = report.ranking(2, &policy);
    assert_eq!(level2.len(), 1);
    assert_eq!(level2[0].path, root.join("A"));
    assert_eq!(level2[0].rank_slot, 0);
    assert_eq!(level2[0].policy_size, 80 * KIB);
    assert_eq!(level2[0].metric, (80 * KIB) as f64);

    let slots = report.level(2).unwrap();
    assert!(slots.contains_key("Rank#0#Atime#14"));
    assert_eq!(slots.len(), 1);
}

#[test]
fn test_size_metric_is_policy_scoped() {
    let now = SystemTime::now();
    // B holds more bytes overall, but none of them are cold.
    let temp = sibling_tree(500 * KIB, now);
    let config = RankConfig::builder()
        .top_n(2usize)
        .sort_key(SortKey::Size)
        .build()
        .unwrap();

    let (root, report) = scan_and_rank(temp.path(), "14-atime", now, config);
    let policy: TieringPolicy = "14-atime".parse().unwrap();

    let level2 = report.ranking(2, &policy);
    assert_eq!(level2.len(), 2);
    assert_eq!(level2[0].path, root.join("A"));
    assert_eq!(level2[1].path, root.join("B"));
    assert!(level2[1].size > level2[0].size);
    assert_eq!(level2[1].policy_size, 0);
}

#[test]
fn test_each_policy_ranked_separately() {
    let now = SystemTime::now();
    let temp = sibling_tree(70 * KIB, now);
    let config = RankConfig::builder()
        .top_n(2usize)
        .sort_key(SortKey::CountRatio)
        .build()
        .unwrap();

    let (root, report) = scan_and_rank(temp.path(), "14-atime,0-atime", now, config);

    let strict: TieringPolicy = "0-atime".parse().unwrap();
    let everything = report.ranking(2, &strict);
    assert_eq!(everything.len(), 2);
    assert!(everything.iter().all(|e| e.policy_count_ratio == 1.0));
    // Tied on ratio, so path order decides.
    assert_eq!(everything[0].path, root.join("A"));

    let level1 = report.level(1).unwrap();
    assert_eq!(level1.len(), 2);
    assert!(level1.contains_key("Rank#0#Atime#14"));
    assert!(level1.contains_key("Rank#0#Atime#0"));

    let level2 = report.level(2).unwrap();
    let keys: Vec<_> = level2.keys().cloned().collect();
    assert_eq!(
        keys,
        vec![
            "Rank#0#Atime#14",
            "Rank#1#Atime#14",
            "Rank#0#Atime#0",
            "Rank#1#Atime#0"
        ]
    );
}

#[test]
fn test_rendered_report_json() {
    let now = SystemTime::now();
    let temp = sibling_tree(70 * KIB, now);
    let (_, report) = scan_and_rank(temp.path(), "14-atime", now, RankConfig::default());

    let rendered = render_report(&report);
    let json = serde_json::to_value(&rendered).unwrap();

    assert_eq!(json["level-2"]["Rank#0#Atime#14"]["Atime#14#SizeRatio#>=64KB"], "100%");
    assert_eq!(json["level-2"]["Rank#1#Atime#14"]["Atime#14#Count#>=64KB"], "0");
    assert_eq!(json["level-1"]["Rank#0#Atime#14"]["Count"], "2");
}
