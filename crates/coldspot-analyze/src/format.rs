//! Human-readable rendering of sizes, counts, ratios, and whole reports.

use humansize::{FormatSizeOptions, WINDOWS, format_size as humansize_format};
use indexmap::IndexMap;

use coldspot_core::VALID_SIZE_LABEL;

use crate::rank::{RankEntry, RankReport};

const COUNT_UNITS: [(u64, &str); 4] = [
    (1_000_000_000_000, "T"),
    (1_000_000_000, "B"),
    (1_000_000, "M"),
    (1_000, "K"),
];

/// Format a byte count with binary multiples, two decimals, and
/// upper-case unit labels (`KB`, `MB`, `GB`, ...).
pub fn format_size(bytes: u64) -> String {
    let options = FormatSizeOptions::from(WINDOWS).decimal_zeroes(2);
    let formatted = humansize_format(bytes, options);
    // humansize only spells the kilo unit `kB`.
    match formatted.strip_suffix("kB") {
        Some(value) => format!("{value}KB"),
        None => formatted,
    }
}

/// Format a file count with decimal K/M/B/T suffixes. Counts below 1000 are
/// printed as plain integers.
pub fn format_count(count: u64) -> String {
    for (unit, suffix) in COUNT_UNITS {
        if count >= unit {
            return format!("{:.2} {suffix}", count as f64 / unit as f64);
        }
    }
    count.to_string()
}

/// Format a ratio as a whole percentage.
pub fn format_ratio(ratio: f64) -> String {
    format!("{:.0}%", ratio * 100.0)
}

/// Entry fields rendered as strings, keyed the way the report is published.
pub fn render_entry(entry: &RankEntry) -> IndexMap<String, String> {
    let policy = format!("{}#{}", entry.policy.field, entry.policy.days);
    let mut fields = IndexMap::new();
    fields.insert("Path".to_string(), entry.path.display().to_string());
    fields.insert("Size".to_string(), format_size(entry.size));
    fields.insert(format!("Size#{VALID_SIZE_LABEL}"), format_size(entry.qualifying_size));
    fields.insert(
        format!("{policy}#Size#{VALID_SIZE_LABEL}"),
        format_size(entry.policy_size),
    );
    fields.insert(
        format!("{policy}#SizeRatio#{VALID_SIZE_LABEL}"),
        format_ratio(entry.policy_size_ratio),
    );
    fields.insert("Count".to_string(), format_count(entry.count));
    fields.insert(
        format!("Count#{VALID_SIZE_LABEL}"),
        format_count(entry.qualifying_count),
    );
    fields.insert(
        format!("{policy}#Count#{VALID_SIZE_LABEL}"),
        format_count(entry.policy_count),
    );
    fields.insert(
        format!("{policy}#CountRatio#{VALID_SIZE_LABEL}"),
        format_ratio(entry.policy_count_ratio),
    );
    fields
}

/// Whole report rendered as `level -> slot -> field -> value`.
pub fn render_report(report: &RankReport) -> IndexMap<String, IndexMap<String, IndexMap<String, String>>> {
    report
        .levels
        .iter()
        .map(|(level, slots)| {
            let rendered = slots
                .iter()
                .map(|(slot, entry)| (slot.clone(), render_entry(entry)))
                .collect();
            (level.clone(), rendered)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use coldspot_core::{TieringPolicy, TimeField};
    use std::path::PathBuf;

    #[test]
    fn test_format_count() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_500), "1.50 K");
        assert_eq!(format_count(2_000_000), "2.00 M");
        assert_eq!(format_count(3_250_000_000), "3.25 B");
        assert_eq!(format_count(1_000_000_000_000), "1.00 T");
    }

    #[test]
    fn test_format_ratio() {
        assert_eq!(format_ratio(0.0), "0%");
        assert_eq!(format_ratio(0.5), "50%");
        assert_eq!(format_ratio(1.0), "100%");
    }

    #[test]
    fn test_format_size_units() {
        assert_eq!(format_size(512), "512.00 B");
        assert_eq!(format_size(64 * 1024), "64.00 KB");
        assert_eq!(format_size(100_000), "97.66 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
        assert_eq!(format_size(3 * 1024 * 1024 * 1024), "3.00 GB");
        assert_eq!(format_size(2 * 1024u64.pow(4)), "2.00 TB");
        assert_eq!(format_size(1024u64.pow(5)), "1.00 PB");
    }

    #[test]
    fn test_render_entry_keys() {
        let entry = RankEntry {
            level: 2,
            policy: TieringPolicy::new(14, TimeField::Accessed),
            rank_slot: 0,
            path: PathBuf::from("/data/a"),
            metric: 100_000.0,
            size: 100_100,
            qualifying_size: 100_000,
            policy_size: 100_000,
            policy_size_ratio: 1.0,
            count: 2,
            qualifying_count: 1,
            policy_count: 1,
            policy_count_ratio: 1.0,
        };

        let fields = render_entry(&entry);
        assert_eq!(fields["Path"], "/data/a");
        assert_eq!(fields["Count"], "2");
        assert_eq!(fields["Atime#14#SizeRatio#>=64KB"], "100%");
        assert_eq!(fields["Atime#14#Count#>=64KB"], "1");
        assert!(fields.contains_key("Size#>=64KB"));
        assert_eq!(fields.len(), 9);
    }
}
