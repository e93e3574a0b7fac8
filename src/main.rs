//! coldspot - find the directories holding the most cold data.
//!
//! Usage:
//!   coldspot analyze [PATH]     Rank directories by cold data per tiering policy
//!   coldspot generate <PATH>    Write a sample dataset with known coldness
//!   coldspot --help             Show help

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use clap::{Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt};

use coldspot_analyze::{
    RankConfig, RankReport, Ranker, SortKey, format_count, format_ratio, format_size, render_report,
};
use coldspot_core::{ColdnessScan, ConfigError, DEFAULT_DIR_LEVELS, ScanConfig, parse_policies};
use coldspot_scan::{ColdnessDataset, LevelWalker};

#[derive(Parser)]
#[command(
    name = "coldspot",
    version,
    about = "Rank directories by how much cold data they hold",
    long_about = "coldspot scans a directory tree, counts files that are cold under one or \
                  more tiering policies (age thresholds on mtime or atime), and reports the \
                  top directories at each level."
)]
struct Cli {
    /// Append logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scan a directory tree and rank its directories by cold data
    Analyze {
        /// Directory to analyze
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Levels of directories to report
        #[arg(short = 'l', long, default_value_t = DEFAULT_DIR_LEVELS)]
        dir_levels: u32,

        /// Tiering policies as <days>-<mtime|atime>, comma separated (e.g. "14-atime,30-mtime")
        #[arg(short = 'p', long, default_value = "14-atime")]
        tiering_policies: String,

        /// Number of top directories per level and policy
        #[arg(short = 'n', long, default_value_t = 2)]
        top_n: usize,

        /// Metric to rank by, over files >= 64KB: Size, SizeRatio, Count, CountRatio
        #[arg(short, long, default_value = "Size", value_parser = parse_sort_key)]
        sort_key: SortKey,

        /// Worker threads (1 = sequential, 0 = one per CPU)
        #[arg(short, long, default_value_t = 1)]
        threads: usize,

        /// Follow symbolic links
        #[arg(long)]
        follow_symlinks: bool,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,
    },

    /// Create a sample dataset with files of known age
    Generate {
        /// Directory to create (must be missing or empty)
        path: PathBuf,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum OutputFormat {
    #[default]
    Text,
    Json,
}

fn parse_sort_key(s: &str) -> Result<SortKey, ConfigError> {
    s.parse()
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_logging(cli.log_file.as_deref())?;

    match cli.command {
        Command::Analyze {
            path,
            dir_levels,
            tiering_policies,
            top_n,
            sort_key,
            threads,
            follow_symlinks,
            format,
        } => {
            let scan_config = ScanConfig::builder()
                .root(path)
                .dir_levels(dir_levels)
                .policies(parse_policies(&tiering_policies).context("Invalid tiering policies")?)
                .threads(threads)
                .follow_symlinks(follow_symlinks)
                .build()
                .map_err(ConfigError::from)
                .context("Invalid scan configuration")?;
            let rank_config = RankConfig::builder()
                .top_n(top_n)
                .sort_key(sort_key)
                .build()
                .map_err(|e| ConfigError::Builder {
                    message: e.to_string(),
                })
                .context("Invalid ranking configuration")?;
            run_analyze(&scan_config, rank_config, format)?;
        }
        Command::Generate { path } => {
            run_generate(&path)?;
        }
    }

    Ok(())
}

/// Send logs to stderr, or to `log_file` when given. `RUST_LOG` overrides the level.
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Cannot open log file {}", path.display()))?;
            fmt()
                .with_env_filter(env_filter)
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .init();
        }
        None => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
    }

    Ok(())
}

/// Scan, rank, and print.
fn run_analyze(scan_config: &ScanConfig, rank_config: RankConfig, format: OutputFormat) -> Result<()> {
    let scan = LevelWalker::new().scan(scan_config).context("Scan failed")?;
    let report = Ranker::with_config(rank_config).rank(&scan);

    match format {
        OutputFormat::Text => print_text(&scan, &report),
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&render_report(&report))?);
        }
    }

    Ok(())
}

fn print_text(scan: &ColdnessScan, report: &RankReport) {
    println!();
    println!("{}", "─".repeat(78));
    println!(" Data Coldness Report - {}", scan.root_path.display());
    if let Some(root) = scan.root_stats() {
        println!(
            " {} files ({} >= 64KB), {} total, scanned in {:.2}s",
            format_count(root.file_count),
            format_count(root.qualifying_count),
            format_size(root.total_bytes),
            scan.scan_duration.as_secs_f64()
        );
    }
    let policies: Vec<String> = scan.config.policies.iter().map(ToString::to_string).collect();
    println!(
        " Policies: {}   Ranked by: {} (top {})",
        policies.join(", "),
        report.sort_key,
        report.top_n
    );
    println!("{}", "─".repeat(78));

    for (level, slots) in &report.levels {
        println!();
        println!(" {level}");
        for (slot, entry) in slots {
            println!("   {slot:<20} {}", entry.path.display());
            println!(
                "   {:<20} cold {:>11} ({:>4} of {:>11})  files {:>9} ({:>4} of {:>9})",
                "",
                format_size(entry.policy_size),
                format_ratio(entry.policy_size_ratio),
                format_size(entry.qualifying_size),
                format_count(entry.policy_count),
                format_ratio(entry.policy_count_ratio),
                format_count(entry.qualifying_count),
            );
        }
    }

    if scan.has_warnings() {
        println!();
        println!(" {} entries skipped (see log for details)", scan.warnings.len());
    }
    println!();
}

/// Write the sample dataset.
fn run_generate(path: &Path) -> Result<()> {
    let created = ColdnessDataset::new(path)
        .create()
        .context("Failed to create dataset")?;
    eprintln!("Created {} files under {}", created.len(), path.display());
    Ok(())
}
