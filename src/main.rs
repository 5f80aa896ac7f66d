//! dux - a concurrent disk usage analyzer.
//!
//! Usage:
//!   dux [PATH]              Scan summary with the largest top-level entries
//!   dux [PATH] --temp       Largest temp files and build artifacts
//!   dux [PATH] --cache      Largest caches
//!   dux [PATH] --dirs       Largest directories
//!   dux [PATH] --files      Largest files
//!   dux [PATH] --json       Full report as JSON
//!   dux --help              Show help

mod logging;
mod render;

use std::collections::HashSet;
use std::io::{IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::thread;

use clap::Parser;
use color_eyre::eyre::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, info};

use dux_analyze::{Insight, InsightBundle, filter_insights, generate_insights};
use dux_core::{
    AppConfig, FileSystem, InsightCategory, NodeKind, OsFileSystem, ScanNode, ScanStats, Snapshot,
    default_config_path, serialize_path, top_nodes,
};
use dux_scan::{ScanProgress, Scanner};

use crate::render::{human_size, item_count, percent, relative_bar, truncate_path};

const BAR_WIDTH: usize = 20;
const PROGRESS_WIDTH: usize = 60;

#[derive(Parser)]
#[command(
    name = "dux",
    version,
    about = "A concurrent disk usage analyzer",
    long_about = "dux scans a directory tree in parallel, reports where the space goes \
                  and points out temp files, caches and build artifacts worth cleaning."
)]
struct Cli {
    /// Path to analyze (defaults to current directory)
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Number of scan workers (0 = one per CPU)
    #[arg(short, long)]
    workers: Option<usize>,

    /// Maximum scan depth (0 = unlimited)
    #[arg(short = 'd', long)]
    max_depth: Option<u32>,

    /// Expand symlinked directories
    #[arg(short = 'L', long)]
    follow_symlinks: bool,

    /// Number of rows in each report
    #[arg(short = 'n', long)]
    top: Option<usize>,

    /// Show the largest temp files and build artifacts
    #[arg(long)]
    temp: bool,

    /// Show the largest caches
    #[arg(long)]
    cache: bool,

    /// Show the largest directories
    #[arg(long)]
    dirs: bool,

    /// Show the largest files
    #[arg(long)]
    files: bool,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,

    /// Config file (defaults to the per-user config)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    save_config: bool,

    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Cli {
    fn focused(&self) -> bool {
        self.temp || self.cache || self.dirs || self.files
    }

    fn config_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }

    /// Config file contents with command-line overrides applied.
    fn effective_config(&self) -> Result<AppConfig> {
        let mut config = match self.config_path() {
            Some(path) if path.exists() => {
                debug!(path = %path.display(), "loading config");
                AppConfig::load(&OsFileSystem::new(), &path)
                    .wrap_err_with(|| format!("Failed to load config {}", path.display()))?
            }
            _ => AppConfig::default(),
        };

        if let Some(workers) = self.workers {
            config.scan_workers = workers;
        }
        if let Some(depth) = self.max_depth {
            config.max_depth = depth;
        }
        if self.follow_symlinks {
            config.follow_symlinks = true;
        }
        if let Some(top) = self.top {
            config.top_count = top;
        }
        Ok(config)
    }
}

/// Serializable report for `--json`.
#[derive(Serialize)]
struct JsonReport<'a> {
    #[serde(serialize_with = "serialize_path")]
    root: &'a Path,
    stats: ScanStats,
    total_size: u64,
    total_disk_usage: u64,
    scan_duration_ms: u128,
    largest_directories: Vec<Entry<'a>>,
    largest_files: Vec<Entry<'a>>,
    insights: &'a InsightBundle,
}

#[derive(Serialize)]
struct Entry<'a> {
    #[serde(serialize_with = "serialize_path")]
    path: &'a Path,
    size_bytes: u64,
    disk_usage: u64,
}

impl<'a> From<&'a ScanNode> for Entry<'a> {
    fn from(node: &'a ScanNode) -> Self {
        Self {
            path: &node.path,
            size_bytes: node.size_bytes,
            disk_usage: node.disk_usage,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    let config = cli.effective_config()?;

    if cli.save_config {
        let path = cli
            .config_path()
            .ok_or_else(|| color_eyre::eyre::eyre!("No config directory available; pass --config"))?;
        config
            .save(&path)
            .wrap_err_with(|| format!("Failed to save config {}", path.display()))?;
        eprintln!("Saved config to {}", path.display());
        return Ok(());
    }

    let path = cli.path.canonicalize().context("Invalid path")?;
    let snapshot = run_scan(&path, &config, !cli.json)?;
    let bundle = generate_insights(&snapshot.root, &config).context("Invalid insight rules")?;

    if cli.json {
        print_json(&snapshot, &bundle, config.top_count)?;
    } else if cli.focused() {
        print_focused(&cli, &snapshot, &bundle, config.top_count);
    } else {
        print_summary(&snapshot, &bundle, config.top_count);
    }

    Ok(())
}

/// Scan `path` and aggregate sizes, drawing a progress line when stderr is
/// a terminal.
fn run_scan(path: &Path, config: &AppConfig, show_progress: bool) -> Result<Snapshot> {
    let fs: Arc<dyn FileSystem> = Arc::new(OsFileSystem::new());
    let scanner = Scanner::new(fs);
    let options = config.scan_options();
    info!(strategy = scanner.strategy(), "scanner ready");

    let progress = (show_progress && std::io::stderr().is_terminal()).then(|| {
        let mut rx = scanner.subscribe();
        thread::spawn(move || {
            loop {
                match rx.blocking_recv() {
                    Ok(update) => {
                        draw_progress(&update);
                        if update.finished {
                            break;
                        }
                    }
                    Err(RecvError::Lagged(_)) => continue,
                    Err(RecvError::Closed) => break,
                }
            }
            eprint!("\r\x1b[2K");
        })
    });

    let result = scanner.scan(path, &options);
    // Closing the channel stops the progress thread if the scan never started.
    drop(scanner);
    if let Some(handle) = progress {
        let _ = handle.join();
    }

    Ok(result.context("Scan failed")?.finalized())
}

fn draw_progress(update: &ScanProgress) {
    let current = update.current_path.to_string_lossy();
    eprint!(
        "\r\x1b[2K{} files, {} dirs  {}",
        update.files,
        update.directories,
        truncate_path(&current, PROGRESS_WIDTH)
    );
    let _ = std::io::stderr().flush();
}

fn print_summary(snapshot: &Snapshot, bundle: &InsightBundle, top: usize) {
    let root = &snapshot.root;
    let total = root.disk_usage;

    println!();
    println!("{}", "─".repeat(70));
    println!(" {} - {}", root.path.display(), human_size(total));
    println!(
        " {} files, {} directories, {} logical",
        snapshot.stats.files,
        snapshot.stats.directories,
        human_size(root.size_bytes)
    );
    println!(" Scanned in {:.2}s", snapshot.scan_duration.as_secs_f64());
    if snapshot.stats.has_errors() {
        println!(" {} entries could not be read", snapshot.stats.access_errors);
    }
    println!("{}", "─".repeat(70));
    println!();

    let entries = root
        .children
        .iter()
        .sorted_by(|a, b| b.disk_usage.cmp(&a.disk_usage).then_with(|| a.name.cmp(&b.name)))
        .collect_vec();
    for child in entries.iter().take(top) {
        let marker = if child.is_dir() { "/" } else { "" };
        println!(
            " {:<36} {:>10} {:>5.1}% {} {}",
            truncate_path(&format!("{}{}", child.name, marker), 36),
            human_size(child.disk_usage),
            percent(child.disk_usage, total),
            relative_bar(child.disk_usage, total, BAR_WIDTH),
            item_count(child)
        );
    }
    if entries.len() > top {
        println!("   ... and {} more", entries.len() - top);
    }

    if !bundle.is_empty() {
        println!();
        println!(" Reclaimable candidates:");
        for (category, found) in &bundle.by_category {
            let usage: u64 = found.iter().map(|i| i.disk_usage).sum();
            println!(
                "   {:<16} {:>6} found {:>10}",
                category.as_ref(),
                found.len(),
                human_size(usage)
            );
        }
    }
    println!();
}

fn print_focused(cli: &Cli, snapshot: &Snapshot, bundle: &InsightBundle, top: usize) {
    let total = snapshot.root.disk_usage;

    if cli.temp {
        let wanted = HashSet::from([InsightCategory::Temp, InsightCategory::BuildArtifact]);
        let found = filter_insights(bundle, &wanted)
            .into_iter()
            .sorted_by(|a, b| b.disk_usage.cmp(&a.disk_usage))
            .collect_vec();
        print_insights("Temp files and build artifacts", &found, total, top);
    }
    if cli.cache {
        let wanted = HashSet::from([InsightCategory::Cache]);
        print_insights("Caches", &filter_insights(bundle, &wanted), total, top);
    }
    if cli.dirs {
        let nodes = top_nodes(&snapshot.root, top, Some(NodeKind::Directory));
        print_nodes("Largest directories", &nodes, total);
    }
    if cli.files {
        let nodes = top_nodes(&snapshot.root, top, Some(NodeKind::File));
        print_nodes("Largest files", &nodes, total);
    }
}

fn print_insights(title: &str, insights: &[&Insight], total: u64, top: usize) {
    println!();
    println!(" {title}");
    println!("{}", "─".repeat(70));
    if insights.is_empty() {
        println!(" Nothing found.");
        return;
    }
    for insight in insights.iter().take(top) {
        println!(
            " {:>10} {} {:<4} {}  [{}: {}]",
            human_size(insight.disk_usage),
            relative_bar(insight.disk_usage, total, BAR_WIDTH),
            insight.kind.label(),
            insight.path.display(),
            insight.category,
            insight.summary
        );
    }
}

fn print_nodes(title: &str, nodes: &[&ScanNode], total: u64) {
    println!();
    println!(" {title}");
    println!("{}", "─".repeat(70));
    if nodes.is_empty() {
        println!(" Nothing found.");
        return;
    }
    for node in nodes {
        println!(
            " {:>10} {} {:<4} {}",
            human_size(node.disk_usage),
            relative_bar(node.disk_usage, total, BAR_WIDTH),
            node.kind.label(),
            node.path.display()
        );
    }
}

fn print_json(snapshot: &Snapshot, bundle: &InsightBundle, top: usize) -> Result<()> {
    let report = JsonReport {
        root: &snapshot.root.path,
        stats: snapshot.stats,
        total_size: snapshot.total_size(),
        total_disk_usage: snapshot.total_disk_usage(),
        scan_duration_ms: snapshot.scan_duration.as_millis(),
        largest_directories: top_nodes(&snapshot.root, top, Some(NodeKind::Directory))
            .into_iter()
            .map(Entry::from)
            .collect(),
        largest_files: top_nodes(&snapshot.root, top, Some(NodeKind::File))
            .into_iter()
            .map(Entry::from)
            .collect(),
        insights: bundle,
    };
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
