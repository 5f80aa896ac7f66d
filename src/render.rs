//! Plain-text rendering helpers for the CLI.

use humansize::{BINARY, format_size};

use dux_core::ScanNode;

/// Format a byte count in human-readable form.
pub fn human_size(bytes: u64) -> String {
    format_size(bytes, BINARY)
}

/// A `width`-cell bar showing `size` relative to `total`.
pub fn relative_bar(size: u64, total: u64, width: usize) -> String {
    if width == 0 || total == 0 {
        return String::new();
    }
    let ratio = (size as f64 / total as f64).clamp(0.0, 1.0);
    let filled = ((ratio * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Share of `total` as a percentage.
pub fn percent(size: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        size as f64 / total as f64 * 100.0
    }
}

/// Shorten `path` to at most `max_width` characters, keeping its end.
pub fn truncate_path(path: &str, max_width: usize) -> String {
    let len = path.chars().count();
    if len <= max_width {
        return path.to_string();
    }
    if max_width <= 3 {
        return path.chars().skip(len - max_width).collect();
    }
    let tail: String = path.chars().skip(len - (max_width - 3)).collect();
    format!("...{tail}")
}

/// Number of direct entries of a directory; empty for files.
pub fn item_count(node: &ScanNode) -> String {
    if node.is_file() {
        return String::new();
    }
    match node.child_count() {
        1 => "1 item".to_string(),
        n => format!("{n} items"),
    }
}
