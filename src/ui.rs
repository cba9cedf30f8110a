#![allow(dead_code)]

use colored::Colorize;
use std::path::Path;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Closing pointers to the summary report and the log directory.
pub fn closing(summary: &Path, log_dir: &Path) {
    println!();
    kv("Summary", &summary.display().to_string());
    kv("Logs", &log_dir.display().to_string());
}
