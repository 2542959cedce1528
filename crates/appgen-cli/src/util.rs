//! Shared utility functions for CLI commands

use std::path::{Path, PathBuf};

use appgen_core::AppgenConfig;

use crate::error::Result;

/// Format a byte size as a human-readable string
#[must_use]
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// Safely truncate a digest to a maximum length
#[must_use]
pub fn truncate_hash(hash: &str, max_len: usize) -> &str {
    let end = hash.len().min(max_len);
    &hash[..end]
}

/// Configuration from `--config`, else the default location, with the
/// `--jobs` flag applied
pub fn load_config(path: Option<&Path>, jobs: Option<usize>) -> Result<AppgenConfig> {
    let mut config = match path {
        Some(path) => AppgenConfig::load_from(path)?,
        None => AppgenConfig::load()?,
    };
    if let Some(jobs) = jobs {
        config.jobs = jobs;
    }
    config.validate()?;
    Ok(config)
}

/// Absolute form of a user-supplied path
pub fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
