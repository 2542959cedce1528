//! Verify command - check a generated tree against its checksum file

use console::style;
use std::path::Path;

use appgen_core::ChecksumManifest;

use crate::error::{CliError, Result};
use crate::util::truncate_hash;

pub fn run(dir: &Path) -> Result<()> {
    if !dir.is_dir() {
        return Err(CliError::validation(format!(
            "output folder not found: {}",
            dir.display()
        )));
    }

    println!("{} {}", style("Verifying").cyan().bold(), dir.display());

    let manifest = ChecksumManifest::load(dir)?;
    let result = manifest.verify(dir)?;

    if result.valid {
        println!(
            "  {} All {} file checksums match ({})",
            style("[OK]").green().bold(),
            manifest.entries.len(),
            manifest.algorithm
        );
        return Ok(());
    }

    println!(
        "  {} Checksum verification failed",
        style("[FAIL]").red().bold()
    );
    for mismatch in &result.mismatched {
        println!(
            "    {} {}: expected {}, got {}",
            style("-").red(),
            mismatch.path,
            truncate_hash(&mismatch.expected, 16),
            truncate_hash(&mismatch.actual, 16)
        );
    }
    for missing in &result.missing {
        println!("    {} {}: missing", style("-").red(), missing);
    }

    Err(CliError::validation(format!(
        "{} file(s) differ from {}",
        result.mismatched.len() + result.missing.len(),
        manifest.algorithm.file_name()
    )))
}
