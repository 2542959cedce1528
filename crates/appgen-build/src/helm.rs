//! Helm lint and package steps
//!
//! `helm` is an opaque tool: only its exit status matters, except for the
//! archive name which is recovered from the package step's stdout.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::{BuildError, Result};
use crate::process::ToolCommand;

/// Archive extension searched for in `helm package` output
const ARCHIVE_EXT: &str = "tgz";

#[derive(Debug, Clone)]
pub struct Helm {
    binary: PathBuf,
    timeout: Duration,
}

impl Helm {
    pub fn new(binary: &Path, timeout: Duration) -> Self {
        Self {
            binary: binary.to_path_buf(),
            timeout,
        }
    }

    /// `helm lint <chart_dir>`
    pub async fn lint(&self, chart: &str, chart_dir: &Path) -> Result<String> {
        // helm runs inside the chart dir, relative arguments would not resolve
        let chart_dir = std::path::absolute(chart_dir)?;
        let output = ToolCommand::new(&self.binary, "lint", &chart_dir, self.timeout)
            .chart(chart)
            .arg("lint")
            .arg(&chart_dir)
            .run()
            .await?;
        Ok(output.stdout)
    }

    /// `helm package <chart_dir> --destination=<dest>`
    ///
    /// Returns the path of the produced archive.
    pub async fn package(&self, chart: &str, chart_dir: &Path, dest: &Path) -> Result<PathBuf> {
        let chart_dir = std::path::absolute(chart_dir)?;
        let dest = std::path::absolute(dest)?;
        let mut destination = std::ffi::OsString::from("--destination=");
        destination.push(&dest);

        let output = ToolCommand::new(&self.binary, "package", &chart_dir, self.timeout)
            .chart(chart)
            .arg("package")
            .arg(&chart_dir)
            .arg(destination)
            .run()
            .await?;

        let name = parse_archive_name(&output.stdout).ok_or_else(|| {
            BuildError::ArchiveNameNotFound {
                chart: chart.to_string(),
                stdout: output.stdout.trim().to_string(),
            }
        })?;
        Ok(dest.join(name))
    }
}

/// Archive file name in `helm package` output
///
/// Helm prints `Successfully packaged chart and saved it to: <dir>/<name>.tgz`;
/// the last path segment carrying the archive extension is taken.
pub fn parse_archive_name(stdout: &str) -> Option<String> {
    stdout
        .split(['/', '\\'])
        .filter(|word| word.contains(ARCHIVE_EXT))
        .filter_map(|word| word.split_whitespace().next())
        .last()
        .map(str::to_string)
}
