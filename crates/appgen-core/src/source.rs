//! Chart source classification
//!
//! A chart's `path` attribute decides where its sources come from:
//! - `*.git` - a git remote, cloned into the scratch directory
//! - `*.tar.gz` / `*.tgz` - a tarball, given as a local file or a URL
//! - anything else - a local directory used as-is

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};

/// Tarball extensions recognised in a chart path, longest first
const TARBALL_EXTENSIONS: [&str; 2] = [".tar.gz", ".tgz"];

/// Classification of a chart's origin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Dir,
    Git,
    Tarball,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            SourceKind::Dir => "dir",
            SourceKind::Git => "git",
            SourceKind::Tarball => "tarball",
        };
        f.write_str(s)
    }
}

/// Where a chart's sources live, with the attributes each kind needs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartSource {
    /// Existing local chart directory
    Dir { path: PathBuf },

    /// Git remote; `repo_name` names the working copy in the scratch directory
    Git {
        url: String,
        repo_name: String,
        subpath: String,
    },

    /// Tarball given as a local path or a URL
    Tarball {
        location: String,
        base_name: String,
        subpath: String,
    },
}

impl ChartSource {
    /// Classify a declared chart path
    ///
    /// Relative directory paths are resolved against `base_dir`, which is the
    /// directory holding the application manifest.
    pub fn classify(
        chart: &str,
        path: &str,
        subpath: Option<&str>,
        base_dir: &Path,
    ) -> Result<Self> {
        let trimmed = path.trim();

        if let Some(stem) = trimmed.strip_suffix(".git") {
            let subpath = require_subpath(chart, subpath)?;
            let repo_name = last_segment(stem);
            if repo_name.is_empty() {
                return Err(invalid_path(chart, path));
            }
            return Ok(ChartSource::Git {
                url: trimmed.to_string(),
                repo_name: repo_name.to_string(),
                subpath,
            });
        }

        if let Some(ext) = TARBALL_EXTENSIONS.iter().find(|ext| trimmed.ends_with(*ext)) {
            let subpath = require_subpath(chart, subpath)?;
            let file_name = last_segment(trimmed);
            let base_name = file_name.strip_suffix(ext).unwrap_or(file_name);
            if base_name.is_empty() {
                return Err(invalid_path(chart, path));
            }
            let location = if is_url(trimmed) {
                trimmed.to_string()
            } else {
                resolve(base_dir, trimmed).to_string_lossy().into_owned()
            };
            return Ok(ChartSource::Tarball {
                location,
                base_name: base_name.to_string(),
                subpath,
            });
        }

        let dir = resolve(base_dir, trimmed);
        if trimmed.is_empty() || !dir.is_dir() {
            return Err(invalid_path(chart, path));
        }
        Ok(ChartSource::Dir { path: dir })
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            ChartSource::Dir { .. } => SourceKind::Dir,
            ChartSource::Git { .. } => SourceKind::Git,
            ChartSource::Tarball { .. } => SourceKind::Tarball,
        }
    }

    /// Kind-dependent handle: the git repository name, the tarball base name,
    /// or empty for local directories
    pub fn handle(&self) -> &str {
        match self {
            ChartSource::Dir { .. } => "",
            ChartSource::Git { repo_name, .. } => repo_name,
            ChartSource::Tarball { base_name, .. } => base_name,
        }
    }

    pub fn subpath(&self) -> Option<&str> {
        match self {
            ChartSource::Dir { .. } => None,
            ChartSource::Git { subpath, .. } | ChartSource::Tarball { subpath, .. } => {
                Some(subpath)
            }
        }
    }
}

/// Whether a location should be fetched over the network
pub fn is_url(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

fn require_subpath(chart: &str, subpath: Option<&str>) -> Result<String> {
    match subpath.map(str::trim) {
        Some(s) if !s.is_empty() => Ok(s.to_string()),
        _ => Err(CoreError::MissingChartAttribute {
            chart: chart.to_string(),
            attribute: "subpath",
        }),
    }
}

/// Final segment of a path or URL, also splitting scp-like `host:org/repo`
fn last_segment(s: &str) -> &str {
    s.rsplit(['/', ':']).next().unwrap_or_default()
}

fn resolve(base_dir: &Path, path: &str) -> PathBuf {
    let p = Path::new(path);
    if p.is_absolute() {
        p.to_path_buf()
    } else {
        base_dir.join(p)
    }
}

fn invalid_path(chart: &str, path: &str) -> CoreError {
    CoreError::InvalidChartPath {
        chart: chart.to_string(),
        path: path.to_string(),
    }
}
