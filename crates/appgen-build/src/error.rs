//! Error types for chart acquisition and packaging

use std::path::PathBuf;
use std::time::Duration;

use appgen_core::CoreError;
use thiserror::Error;

/// Acquisition, build and finalization errors
#[derive(Debug, Error)]
pub enum BuildError {
    // ============ External Tools ============
    #[error("Failed to start {tool} for chart {chart}: {source}")]
    Spawn {
        chart: String,
        tool: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{tool} {action} failed for chart {chart} (exit code {code}):\n{stderr}")]
    ToolFailed {
        chart: String,
        tool: String,
        action: String,
        code: String,
        stderr: String,
    },

    #[error("{tool} {action} timed out after {}s for chart {chart}", timeout.as_secs())]
    Timeout {
        chart: String,
        tool: String,
        action: String,
        timeout: Duration,
    },

    #[error("Packaged archive name not found in helm output for chart {chart}:\n{stdout}")]
    ArchiveNameNotFound { chart: String, stdout: String },

    // ============ Network ============
    #[error("Failed to create HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),

    #[error("Invalid download URL for chart {chart}: {url} - {reason}")]
    InvalidUrl {
        chart: String,
        url: String,
        reason: String,
    },

    #[error("Download of {url} failed for chart {chart}: {message}")]
    Download {
        chart: String,
        url: String,
        message: String,
    },

    // ============ Sources ============
    #[error("Source folder {path} not found for chart {chart}")]
    SourceNotFound { chart: String, path: PathBuf },

    #[error("Chart {chart}: {source}")]
    Chart {
        chart: String,
        #[source]
        source: CoreError,
    },

    // ============ Run ============
    #[error("Operation cancelled")]
    Cancelled,

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),

    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BuildError {
    /// Chart the error belongs to, if any
    pub fn chart(&self) -> Option<&str> {
        match self {
            BuildError::Spawn { chart, .. }
            | BuildError::ToolFailed { chart, .. }
            | BuildError::Timeout { chart, .. }
            | BuildError::ArchiveNameNotFound { chart, .. }
            | BuildError::InvalidUrl { chart, .. }
            | BuildError::Download { chart, .. }
            | BuildError::SourceNotFound { chart, .. }
            | BuildError::Chart { chart, .. } => Some(chart),
            _ => None,
        }
    }

    /// Whether the error is a chart metadata or manifest problem rather than
    /// a tool or network failure
    pub fn is_validation(&self) -> bool {
        match self {
            BuildError::Chart { source, .. } | BuildError::Core(source) => source.is_validation(),
            _ => false,
        }
    }

    pub(crate) fn download(chart: &str, url: &str, e: reqwest::Error) -> Self {
        let message = if e.is_timeout() {
            "request timed out".to_string()
        } else if let Some(status) = e.status() {
            format!("HTTP {}", status.as_u16())
        } else {
            e.to_string()
        };
        BuildError::Download {
            chart: chart.to_string(),
            url: url.to_string(),
            message,
        }
    }
}

/// Result type for build operations
pub type Result<T> = std::result::Result<T, BuildError>;
