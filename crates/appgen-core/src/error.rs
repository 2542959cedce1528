//! Core error types

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    // ============ Manifest Validation ============
    #[error("Invalid application manifest: {message}")]
    InvalidManifest { message: String },

    #[error("Missing required field: {field}")]
    MissingField { field: String },

    #[error("Chart attribute '{attribute}' is missing in chart {chart}")]
    MissingChartAttribute {
        chart: String,
        attribute: &'static str,
    },

    #[error(
        "Invalid 'path' in chart {chart}: {path} (only local dir, '.git', '.tar.gz', '.tgz' are supported)"
    )]
    InvalidChartPath { chart: String, path: String },

    #[error("Chart {chart} is declared more than once")]
    DuplicateChart { chart: String },

    #[error("Setup option '{key}' in section [{section}] has no value")]
    MissingSetupValue { section: String, key: String },

    // ============ Chart Metadata ============
    #[error("Chart metadata not found for chart {chart}: {path}")]
    ChartMetadataNotFound { chart: String, path: PathBuf },

    #[error("{field} is present in the application manifest but not in {path} (chart {chart})")]
    ChartMetadataMissingField {
        chart: String,
        field: &'static str,
        path: PathBuf,
    },

    #[error(
        "{field} has different values in the application manifest ({manifest}) and {path} ({chart_file}) for chart {chart}"
    )]
    ChartMetadataMismatch {
        chart: String,
        field: &'static str,
        manifest: String,
        chart_file: String,
        path: PathBuf,
    },

    // ============ Output Tree ============
    #[error("Output folder {path} exists, remove it or use --overwrite")]
    OutputExists { path: PathBuf },

    #[error("Output folder {path} does not exist")]
    OutputMissing { path: PathBuf },

    // ============ Config ============
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    // ============ Archives & Checksums ============
    #[error("Archive error: {message}")]
    Archive { message: String },

    #[error("Invalid checksum file {path}: {message}")]
    InvalidChecksumFile { path: PathBuf, message: String },

    #[error("Failed to parse YAML: {0}")]
    YamlParse(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Whether this error was raised while validating the input,
    /// before anything was written to disk
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            CoreError::InvalidManifest { .. }
                | CoreError::MissingField { .. }
                | CoreError::MissingChartAttribute { .. }
                | CoreError::InvalidChartPath { .. }
                | CoreError::DuplicateChart { .. }
                | CoreError::MissingSetupValue { .. }
                | CoreError::ChartMetadataNotFound { .. }
                | CoreError::ChartMetadataMissingField { .. }
                | CoreError::ChartMetadataMismatch { .. }
                | CoreError::YamlParse(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, CoreError>;
