//! Appgen Core - Core types for the application bundle generator
//!
//! This crate provides the foundational types used throughout appgen:
//! - `Application`: the validated application manifest
//! - `ChartSource`: where a chart's sources come from
//! - `OutputLayout`: the paths of the generated tree
//! - `ChecksumManifest`: the checksum file of the generated tree
//! - `AppgenConfig`: tool configuration

pub mod archive;
pub mod chart_meta;
pub mod checksum;
pub mod config;
pub mod error;
pub mod layout;
pub mod manifest;
pub mod source;

pub use archive::{ArchiveEntry, archive_root, create_bundle, extract_archive, extract_once, list_archive};
pub use chart_meta::{CHART_FILE, ChartMetadata, verify_chart_dir};
pub use checksum::{ChecksumAlgorithm, ChecksumManifest, VerificationResult};
pub use config::{AppgenConfig, ChecksumConfig};
pub use error::{CoreError, Result};
pub use layout::{FAILED_MARKER, METADATA_FILE, OutputLayout};
pub use manifest::{Application, Chart, ChartGroup, SetupOptions};
pub use source::{ChartSource, SourceKind};
