//! Tool configuration
//!
//! Stored in `~/.config/appgen/config.yaml`. Every field is optional; command
//! line flags take precedence over the file.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::checksum::ChecksumAlgorithm;
use crate::error::{CoreError, Result};

/// Default Helm repository recorded in metadata.yaml
pub const DEFAULT_HELM_REPO: &str = "stx-platform";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AppgenConfig {
    /// Helm binary
    pub helm: PathBuf,

    /// Git binary
    pub git: PathBuf,

    /// Python interpreter used for wheel builds
    pub python: PathBuf,

    /// Cache for clones and downloads, defaults to `<tmp>/appgen/<appName>`
    pub scratch_dir: Option<PathBuf>,

    /// Charts acquired and packaged at the same time
    pub jobs: usize,

    /// Upper bound for a single external command
    #[serde(with = "humantime_serde")]
    pub command_timeout: Duration,

    /// Upper bound for a single download
    #[serde(with = "humantime_serde")]
    pub network_timeout: Duration,

    pub checksum: ChecksumConfig,

    /// Directory overriding the embedded templates
    pub templates_dir: Option<PathBuf>,

    pub helm_repo: String,
}

impl Default for AppgenConfig {
    fn default() -> Self {
        Self {
            helm: PathBuf::from("helm"),
            git: PathBuf::from("git"),
            python: PathBuf::from("python3"),
            scratch_dir: None,
            jobs: 4,
            command_timeout: Duration::from_secs(600),
            network_timeout: Duration::from_secs(300),
            checksum: ChecksumConfig::default(),
            templates_dir: None,
            helm_repo: DEFAULT_HELM_REPO.to_string(),
        }
    }
}

/// Checksum file policy
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChecksumConfig {
    pub algorithm: ChecksumAlgorithm,

    /// File extensions left out of the checksum file, without the dot
    pub exclude_extensions: Vec<String>,
}

impl AppgenConfig {
    /// Load from the default location, falling back to defaults
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    /// Load from a specific file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::InvalidConfig {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let config: Self = serde_yaml::from_str(&content).map_err(|e| CoreError::InvalidConfig {
            message: format!("{}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// `~/.config/appgen/config.yaml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("appgen").join("config.yaml"))
    }

    pub fn validate(&self) -> Result<()> {
        if self.jobs == 0 {
            return Err(CoreError::InvalidConfig {
                message: "jobs must be at least 1".to_string(),
            });
        }
        if self.command_timeout.is_zero() || self.network_timeout.is_zero() {
            return Err(CoreError::InvalidConfig {
                message: "timeouts must be greater than zero".to_string(),
            });
        }
        Ok(())
    }

    /// Scratch directory for an application
    pub fn scratch_dir_for(&self, app_name: &str) -> PathBuf {
        self.scratch_dir
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join("appgen").join(app_name))
    }
}
