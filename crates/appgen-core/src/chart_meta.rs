//! Helm Chart.yaml metadata and the manifest cross-check
//!
//! Every chart declared in the application manifest must carry the same
//! name and version as its own `Chart.yaml`.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::manifest::{Chart, scalar_to_string};

/// File name of the Helm chart metadata file
pub const CHART_FILE: &str = "Chart.yaml";

/// The subset of Helm's Chart.yaml needed for the cross-check
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HelmChartFile {
    #[serde(default)]
    name: Option<serde_yaml::Value>,

    #[serde(default)]
    version: Option<serde_yaml::Value>,

    #[serde(default)]
    app_version: Option<serde_yaml::Value>,
}

/// Chart metadata loaded from a chart directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub app_version: Option<String>,
    /// Path of the Chart.yaml this was read from
    pub path: PathBuf,
}

impl ChartMetadata {
    /// Load `Chart.yaml` from a chart directory
    pub fn load(chart: &str, dir: &Path) -> Result<Self> {
        let path = dir.join(CHART_FILE);
        if !path.is_file() {
            return Err(CoreError::ChartMetadataNotFound {
                chart: chart.to_string(),
                path,
            });
        }
        let content = std::fs::read_to_string(&path)?;
        Self::parse(&content, path)
    }

    /// Parse Chart.yaml content
    pub fn parse(content: &str, path: PathBuf) -> Result<Self> {
        let file: HelmChartFile = serde_yaml::from_str(content)?;
        Ok(Self {
            name: file.name.as_ref().and_then(scalar_to_string),
            version: file.version.as_ref().and_then(scalar_to_string),
            app_version: file.app_version.as_ref().and_then(scalar_to_string),
            path,
        })
    }

    /// Check that the manifest's declaration of `chart` matches this metadata
    pub fn verify(&self, chart: &Chart) -> Result<()> {
        let fields = [
            ("name", &chart.name, &self.name),
            ("version", &chart.version, &self.version),
        ];

        for (field, declared, found) in fields {
            let found = found
                .as_ref()
                .ok_or_else(|| CoreError::ChartMetadataMissingField {
                    chart: chart.name.clone(),
                    field,
                    path: self.path.clone(),
                })?;

            if declared != found {
                return Err(CoreError::ChartMetadataMismatch {
                    chart: chart.name.clone(),
                    field,
                    manifest: declared.clone(),
                    chart_file: found.clone(),
                    path: self.path.clone(),
                });
            }
        }

        Ok(())
    }
}

/// Load and verify the metadata of a chart whose sources are at `dir`
pub fn verify_chart_dir(chart: &Chart, dir: &Path) -> Result<ChartMetadata> {
    let metadata = ChartMetadata::load(&chart.name, dir)?;
    metadata.verify(chart)?;
    Ok(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::ChartSource;
    use tempfile::TempDir;

    fn chart(name: &str, version: &str, dir: &Path) -> Chart {
        Chart {
            name: name.to_string(),
            version: version.to_string(),
            path: dir.to_string_lossy().into_owned(),
            subpath: None,
            namespace: "demo".to_string(),
            chart_group: "app-charts".to_string(),
            source: ChartSource::Dir {
                path: dir.to_path_buf(),
            },
        }
    }

    fn write_chart_file(dir: &Path, content: &str) {
        std::fs::write(dir.join(CHART_FILE), content).unwrap();
    }

    #[test]
    fn test_matching_metadata() {
        let temp = TempDir::new().unwrap();
        write_chart_file(
            temp.path(),
            "# comment\napiVersion: v2\nname: example\nversion: 0.1.0\nappVersion: \"1.16.0\"\n",
        );

        let metadata = verify_chart_dir(&chart("example", "0.1.0", temp.path()), temp.path())
            .unwrap();
        assert_eq!(metadata.app_version.as_deref(), Some("1.16.0"));
    }

    #[test]
    fn test_version_mismatch() {
        let temp = TempDir::new().unwrap();
        write_chart_file(temp.path(), "apiVersion: v2\nname: example\nversion: 0.2.0\n");

        let err = verify_chart_dir(&chart("example", "0.1.0", temp.path()), temp.path())
            .unwrap_err();
        match err {
            CoreError::ChartMetadataMismatch {
                field,
                manifest,
                chart_file,
                ..
            } => {
                assert_eq!(field, "version");
                assert_eq!(manifest, "0.1.0");
                assert_eq!(chart_file, "0.2.0");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[test]
    fn test_missing_name() {
        let temp = TempDir::new().unwrap();
        write_chart_file(temp.path(), "apiVersion: v2\nversion: 0.1.0\n");

        let err = verify_chart_dir(&chart("example", "0.1.0", temp.path()), temp.path())
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::ChartMetadataMissingField { field: "name", .. }
        ));
    }

    #[test]
    fn test_missing_chart_file() {
        let temp = TempDir::new().unwrap();
        let err = ChartMetadata::load("example", temp.path()).unwrap_err();
        assert!(matches!(err, CoreError::ChartMetadataNotFound { .. }));
        assert!(err.is_validation());
    }

    #[test]
    fn test_numeric_version() {
        let metadata =
            ChartMetadata::parse("name: example\nversion: 1.5\n", PathBuf::from("Chart.yaml"))
                .unwrap();
        assert_eq!(metadata.version.as_deref(), Some("1.5"));
    }
}
