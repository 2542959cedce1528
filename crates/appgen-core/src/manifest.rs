//! Application manifest loading and validation
//!
//! The input file carries three sections:
//! - `appManifestFile-config`: application identity, namespace and charts
//! - `setupFile-config`: plugin `setup.cfg` options
//! - `metadataFile-config`: free-form application metadata
//!
//! Validation is all-or-nothing: every chart is checked and classified
//! before anything touches the filesystem.

use indexmap::IndexMap;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

use crate::chart_meta::verify_chart_dir;
use crate::error::{CoreError, Result};
use crate::source::{ChartSource, SourceKind};

/// Raw manifest file as written by the user
#[derive(Debug, Clone, Deserialize)]
pub struct ManifestFile {
    #[serde(rename = "appManifestFile-config")]
    pub app: AppSection,

    #[serde(rename = "setupFile-config", default)]
    pub setup: SetupOptions,

    #[serde(rename = "metadataFile-config", default)]
    pub metadata: Option<serde_yaml::Value>,
}

/// Application identity and chart list
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppSection {
    #[serde(default)]
    pub app_name: Option<serde_yaml::Value>,

    #[serde(default)]
    pub app_version: Option<serde_yaml::Value>,

    #[serde(default)]
    pub namespace: Option<serde_yaml::Value>,

    #[serde(default)]
    pub chart: Vec<ChartEntry>,

    /// Accepted for compatibility; the chart group is always derived
    #[serde(default)]
    pub chart_group: Option<serde_yaml::Value>,
}

/// One entry of the chart list
#[derive(Debug, Clone, Deserialize)]
pub struct ChartEntry {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub version: Option<serde_yaml::Value>,

    #[serde(default)]
    pub path: Option<String>,

    #[serde(default)]
    pub subpath: Option<String>,
}

/// Plugin setup options, section name to ordered key/value pairs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct SetupOptions(pub IndexMap<String, IndexMap<String, serde_yaml::Value>>);

impl SetupOptions {
    pub fn sections(&self) -> impl Iterator<Item = (&String, &IndexMap<String, serde_yaml::Value>)> {
        self.0.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// A validated chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chart {
    pub name: String,
    pub version: String,
    /// Path as declared in the manifest
    pub path: String,
    pub subpath: Option<String>,
    pub namespace: String,
    pub chart_group: String,
    pub source: ChartSource,
}

impl Chart {
    pub fn kind(&self) -> SourceKind {
        self.source.kind()
    }

    /// Chart name usable as a Python module name
    pub fn module_name(&self) -> String {
        underscored(&self.name)
    }

    /// Chart name in UpperCamelCase, used for plugin class names
    pub fn class_name(&self) -> String {
        upper_camel(&self.name)
    }
}

/// Derived grouping of all charts of the application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartGroup {
    pub name: String,
    /// Member chart names in declaration order
    pub chart_names: Vec<String>,
    pub namespace: String,
}

/// Validated application manifest
#[derive(Debug, Clone)]
pub struct Application {
    pub name: String,
    pub version: String,
    pub namespace: String,
    pub charts: Vec<Chart>,
    pub chart_group: ChartGroup,
    pub setup: SetupOptions,
    pub metadata: Option<serde_yaml::Value>,
}

impl Application {
    /// Load and validate a manifest file
    ///
    /// Relative chart paths are resolved against the manifest's directory.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| CoreError::InvalidManifest {
            message: format!("cannot read {}: {}", path.display(), e),
        })?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new("."));
        Self::parse(&content, base_dir)
    }

    /// Parse and validate manifest content
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let file: ManifestFile = serde_yaml::from_str(content)?;
        Self::from_manifest(file, base_dir)
    }

    /// Validate a raw manifest
    pub fn from_manifest(file: ManifestFile, base_dir: &Path) -> Result<Self> {
        let app = file.app;
        let name = required_scalar(app.app_name.as_ref(), "appName")?;
        let version = required_scalar(app.app_version.as_ref(), "appVersion")?;
        let namespace = required_scalar(app.namespace.as_ref(), "namespace")?;

        if app.chart.is_empty() {
            return Err(CoreError::InvalidManifest {
                message: "the chart list is empty".to_string(),
            });
        }
        if app.chart_group.is_some() {
            tracing::debug!("ignoring declared chartGroup, the chart group is derived");
        }

        let group_name = format!("{}-charts", name);
        let mut seen = HashSet::new();
        let mut charts = Vec::with_capacity(app.chart.len());

        for (index, entry) in app.chart.into_iter().enumerate() {
            let chart_name = match entry.name.as_deref().map(str::trim) {
                Some(n) if !n.is_empty() => n.to_string(),
                _ => {
                    return Err(CoreError::MissingChartAttribute {
                        chart: format!("#{}", index + 1),
                        attribute: "name",
                    });
                }
            };

            if !seen.insert(chart_name.clone()) {
                return Err(CoreError::DuplicateChart { chart: chart_name });
            }

            let path = entry
                .path
                .clone()
                .filter(|p| !p.trim().is_empty())
                .ok_or_else(|| CoreError::MissingChartAttribute {
                    chart: chart_name.clone(),
                    attribute: "path",
                })?;

            let chart_version = entry
                .version
                .as_ref()
                .and_then(scalar_to_string)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| CoreError::MissingChartAttribute {
                    chart: chart_name.clone(),
                    attribute: "version",
                })?;

            let source =
                ChartSource::classify(&chart_name, &path, entry.subpath.as_deref(), base_dir)?;

            charts.push(Chart {
                name: chart_name,
                version: chart_version,
                path,
                subpath: source.subpath().map(str::to_string),
                namespace: namespace.clone(),
                chart_group: group_name.clone(),
                source,
            });
        }

        validate_setup(&file.setup)?;

        let chart_group = ChartGroup {
            name: group_name,
            chart_names: charts.iter().map(|c| c.name.clone()).collect(),
            namespace: namespace.clone(),
        };

        Ok(Self {
            name,
            version,
            namespace,
            charts,
            chart_group,
            setup: file.setup,
            metadata: file.metadata.filter(|m| !m.is_null()),
        })
    }

    /// Cross-check local chart directories against their Chart.yaml
    ///
    /// Git and tarball charts are checked once their sources are fetched.
    pub fn verify_local_charts(&self) -> Result<()> {
        for chart in &self.charts {
            if let ChartSource::Dir { path } = &chart.source {
                verify_chart_dir(chart, path)?;
            }
        }
        Ok(())
    }

    /// Application name with `-` and spaces replaced by `_`
    pub fn name_underscore(&self) -> String {
        underscored(&self.name)
    }

    /// Application name in UpperCamelCase (`my-app` becomes `MyApp`)
    pub fn name_camel(&self) -> String {
        upper_camel(&self.name)
    }

    /// Python package name of the generated plugin
    pub fn plugin_package(&self) -> String {
        format!("k8sapp_{}", self.name_underscore())
    }

    /// File name of the final application bundle
    pub fn bundle_name(&self) -> String {
        format!("{}-{}.tgz", self.name, self.version)
    }
}

/// String form of a YAML scalar
pub fn scalar_to_string(value: &serde_yaml::Value) -> Option<String> {
    match value {
        serde_yaml::Value::String(s) => Some(s.trim().to_string()),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn required_scalar(value: Option<&serde_yaml::Value>, field: &str) -> Result<String> {
    value
        .and_then(scalar_to_string)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| CoreError::MissingField {
            field: format!("appManifestFile-config.{}", field),
        })
}

/// `[metadata]` keys the generator fills in when left empty
pub const GENERATED_METADATA_KEYS: [&str; 2] = ["name", "summary"];

fn validate_setup(setup: &SetupOptions) -> Result<()> {
    if let Some(metadata) = setup.0.get("metadata") {
        for (key, value) in metadata {
            if value.is_null() && !GENERATED_METADATA_KEYS.contains(&key.as_str()) {
                return Err(CoreError::MissingSetupValue {
                    section: "metadata".to_string(),
                    key: key.clone(),
                });
            }
        }
    }
    Ok(())
}

fn underscored(name: &str) -> String {
    name.replace(['-', ' '], "_")
}

fn upper_camel(name: &str) -> String {
    name.split(['-', ' ', '_'])
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
                None => String::new(),
            }
        })
        .collect()
}
