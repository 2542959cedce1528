//! Output directory layout
//!
//! Every path of the generated tree is derived here from the output folder
//! and the application, before any generation step runs.

use std::path::{Path, PathBuf};

use crate::error::{CoreError, Result};
use crate::manifest::Application;

/// Marker left in the output directory when a run fails
pub const FAILED_MARKER: &str = ".appgen-failed";

/// File name of the application metadata
pub const METADATA_FILE: &str = "metadata.yaml";

/// Resolved paths of the generated application tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputLayout {
    /// `<out>/<appName>`
    pub root: PathBuf,
    pub charts: PathBuf,
    pub flux: PathBuf,
    pub flux_base: PathBuf,
    pub plugins: PathBuf,
    /// `plugins/k8sapp_<app>`
    pub plugin_package: PathBuf,
    pub plugin_common: PathBuf,
    pub plugin_helm: PathBuf,
    pub plugin_kustomize: PathBuf,
    pub plugin_lifecycle: PathBuf,
    pub metadata: PathBuf,
    /// `<out>/<appName>-<appVersion>.tgz`
    pub bundle: PathBuf,
    chart_names: Vec<String>,
}

impl OutputLayout {
    /// Derive the layout for `app` under the output folder `out`
    pub fn new(out: &Path, app: &Application) -> Self {
        let root = out.join(&app.name);
        let flux = root.join("fluxcd-manifests");
        let plugins = root.join("plugins");
        let plugin_package = plugins.join(app.plugin_package());

        Self {
            charts: root.join("charts"),
            flux_base: flux.join("base"),
            flux,
            plugin_common: plugin_package.join("common"),
            plugin_helm: plugin_package.join("helm"),
            plugin_kustomize: plugin_package.join("kustomize"),
            plugin_lifecycle: plugin_package.join("lifecycle"),
            plugin_package,
            plugins,
            metadata: root.join(METADATA_FILE),
            bundle: out.join(app.bundle_name()),
            chart_names: app.charts.iter().map(|c| c.name.clone()).collect(),
            root,
        }
    }

    /// Flux manifest directory of one chart
    pub fn chart_flux_dir(&self, chart: &str) -> PathBuf {
        self.flux.join(chart)
    }

    pub fn failed_marker(&self) -> PathBuf {
        self.root.join(FAILED_MARKER)
    }

    /// Make room for a fresh tree
    ///
    /// An existing root is removed when `overwrite` is set and is an error
    /// otherwise. Nothing is touched in the error case.
    pub fn prepare(&self, overwrite: bool) -> Result<()> {
        if self.root.exists() {
            if !overwrite {
                return Err(CoreError::OutputExists {
                    path: self.root.clone(),
                });
            }
            tracing::debug!(path = %self.root.display(), "removing existing output");
            std::fs::remove_dir_all(&self.root)?;
        }
        self.create_tree()
    }

    /// Create every directory of the tree
    pub fn create_tree(&self) -> Result<()> {
        let mut dirs = vec![
            &self.charts,
            &self.flux_base,
            &self.plugin_common,
            &self.plugin_helm,
            &self.plugin_kustomize,
            &self.plugin_lifecycle,
        ];
        let chart_dirs: Vec<PathBuf> = self
            .chart_names
            .iter()
            .map(|name| self.chart_flux_dir(name))
            .collect();
        dirs.extend(chart_dirs.iter());

        for dir in dirs {
            std::fs::create_dir_all(dir)?;
        }
        Ok(())
    }

    /// Ensure an existing tree is present (package-only runs)
    pub fn require_existing(&self) -> Result<()> {
        if !self.root.is_dir() {
            return Err(CoreError::OutputMissing {
                path: self.root.clone(),
            });
        }
        std::fs::create_dir_all(&self.charts)?;
        Ok(())
    }

    /// Record a failed run inside the tree
    pub fn mark_failed(&self, message: &str) -> Result<()> {
        if !self.root.is_dir() {
            return Ok(());
        }
        std::fs::write(self.failed_marker(), format!("{}\n", message))?;
        Ok(())
    }

    /// Remove the failure marker of a previous run, if any
    pub fn clear_failed(&self) -> Result<()> {
        match std::fs::remove_file(self.failed_marker()) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn app(temp: &TempDir) -> Application {
        std::fs::create_dir_all(temp.path().join("src/example")).unwrap();
        let content = "appManifestFile-config:\n  appName: my-app\n  appVersion: 1.0-1\n  namespace: demo\n  chart:\n    - name: example\n      version: 0.1.0\n      path: src/example\n";
        Application::parse(content, temp.path()).unwrap()
    }

    #[test]
    fn test_paths() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(Path::new("/out"), &app(&temp));

        assert_eq!(layout.root, PathBuf::from("/out/my-app"));
        assert_eq!(layout.charts, PathBuf::from("/out/my-app/charts"));
        assert_eq!(layout.flux_base, PathBuf::from("/out/my-app/fluxcd-manifests/base"));
        assert_eq!(
            layout.plugin_helm,
            PathBuf::from("/out/my-app/plugins/k8sapp_my_app/helm")
        );
        assert_eq!(layout.bundle, PathBuf::from("/out/my-app-1.0-1.tgz"));
        assert_eq!(
            layout.chart_flux_dir("example"),
            PathBuf::from("/out/my-app/fluxcd-manifests/example")
        );
    }

    #[test]
    fn test_prepare_refuses_existing_output() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(&temp.path().join("out"), &app(&temp));
        std::fs::create_dir_all(&layout.root).unwrap();
        std::fs::write(layout.root.join("keep.txt"), "x").unwrap();

        let err = layout.prepare(false).unwrap_err();
        assert!(matches!(err, CoreError::OutputExists { .. }));
        assert!(layout.root.join("keep.txt").exists());
    }

    #[test]
    fn test_prepare_overwrite_replaces_tree() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(&temp.path().join("out"), &app(&temp));
        std::fs::create_dir_all(&layout.root).unwrap();
        std::fs::write(layout.root.join("stale.txt"), "x").unwrap();

        layout.prepare(true).unwrap();
        assert!(!layout.root.join("stale.txt").exists());
        assert!(layout.chart_flux_dir("example").is_dir());
        assert!(layout.plugin_lifecycle.is_dir());
        assert!(layout.charts.is_dir());
    }

    #[test]
    fn test_failed_marker() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(&temp.path().join("out"), &app(&temp));
        layout.prepare(false).unwrap();

        layout.mark_failed("helm lint failed").unwrap();
        let text = std::fs::read_to_string(layout.failed_marker()).unwrap();
        assert_eq!(text, "helm lint failed\n");

        layout.clear_failed().unwrap();
        assert!(!layout.failed_marker().exists());
        layout.clear_failed().unwrap();
    }

    #[test]
    fn test_require_existing() {
        let temp = TempDir::new().unwrap();
        let layout = OutputLayout::new(&temp.path().join("out"), &app(&temp));
        assert!(matches!(
            layout.require_existing().unwrap_err(),
            CoreError::OutputMissing { .. }
        ));
    }
}
