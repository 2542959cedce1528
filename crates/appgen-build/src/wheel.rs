//! Plugin wheel build
//!
//! Runs `setup.py bdist_wheel` inside the plugins directory and removes the
//! files pbr leaves behind.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::process::ToolCommand;

/// Files and directories produced by pbr next to setup.py
const BUILD_LEFTOVERS: [&str; 3] = ["ChangeLog", "AUTHORS", "build"];

#[derive(Debug, Clone)]
pub struct WheelBuilder {
    python: PathBuf,
    timeout: Duration,
}

impl WheelBuilder {
    pub fn new(python: &Path, timeout: Duration) -> Self {
        Self {
            python: python.to_path_buf(),
            timeout,
        }
    }

    /// Build the wheel into `plugins_dir` and return its path
    pub async fn build(&self, app_name: &str, plugins_dir: &Path) -> Result<Option<PathBuf>> {
        tracing::info!(dir = %plugins_dir.display(), "building plugin wheel");

        let result = ToolCommand::new(&self.python, "bdist_wheel", plugins_dir, self.timeout)
            .chart(app_name)
            .args(["setup.py", "bdist_wheel", "--universal", "-d"])
            .arg(plugins_dir)
            .run()
            .await;
        cleanup(plugins_dir)?;
        result?;

        Ok(find_wheel(plugins_dir)?)
    }
}

/// Remove pbr build leftovers from the plugins directory
pub fn cleanup(plugins_dir: &Path) -> std::io::Result<()> {
    for name in BUILD_LEFTOVERS {
        remove_any(&plugins_dir.join(name))?;
    }
    for entry in std::fs::read_dir(plugins_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "egg-info") {
            remove_any(&path)?;
        }
    }
    Ok(())
}

fn remove_any(path: &Path) -> std::io::Result<()> {
    if path.is_dir() {
        std::fs::remove_dir_all(path)
    } else if path.exists() {
        std::fs::remove_file(path)
    } else {
        Ok(())
    }
}

fn find_wheel(plugins_dir: &Path) -> std::io::Result<Option<PathBuf>> {
    for entry in std::fs::read_dir(plugins_dir)? {
        let path = entry?.path();
        if path.extension().is_some_and(|ext| ext == "whl") {
            return Ok(Some(path));
        }
    }
    Ok(None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_cleanup_keeps_sources() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::write(dir.join("ChangeLog"), "").unwrap();
        std::fs::write(dir.join("AUTHORS"), "").unwrap();
        std::fs::create_dir_all(dir.join("build/lib")).unwrap();
        std::fs::create_dir_all(dir.join("k8sapp_demo.egg-info")).unwrap();
        std::fs::write(dir.join("setup.cfg"), "[metadata]\n").unwrap();
        std::fs::write(dir.join("k8sapp_demo-1.0-py2.py3-none-any.whl"), "").unwrap();

        cleanup(dir).unwrap();

        let mut left: Vec<String> = std::fs::read_dir(dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        left.sort();
        assert_eq!(left, vec!["k8sapp_demo-1.0-py2.py3-none-any.whl", "setup.cfg"]);
        assert!(find_wheel(dir).unwrap().is_some());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_build_with_fake_python() {
        use std::os::unix::fs::PermissionsExt;

        let temp = TempDir::new().unwrap();
        let plugins = temp.path().join("plugins");
        std::fs::create_dir(&plugins).unwrap();
        let python = temp.path().join("python3");
        std::fs::write(
            &python,
            "#!/bin/sh\ntouch \"$5/k8sapp_demo-1.0-py3-none-any.whl\" ChangeLog AUTHORS\nmkdir -p build k8sapp_demo.egg-info\n",
        )
        .unwrap();
        std::fs::set_permissions(&python, std::fs::Permissions::from_mode(0o755)).unwrap();

        let wheel = WheelBuilder::new(&python, Duration::from_secs(10))
            .build("demo", &plugins)
            .await
            .unwrap();
        assert_eq!(wheel, Some(plugins.join("k8sapp_demo-1.0-py3-none-any.whl")));
        assert!(!plugins.join("ChangeLog").exists());
        assert!(!plugins.join("build").exists());
        assert!(!plugins.join("k8sapp_demo.egg-info").exists());
    }
}
