//! Shared fixtures for build tests

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use appgen_build::BuildOptions;
use appgen_core::Application;
use flate2::Compression;
use flate2::write::GzEncoder;

/// Stub `helm`: lint fails for charts whose directory contains "broken",
/// package tars the directory and prints helm's success line
pub const STUB_HELM: &str = r#"#!/bin/sh
case "$1" in
  lint)
    case "$2" in
      *broken*) echo "[ERROR] Chart.yaml: chart type is not valid" >&2; exit 1 ;;
    esac
    echo "1 chart(s) linted, 0 chart(s) failed"
    ;;
  package)
    dir="$2"
    dest="${3#--destination=}"
    name=$(sed -n 's/^name: *//p' "$dir/Chart.yaml")
    version=$(sed -n 's/^version: *//p' "$dir/Chart.yaml")
    tar -czf "$dest/$name-$version.tgz" -C "$dir" .
    echo "Successfully packaged chart and saved it to: $dest/$name-$version.tgz"
    ;;
  *)
    exit 2
    ;;
esac
"#;

#[cfg(unix)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    use std::os::unix::fs::PermissionsExt;

    let path = dir.join(name);
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

pub fn write_chart(dir: &Path, name: &str, version: &str) {
    std::fs::create_dir_all(dir.join("templates")).unwrap();
    std::fs::write(
        dir.join("Chart.yaml"),
        format!("apiVersion: v2\nname: {name}\nversion: {version}\n"),
    )
    .unwrap();
    std::fs::write(dir.join("values.yaml"), "replicas: 1\n").unwrap();
}

/// Gzipped tarball with every entry under `root/`
pub fn chart_tarball(root: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    for (path, content) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(content.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(&mut header, format!("{root}/{path}"), content.as_bytes())
            .unwrap();
    }
    builder.into_inner().unwrap().finish().unwrap()
}

pub fn manifest(dir: &Path, charts: &str) -> Application {
    let content = format!(
        "appManifestFile-config:\n  appName: demo-app\n  appVersion: 1.0-1\n  namespace: demo\n  chart:\n{charts}"
    );
    Application::parse(&content, dir).unwrap()
}

pub fn options(dir: &Path, helm: PathBuf, jobs: usize) -> BuildOptions {
    BuildOptions {
        helm,
        git: PathBuf::from("git"),
        scratch_dir: dir.join("scratch"),
        jobs,
        command_timeout: Duration::from_secs(30),
        network_timeout: Duration::from_secs(30),
    }
}
