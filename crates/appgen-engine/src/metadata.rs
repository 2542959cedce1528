//! Application `metadata.yaml`

use std::path::Path;

use appgen_core::Application;

use crate::error::{EngineError, Result};

const RESERVED_KEYS: [&str; 3] = ["app_name", "app_version", "helm_repo"];

/// Render metadata.yaml: identity keys first, then `metadataFile-config`
pub fn render_metadata(app: &Application, helm_repo: &str) -> Result<String> {
    let mut doc = serde_yaml::Mapping::new();
    doc.insert("app_name".into(), app.name.as_str().into());
    doc.insert("app_version".into(), app.version.as_str().into());
    doc.insert("helm_repo".into(), helm_repo.into());

    match &app.metadata {
        None => {}
        Some(serde_yaml::Value::Mapping(extra)) => {
            for (key, value) in extra {
                if key.as_str().is_some_and(|k| RESERVED_KEYS.contains(&k)) {
                    tracing::warn!(key = ?key, "ignoring reserved key in metadataFile-config");
                    continue;
                }
                doc.insert(key.clone(), value.clone());
            }
        }
        Some(_) => {
            return Err(EngineError::Metadata {
                message: "metadataFile-config must be a mapping".to_string(),
            });
        }
    }

    Ok(serde_yaml::to_string(&doc)?)
}

pub fn write_metadata(app: &Application, helm_repo: &str, dest: &Path) -> Result<()> {
    std::fs::write(dest, render_metadata(app, helm_repo)?)?;
    Ok(())
}
