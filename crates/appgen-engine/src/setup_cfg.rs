//! `setup.cfg` generation for the plugin wheel
//!
//! User sections from `setupFile-config` are written as given; the
//! `[files]`, `[global]`, `[entry_points]` and `[bdist_wheel]` sections are
//! generated, and any non-empty user value for one of their keys wins.

use indexmap::IndexMap;
use std::fmt;

use appgen_core::Application;
use appgen_core::manifest::{GENERATED_METADATA_KEYS, scalar_to_string};

use crate::error::{EngineError, Result};

const RESERVED_SECTIONS: [&str; 4] = ["files", "global", "entry_points", "bdist_wheel"];

/// A value of a setup.cfg option
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    /// `key = value`
    Inline(String),
    /// `key =` followed by tab-indented lines
    Lines(Vec<String>),
}

impl OptionValue {
    fn from_yaml(section: &str, key: &str, value: &serde_yaml::Value) -> Result<Self> {
        let invalid = |message: &str| EngineError::SetupOption {
            section: section.to_string(),
            key: key.to_string(),
            message: message.to_string(),
        };

        match value {
            serde_yaml::Value::Null => Ok(OptionValue::Inline(String::new())),
            serde_yaml::Value::String(s) if s.contains('\n') => Ok(OptionValue::Lines(
                s.lines()
                    .map(str::trim)
                    .filter(|l| !l.is_empty())
                    .map(str::to_string)
                    .collect(),
            )),
            serde_yaml::Value::Sequence(items) => items
                .iter()
                .map(|item| scalar_to_string(item).ok_or_else(|| invalid("list items must be scalars")))
                .collect::<Result<Vec<_>>>()
                .map(OptionValue::Lines),
            other => scalar_to_string(other)
                .map(OptionValue::Inline)
                .ok_or_else(|| invalid("expected a scalar or a list")),
        }
    }
}

/// Ordered sections of a setup.cfg file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SetupCfg {
    sections: IndexMap<String, IndexMap<String, OptionValue>>,
}

impl SetupCfg {
    /// Build the setup.cfg of the application's plugin
    pub fn for_application(app: &Application) -> Result<Self> {
        let mut cfg = SetupCfg::default();

        let metadata = cfg.section("metadata");
        metadata.insert(
            "name".to_string(),
            OptionValue::Inline(format!("k8sapp-{}", app.name)),
        );
        metadata.insert(
            "summary".to_string(),
            OptionValue::Inline(format!("StarlingX sysinv extensions for {}", app.name)),
        );

        let mut overlays = Vec::new();
        for (section, options) in app.setup.sections() {
            if RESERVED_SECTIONS.contains(&section.as_str()) {
                overlays.push((section, options));
                continue;
            }
            for (key, value) in options {
                // a null generated key keeps the generated value; other nulls
                // were rejected while loading the manifest
                if section == "metadata"
                    && value.is_null()
                    && GENERATED_METADATA_KEYS.contains(&key.as_str())
                {
                    continue;
                }
                let value = OptionValue::from_yaml(section, key, value)?;
                cfg.section(section).insert(key.clone(), value);
            }
        }

        cfg.add_generated(app);

        for (section, options) in overlays {
            for (key, value) in options {
                if value.is_null() && cfg.get(section, key).is_some() {
                    continue;
                }
                let value = OptionValue::from_yaml(section, key, value)?;
                cfg.section(section).insert(key.clone(), value);
            }
        }

        Ok(cfg)
    }

    fn add_generated(&mut self, app: &Application) {
        let package = app.plugin_package();
        let underscore = app.name_underscore();
        let camel = app.name_camel();

        self.section("files").insert(
            "packages".to_string(),
            OptionValue::Lines(vec![package.clone()]),
        );
        self.section("global").insert(
            "setup-hooks".to_string(),
            OptionValue::Lines(vec!["pbr.hooks.setup_hook".to_string()]),
        );

        let helm_plugins = app
            .charts
            .iter()
            .enumerate()
            .map(|(index, chart)| {
                format!(
                    "{:03}_{} = {}.helm.{}:{}Helm",
                    index + 1,
                    chart.name,
                    package,
                    chart.module_name(),
                    chart.class_name()
                )
            })
            .collect();

        let entry_points = self.section("entry_points");
        entry_points.insert(
            "systemconfig.helm_applications".to_string(),
            OptionValue::Lines(vec![format!(
                "{} = systemconfig.helm_plugins.{}",
                app.name, underscore
            )]),
        );
        entry_points.insert(
            format!("systemconfig.helm_plugins.{}", underscore),
            OptionValue::Lines(helm_plugins),
        );
        entry_points.insert(
            "systemconfig.fluxcd.kustomize_ops".to_string(),
            OptionValue::Lines(vec![format!(
                "{} = {}.kustomize.kustomize_{}:{}FluxCDKustomizeOperator",
                app.name, package, underscore, camel
            )]),
        );
        entry_points.insert(
            "systemconfig.app_lifecycle".to_string(),
            OptionValue::Lines(vec![format!(
                "{} = {}.lifecycle.lifecycle_{}:{}AppLifecycleOperator",
                app.name, package, underscore, camel
            )]),
        );

        self.section("bdist_wheel")
            .insert("universal".to_string(), OptionValue::Inline("1".to_string()));
    }

    fn section(&mut self, name: &str) -> &mut IndexMap<String, OptionValue> {
        self.sections.entry(name.to_string()).or_default()
    }

    pub fn get(&self, section: &str, key: &str) -> Option<&OptionValue> {
        self.sections.get(section)?.get(key)
    }

    pub fn section_names(&self) -> impl Iterator<Item = &str> {
        self.sections.keys().map(String::as_str)
    }
}

impl fmt::Display for SetupCfg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, (section, options)) in self.sections.iter().enumerate() {
            if index > 0 {
                writeln!(f)?;
            }
            writeln!(f, "[{}]", section)?;
            for (key, value) in options {
                match value {
                    OptionValue::Inline(v) if v.is_empty() => writeln!(f, "{} =", key)?,
                    OptionValue::Inline(v) => writeln!(f, "{} = {}", key, v)?,
                    OptionValue::Lines(lines) => {
                        writeln!(f, "{} =", key)?;
                        for line in lines {
                            writeln!(f, "\t{}", line)?;
                        }
                    }
                }
            }
        }
        Ok(())
    }
}
