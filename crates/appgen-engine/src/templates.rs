//! The fixed template set
//!
//! Templates are embedded in the binary. A directory laid out like
//! `crates/appgen-engine/templates` may override any of them.

use std::collections::HashMap;
use std::path::Path;

use crate::context::{CHART_GROUP_SCHEMA, CHART_SCHEMA, ContextSchema, MANIFEST_SCHEMA, PLUGIN_SCHEMA};
use crate::document::TemplateDocument;
use crate::error::{EngineError, Result, TemplateError};

/// Every template the generator renders
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemplateName {
    FluxKustomization,
    BaseNamespace,
    BaseKustomization,
    BaseHelmRepository,
    HelmRelease,
    ChartKustomization,
    PluginConstants,
    PluginHelm,
    PluginKustomize,
    PluginLifecycle,
    SetupPy,
}

impl TemplateName {
    pub const ALL: [TemplateName; 11] = [
        TemplateName::FluxKustomization,
        TemplateName::BaseNamespace,
        TemplateName::BaseKustomization,
        TemplateName::BaseHelmRepository,
        TemplateName::HelmRelease,
        TemplateName::ChartKustomization,
        TemplateName::PluginConstants,
        TemplateName::PluginHelm,
        TemplateName::PluginKustomize,
        TemplateName::PluginLifecycle,
        TemplateName::SetupPy,
    ];

    /// Path relative to the templates directory
    pub fn path(self) -> &'static str {
        match self {
            TemplateName::FluxKustomization => "flux/kustomization.yaml",
            TemplateName::BaseNamespace => "flux/base/namespace.yaml",
            TemplateName::BaseKustomization => "flux/base/kustomization.yaml",
            TemplateName::BaseHelmRepository => "flux/base/helmrepository.yaml",
            TemplateName::HelmRelease => "flux/chart/helmrelease.yaml",
            TemplateName::ChartKustomization => "flux/chart/kustomization.yaml",
            TemplateName::PluginConstants => "plugins/constants.py",
            TemplateName::PluginHelm => "plugins/helm.py",
            TemplateName::PluginKustomize => "plugins/kustomize.py",
            TemplateName::PluginLifecycle => "plugins/lifecycle.py",
            TemplateName::SetupPy => "plugins/setup.py",
        }
    }

    /// Context the template renders with; `None` for verbatim copies
    pub fn schema(self) -> Option<&'static ContextSchema> {
        match self {
            TemplateName::FluxKustomization => Some(&CHART_GROUP_SCHEMA),
            TemplateName::BaseNamespace => Some(&MANIFEST_SCHEMA),
            TemplateName::BaseKustomization
            | TemplateName::BaseHelmRepository
            | TemplateName::SetupPy => None,
            TemplateName::HelmRelease | TemplateName::ChartKustomization => Some(&CHART_SCHEMA),
            TemplateName::PluginConstants
            | TemplateName::PluginHelm
            | TemplateName::PluginKustomize
            | TemplateName::PluginLifecycle => Some(&PLUGIN_SCHEMA),
        }
    }

    fn embedded(self) -> &'static str {
        match self {
            TemplateName::FluxKustomization => include_str!("../templates/flux/kustomization.yaml"),
            TemplateName::BaseNamespace => include_str!("../templates/flux/base/namespace.yaml"),
            TemplateName::BaseKustomization => {
                include_str!("../templates/flux/base/kustomization.yaml")
            }
            TemplateName::BaseHelmRepository => {
                include_str!("../templates/flux/base/helmrepository.yaml")
            }
            TemplateName::HelmRelease => include_str!("../templates/flux/chart/helmrelease.yaml"),
            TemplateName::ChartKustomization => {
                include_str!("../templates/flux/chart/kustomization.yaml")
            }
            TemplateName::PluginConstants => include_str!("../templates/plugins/constants.py"),
            TemplateName::PluginHelm => include_str!("../templates/plugins/helm.py"),
            TemplateName::PluginKustomize => include_str!("../templates/plugins/kustomize.py"),
            TemplateName::PluginLifecycle => include_str!("../templates/plugins/lifecycle.py"),
            TemplateName::SetupPy => include_str!("../templates/plugins/setup.py"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TemplateSet {
    documents: HashMap<TemplateName, TemplateDocument>,
}

impl TemplateSet {
    /// Templates compiled into the binary
    pub fn embedded() -> Self {
        let documents = TemplateName::ALL
            .iter()
            .map(|&name| (name, TemplateDocument::new(name.path(), name.embedded())))
            .collect();
        Self { documents }
    }

    /// Embedded templates, with any file present under `dir` taking precedence
    pub fn with_overrides(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            return Err(EngineError::TemplateNotFound {
                name: dir.display().to_string(),
            });
        }

        let mut set = Self::embedded();
        for name in TemplateName::ALL {
            let path = dir.join(name.path());
            if path.is_file() {
                tracing::debug!(template = name.path(), path = %path.display(), "using template override");
                set.documents
                    .insert(name, TemplateDocument::load(name.path(), &path)?);
            }
        }
        Ok(set)
    }

    pub fn get(&self, name: TemplateName) -> Result<&TemplateDocument> {
        self.documents
            .get(&name)
            .ok_or_else(|| EngineError::TemplateNotFound {
                name: name.path().to_string(),
            })
    }

    /// Unresolvable tokens across the whole set
    pub fn check(&self) -> Vec<TemplateError> {
        let mut problems = Vec::new();
        for name in TemplateName::ALL {
            if let (Some(schema), Some(doc)) = (name.schema(), self.documents.get(&name)) {
                problems.extend(doc.check(schema));
            }
        }
        problems
    }
}

impl Default for TemplateSet {
    fn default() -> Self {
        Self::embedded()
    }
}
