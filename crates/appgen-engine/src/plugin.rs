//! Plugin scaffold
//!
//! ```text
//! plugins/
//!   __init__.py  setup.py  setup.cfg
//!   k8sapp_<app>/
//!     __init__.py
//!     common/{__init__.py,constants.py}
//!     helm/{__init__.py,<chart>.py...}
//!     kustomize/{__init__.py,kustomize_<app>.py}
//!     lifecycle/{__init__.py,lifecycle_<app>.py}
//! ```

use std::path::PathBuf;

use appgen_core::{Application, OutputLayout};

use crate::context::Context;
use crate::error::Result;
use crate::renderer::{RenderAction, RenderStep, execute};
use crate::setup_cfg::SetupCfg;
use crate::templates::{TemplateName, TemplateSet};

/// Ordered steps producing the plugin python sources
pub fn plugin_plan(app: &Application, layout: &OutputLayout) -> Result<Vec<RenderStep>> {
    let underscore = app.name_underscore();
    let mut steps = Vec::new();

    // constants describe the first chart
    let first_chart = app.charts.first().map(|c| c.name.as_str()).unwrap_or_default();
    steps.push(render(
        TemplateName::PluginConstants,
        Context::for_plugin(app, first_chart)?,
        layout.plugin_common.join("constants.py"),
    ));
    steps.push(empty(layout.plugin_common.join("__init__.py")));

    for chart in &app.charts {
        steps.push(render(
            TemplateName::PluginHelm,
            Context::for_plugin(app, &chart.class_name())?,
            layout.plugin_helm.join(format!("{}.py", chart.module_name())),
        ));
    }
    steps.push(empty(layout.plugin_helm.join("__init__.py")));

    steps.push(render(
        TemplateName::PluginKustomize,
        Context::for_plugin(app, &app.name)?,
        layout
            .plugin_kustomize
            .join(format!("kustomize_{}.py", underscore)),
    ));
    steps.push(empty(layout.plugin_kustomize.join("__init__.py")));

    steps.push(render(
        TemplateName::PluginLifecycle,
        Context::for_plugin(app, &app.name)?,
        layout
            .plugin_lifecycle
            .join(format!("lifecycle_{}.py", underscore)),
    ));
    steps.push(empty(layout.plugin_lifecycle.join("__init__.py")));

    steps.push(empty(layout.plugin_package.join("__init__.py")));
    steps.push(RenderStep {
        action: RenderAction::Copy {
            template: TemplateName::SetupPy,
        },
        dest: layout.plugins.join("setup.py"),
    });
    steps.push(empty(layout.plugins.join("__init__.py")));

    Ok(steps)
}

/// Write the plugin scaffold and its setup.cfg
pub fn render_plugins(
    app: &Application,
    layout: &OutputLayout,
    templates: &TemplateSet,
) -> Result<Vec<PathBuf>> {
    let steps = plugin_plan(app, layout)?;
    let mut written = execute(&steps, templates)?;

    let setup_cfg = layout.plugins.join("setup.cfg");
    std::fs::write(&setup_cfg, SetupCfg::for_application(app)?.to_string())?;
    written.push(setup_cfg);

    Ok(written)
}

fn render(template: TemplateName, context: Context, dest: PathBuf) -> RenderStep {
    RenderStep {
        action: RenderAction::Render {
            template,
            context: Box::new(context),
        },
        dest,
    }
}

fn empty(dest: PathBuf) -> RenderStep {
    RenderStep {
        action: RenderAction::Empty,
        dest,
    }
}
