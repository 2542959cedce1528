//! FluxCD manifest rendering
//!
//! The manifest tree is produced from a fixed, ordered plan of
//! (template, context, destination) steps.

use std::path::PathBuf;

use appgen_core::{Application, OutputLayout};

use crate::context::Context;
use crate::error::Result;
use crate::templates::{TemplateName, TemplateSet};

/// How one output file is produced
#[derive(Debug, Clone)]
pub enum RenderAction {
    /// Substitute against a context
    Render {
        template: TemplateName,
        context: Box<Context>,
    },
    /// Copy a template verbatim
    Copy { template: TemplateName },
    /// Create an empty file
    Empty,
}

#[derive(Debug, Clone)]
pub struct RenderStep {
    pub action: RenderAction,
    pub dest: PathBuf,
}

/// Ordered steps producing `fluxcd-manifests/`
///
/// Group-level kustomization, base namespace, the two context-free base
/// files, then per chart its helmrelease, kustomization and the two empty
/// override files.
pub fn flux_plan(app: &Application, layout: &OutputLayout) -> Result<Vec<RenderStep>> {
    let mut steps = vec![
        RenderStep {
            action: RenderAction::Render {
                template: TemplateName::FluxKustomization,
                context: Box::new(Context::for_chart_group(&app.chart_group)?),
            },
            dest: layout.flux.join("kustomization.yaml"),
        },
        RenderStep {
            action: RenderAction::Render {
                template: TemplateName::BaseNamespace,
                context: Box::new(Context::for_manifest(app)?),
            },
            dest: layout.flux_base.join("namespace.yaml"),
        },
        RenderStep {
            action: RenderAction::Copy {
                template: TemplateName::BaseKustomization,
            },
            dest: layout.flux_base.join("kustomization.yaml"),
        },
        RenderStep {
            action: RenderAction::Copy {
                template: TemplateName::BaseHelmRepository,
            },
            dest: layout.flux_base.join("helmrepository.yaml"),
        },
    ];

    for chart in &app.charts {
        let dir = layout.chart_flux_dir(&chart.name);
        let context = Context::for_chart(chart)?;

        steps.push(RenderStep {
            action: RenderAction::Render {
                template: TemplateName::HelmRelease,
                context: Box::new(context.clone()),
            },
            dest: dir.join("helmrelease.yaml"),
        });
        steps.push(RenderStep {
            action: RenderAction::Render {
                template: TemplateName::ChartKustomization,
                context: Box::new(context),
            },
            dest: dir.join("kustomization.yaml"),
        });
        steps.push(RenderStep {
            action: RenderAction::Empty,
            dest: dir.join(format!("{}-system-overrides.yaml", chart.name)),
        });
        steps.push(RenderStep {
            action: RenderAction::Empty,
            dest: dir.join(format!("{}-static-overrides.yaml", chart.name)),
        });
    }

    Ok(steps)
}

/// Run steps in order
pub fn execute(steps: &[RenderStep], templates: &TemplateSet) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(steps.len());

    for step in steps {
        if let Some(parent) = step.dest.parent() {
            std::fs::create_dir_all(parent)?;
        }

        match &step.action {
            RenderAction::Render { template, context } => {
                templates.get(*template)?.render_to_file(context, &step.dest)?;
            }
            RenderAction::Copy { template } => {
                templates.get(*template)?.copy_to_file(&step.dest)?;
            }
            RenderAction::Empty => {
                std::fs::File::create(&step.dest)?;
            }
        }

        tracing::debug!(file = %step.dest.display(), "rendered");
        written.push(step.dest.clone());
    }

    Ok(written)
}

/// Render the FluxCD manifest tree
pub fn render_flux(
    app: &Application,
    layout: &OutputLayout,
    templates: &TemplateSet,
) -> Result<Vec<PathBuf>> {
    for problem in templates.check() {
        tracing::warn!(suggestion = ?problem.suggestion, "template: {}", problem);
    }
    let steps = flux_plan(app, layout)?;
    execute(&steps, templates)
}
