//! Generate command - render the application tree and package the bundle

use console::style;
use std::path::PathBuf;

use appgen_build::{BuildOptions, CancelToken, ChartPipeline, WheelBuilder, finalize};
use appgen_core::{AppgenConfig, Application, OutputLayout};
use appgen_engine::{TemplateSet, render_flux, render_plugins, write_metadata};

use crate::error::{CliError, Result};
use crate::util::{absolute, format_size, load_config};

/// Options of a generate run
#[derive(Debug, Clone)]
pub struct GenerateArgs {
    pub input: PathBuf,
    pub output: PathBuf,
    pub overwrite: bool,
    pub no_package: bool,
    pub package_only: bool,
    pub wheel: bool,
    pub jobs: Option<usize>,
    pub config: Option<PathBuf>,
}

pub async fn run(args: &GenerateArgs, cancel: CancelToken) -> Result<()> {
    if args.no_package && args.package_only {
        return Err(CliError::usage(
            "--no-package and --package-only cannot be used together",
        ));
    }

    let config = load_config(args.config.as_deref(), args.jobs)?;
    let input = absolute(&args.input)?;
    if !input.is_file() {
        return Err(CliError::validation(format!(
            "input file not found: {}",
            input.display()
        )));
    }

    let app = Application::load(&input)?;
    app.verify_local_charts()?;

    println!(
        "{} {} v{}",
        style("Generating").cyan().bold(),
        app.name,
        app.version
    );

    let layout = OutputLayout::new(&absolute(&args.output)?, &app);
    if args.package_only {
        layout.require_existing()?;
    } else {
        layout.prepare(args.overwrite)?;
    }
    layout.clear_failed()?;

    let result = generate(&app, &layout, &config, args, cancel).await;
    if let Err(err) = &result
        && let Err(e) = layout.mark_failed(&err.to_string())
    {
        tracing::warn!(error = %e, "cannot write failure marker");
    }
    result
}

async fn generate(
    app: &Application,
    layout: &OutputLayout,
    config: &AppgenConfig,
    args: &GenerateArgs,
    cancel: CancelToken,
) -> Result<()> {
    if !args.package_only {
        let templates = match &config.templates_dir {
            Some(dir) => TemplateSet::with_overrides(dir)?,
            None => TemplateSet::embedded(),
        };

        let written = render_flux(app, layout, &templates)?;
        println!(
            "  {} FluxCD manifests ({} files)",
            style("Rendered").green().bold(),
            written.len()
        );

        let written = render_plugins(app, layout, &templates)?;
        println!(
            "  {} plugin {} ({} files)",
            style("Rendered").green().bold(),
            app.plugin_package(),
            written.len()
        );

        write_metadata(app, &config.helm_repo, &layout.metadata)?;
        println!(
            "  {} {}",
            style("Wrote").green().bold(),
            layout.metadata.display()
        );
    }

    if args.no_package {
        println!();
        println!(
            "{} {}",
            style("Application generated at").green(),
            layout.root.display()
        );
        return Ok(());
    }

    let pipeline = ChartPipeline::new(&BuildOptions::from_config(config, app), cancel.clone())?;
    let builds = pipeline.run(&app.charts, &layout.charts).await?;
    for build in &builds {
        println!(
            "  {} {} -> {}",
            style("Packaged").green().bold(),
            build.chart,
            build.archive.display()
        );
    }

    if args.wheel {
        cancel.check()?;
        let wheel = WheelBuilder::new(&config.python, config.command_timeout)
            .build(&app.name, &layout.plugins)
            .await?;
        match wheel {
            Some(path) => println!(
                "  {} {}",
                style("Built").green().bold(),
                path.display()
            ),
            None => tracing::warn!(dir = %layout.plugins.display(), "no wheel produced"),
        }
    }

    cancel.check()?;
    let bundle = finalize(layout, &config.checksum).await?;
    let size = std::fs::metadata(&bundle.archive)?.len();

    println!(
        "  {} {} ({} files)",
        style("Checksums").green().bold(),
        bundle.checksum_file.display(),
        bundle.checksummed
    );
    println!();
    println!(
        "{} {} ({})",
        style("Application bundle created at").green(),
        bundle.archive.display(),
        format_size(size)
    );

    Ok(())
}
