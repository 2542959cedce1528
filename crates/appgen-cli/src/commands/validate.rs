//! Validate command - check a manifest without writing anything

use console::style;
use std::path::Path;

use appgen_core::Application;

use crate::error::{CliError, Result};
use crate::util::absolute;

pub fn run(input: &Path) -> Result<()> {
    let input = absolute(input)?;
    if !input.is_file() {
        return Err(CliError::validation(format!(
            "input file not found: {}",
            input.display()
        )));
    }

    println!(
        "{} {}",
        style("Validating").cyan().bold(),
        input.display()
    );

    let app = Application::load(&input)?;
    app.verify_local_charts()?;

    println!(
        "  {} {} v{} (namespace {})",
        style("[OK]").green().bold(),
        app.name,
        app.version,
        app.namespace
    );
    for chart in &app.charts {
        let detail = match chart.source.subpath() {
            Some(subpath) => format!(
                "{} ({} {}, subpath {})",
                chart.path,
                chart.kind(),
                chart.source.handle(),
                subpath
            ),
            None => format!("{} ({})", chart.path, chart.kind()),
        };
        println!(
            "    {} {} {} {}",
            style("-").dim(),
            chart.name,
            chart.version,
            style(detail).dim()
        );
    }
    if app.charts.iter().any(|c| c.source.subpath().is_some()) {
        println!(
            "  {} git and tarball charts are checked against their Chart.yaml once fetched",
            style("[NOTE]").yellow().bold()
        );
    }

    println!();
    println!("{}", style("Validation passed!").green().bold());
    Ok(())
}
