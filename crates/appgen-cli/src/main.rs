//! Appgen CLI - StarlingX FluxCD application bundle generator

use clap::{CommandFactory, Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use appgen_build::CancelToken;

mod commands;
mod error;
mod exit_codes;
mod util;

use commands::generate::GenerateArgs;
use error::CliError;

#[derive(Parser)]
#[command(name = "appgen")]
#[command(author = "StarlingX Contributors")]
#[command(version)]
#[command(about = "Generate StarlingX FluxCD application bundles from a declarative manifest", long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Enable debug output
    #[arg(long, global = true)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate the application tree and its bundle
    Generate {
        /// Application manifest
        #[arg(short, long)]
        input: PathBuf,

        /// Folder receiving `<appName>/` and the bundle
        #[arg(short, long, default_value = ".")]
        output: PathBuf,

        /// Replace an existing output folder
        #[arg(long)]
        overwrite: bool,

        /// Render the tree only, skip chart packaging and the bundle
        #[arg(long)]
        no_package: bool,

        /// Package an already generated tree
        #[arg(long)]
        package_only: bool,

        /// Also build the plugin wheel
        #[arg(long)]
        wheel: bool,

        /// Charts processed at the same time
        #[arg(short, long)]
        jobs: Option<usize>,

        /// Configuration file (default: ~/.config/appgen/config.yaml)
        #[arg(long)]
        config: Option<PathBuf>,
    },

    /// Validate a manifest and its local charts
    Validate {
        /// Application manifest
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Verify a generated tree against its checksum file
    Verify {
        /// Generated application folder
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() {
    // Setup miette for nice error display
    miette::set_panic_hook();

    let cli = Cli::parse();
    init_logging(cli.debug);

    let Some(command) = cli.command else {
        // usage only, not an error
        let _ = Cli::command().print_help();
        println!();
        return;
    };

    let result = match command {
        Commands::Generate {
            input,
            output,
            overwrite,
            no_package,
            package_only,
            wheel,
            jobs,
            config,
        } => {
            let args = GenerateArgs {
                input,
                output,
                overwrite,
                no_package,
                package_only,
                wheel,
                jobs,
                config,
            };
            commands::generate::run(&args, interrupt_token()).await
        }

        Commands::Validate { input } => commands::validate::run(&input),

        Commands::Verify { dir } => commands::verify::run(&dir),
    };

    if let Err(err) = result {
        exit_with(err);
    }
}

fn init_logging(debug: bool) {
    let filter = if debug {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Token raised on Ctrl-C; running commands finish, nothing new starts
fn interrupt_token() -> CancelToken {
    let token = CancelToken::new();
    let raised = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            eprintln!("Interrupted, waiting for running commands to finish...");
            raised.cancel();
        }
    });
    token
}

fn exit_with(err: CliError) -> ! {
    let code = err.exit_code();
    eprintln!("{:?}", miette::Report::new(err));
    std::process::exit(code);
}
