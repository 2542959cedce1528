//! Appgen Build - chart acquisition, packaging and bundle finalization
//!
//! Charts are fetched from their source (local directory, git remote or
//! tarball), linted and packaged with `helm`, several at a time. External
//! tools always run with an explicit working directory and a timeout.
//!
//! # Example
//!
//! ```rust,no_run
//! use appgen_build::{BuildOptions, CancelToken, ChartPipeline};
//! use appgen_core::{AppgenConfig, Application, OutputLayout};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let app = Application::load("app_manifest.yaml".as_ref())?;
//! let config = AppgenConfig::load()?;
//! let layout = OutputLayout::new("out".as_ref(), &app);
//!
//! let pipeline = ChartPipeline::new(&BuildOptions::from_config(&config, &app), CancelToken::new())?;
//! let builds = pipeline.run(&app.charts, &layout.charts).await?;
//! # Ok(())
//! # }
//! ```

pub mod cancel;
pub mod error;
pub mod finalize;
pub mod git;
pub mod helm;
pub mod pipeline;
pub mod process;
pub mod scratch;
pub mod tarball;
pub mod wheel;

pub use cancel::CancelToken;
pub use error::{BuildError, Result};
pub use finalize::{Bundle, finalize};
pub use git::GitFetcher;
pub use helm::{Helm, parse_archive_name};
pub use pipeline::{BuildOptions, ChartBuild, ChartPipeline};
pub use process::{ToolCommand, ToolOutput};
pub use scratch::Scratch;
pub use tarball::TarballFetcher;
pub use wheel::WheelBuilder;
