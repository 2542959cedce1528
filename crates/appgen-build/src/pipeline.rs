//! Chart acquisition and packaging pipeline
//!
//! Each chart goes through: fetch sources (git/tarball), cross-check its
//! Chart.yaml, `helm lint`, `helm package`. Charts are independent, so up to
//! `jobs` of them run at once. The first failure stops new charts from
//! starting; charts already running are allowed to finish.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use appgen_core::{AppgenConfig, Application, Chart, ChartSource};
use futures::StreamExt;

use crate::cancel::CancelToken;
use crate::error::{BuildError, Result};
use crate::git::GitFetcher;
use crate::helm::Helm;
use crate::scratch::Scratch;
use crate::tarball::TarballFetcher;

/// Settings of a pipeline run
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub helm: PathBuf,
    pub git: PathBuf,
    pub scratch_dir: PathBuf,
    pub jobs: usize,
    pub command_timeout: Duration,
    pub network_timeout: Duration,
}

impl BuildOptions {
    pub fn from_config(config: &AppgenConfig, app: &Application) -> Self {
        Self {
            helm: config.helm.clone(),
            git: config.git.clone(),
            scratch_dir: config.scratch_dir_for(&app.name),
            jobs: config.jobs,
            command_timeout: config.command_timeout,
            network_timeout: config.network_timeout,
        }
    }
}

/// A packaged chart
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChartBuild {
    pub chart: String,
    /// Directory that was linted and packaged
    pub source_dir: PathBuf,
    /// Archive written by `helm package`
    pub archive: PathBuf,
}

pub struct ChartPipeline {
    helm: Helm,
    git: GitFetcher,
    tarballs: TarballFetcher,
    scratch: Arc<Scratch>,
    jobs: usize,
    cancel: CancelToken,
}

impl ChartPipeline {
    pub fn new(options: &BuildOptions, cancel: CancelToken) -> Result<Self> {
        Ok(Self {
            helm: Helm::new(&options.helm, options.command_timeout),
            git: GitFetcher::new(&options.git, options.command_timeout),
            tarballs: TarballFetcher::new(options.network_timeout)?,
            scratch: Arc::new(Scratch::new(&options.scratch_dir)?),
            jobs: options.jobs.max(1),
            cancel,
        })
    }

    /// Resolve the chart's source directory, fetching it when needed
    ///
    /// Fetched sources are cross-checked against their Chart.yaml here;
    /// local directories were checked while loading the manifest.
    pub async fn acquire(&self, chart: &Chart) -> Result<PathBuf> {
        let dir = match &chart.source {
            ChartSource::Dir { path } => return Ok(path.clone()),
            ChartSource::Git {
                url,
                repo_name,
                subpath,
            } => {
                let repo = self
                    .git
                    .fetch(&chart.name, url, repo_name, &self.scratch)
                    .await?;
                join_subpath(&repo, subpath)
            }
            ChartSource::Tarball {
                location,
                base_name,
                subpath,
            } => {
                let root = self
                    .tarballs
                    .fetch(&chart.name, location, base_name, &self.scratch)
                    .await?;
                join_subpath(&root, subpath)
            }
        };

        if !dir.is_dir() {
            return Err(BuildError::SourceNotFound {
                chart: chart.name.clone(),
                path: dir,
            });
        }
        appgen_core::verify_chart_dir(chart, &dir).map_err(|source| BuildError::Chart {
            chart: chart.name.clone(),
            source,
        })?;

        Ok(dir)
    }

    /// Fetch, lint and package one chart into `dest`
    pub async fn build_chart(&self, chart: &Chart, dest: &Path) -> Result<ChartBuild> {
        tracing::info!(
            chart = %chart.name,
            kind = %chart.kind(),
            source = chart.source.handle(),
            "processing chart"
        );
        let source_dir = self.acquire(chart).await?;

        let lint = self.helm.lint(&chart.name, &source_dir).await?;
        tracing::debug!(chart = %chart.name, "{}", lint.trim());

        let archive = self.helm.package(&chart.name, &source_dir, dest).await?;
        tracing::info!(chart = %chart.name, archive = %archive.display(), "chart packaged");

        Ok(ChartBuild {
            chart: chart.name.clone(),
            source_dir,
            archive,
        })
    }

    /// Build every chart into `dest`, results in declaration order
    pub async fn run(&self, charts: &[Chart], dest: &Path) -> Result<Vec<ChartBuild>> {
        std::fs::create_dir_all(dest)?;

        // raised by the first failure, separate from the caller's token
        let stop = CancelToken::new();
        let mut results: Vec<Option<ChartBuild>> = vec![None; charts.len()];
        let mut first_error: Option<BuildError> = None;

        let mut builds = futures::stream::iter(charts.iter().enumerate())
            .map(|(index, chart)| {
                let stop = stop.clone();
                async move {
                    if let Err(e) = self.cancel.check().and_then(|_| stop.check()) {
                        return (index, Err(e));
                    }
                    (index, self.build_chart(chart, dest).await)
                }
            })
            .buffer_unordered(self.jobs);

        while let Some((index, result)) = builds.next().await {
            match result {
                Ok(build) => results[index] = Some(build),
                Err(e) => {
                    stop.cancel();
                    // a real failure wins over the cancellations it caused
                    let replace = match &first_error {
                        None => true,
                        Some(BuildError::Cancelled) => !matches!(e, BuildError::Cancelled),
                        Some(_) => false,
                    };
                    if replace {
                        first_error = Some(e);
                    } else {
                        tracing::debug!(chart = %charts[index].name, error = %e, "additional failure");
                    }
                }
            }
        }

        if let Some(e) = first_error {
            return Err(e);
        }
        Ok(results.into_iter().flatten().collect())
    }
}

/// `<root>/<subpath>` without trailing separators
fn join_subpath(root: &Path, subpath: &str) -> PathBuf {
    let trimmed = subpath.trim_end_matches('/');
    if trimmed.is_empty() {
        root.to_path_buf()
    } else {
        root.join(trimmed)
    }
}
