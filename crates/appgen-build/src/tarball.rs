//! Tarball sources
//!
//! A tarball path that is not an existing local file is downloaded into the
//! scratch directory as `<base>.tgz`. An archive already present there is
//! reused as is, it is never refreshed. The archive is extracted next to it
//! unless its top-level folder already exists.
//!
//! Scratch locks are keyed by entry name: `<base>.tgz` while downloading,
//! the archive's root folder while extracting.

use std::path::{Path, PathBuf};
use std::time::Duration;

use futures::StreamExt;
use tokio::io::AsyncWriteExt;
use url::Url;

use crate::error::{BuildError, Result};
use crate::scratch::Scratch;

/// Downloads and extracts chart tarballs
#[derive(Debug, Clone)]
pub struct TarballFetcher {
    client: reqwest::Client,
}

impl TarballFetcher {
    /// Client whose requests fail after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("appgen/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(BuildError::HttpClient)?;
        Ok(Self { client })
    }

    /// Make the archive available locally and extract it
    ///
    /// Returns the extracted top-level directory.
    pub async fn fetch(
        &self,
        chart: &str,
        location: &str,
        base_name: &str,
        scratch: &Scratch,
    ) -> Result<PathBuf> {
        let archive = {
            let _download = scratch.lock(&format!("{}.tgz", base_name)).await;
            self.archive_path(chart, location, base_name, scratch).await?
        };

        // different archives may share a root folder, or a git working copy name
        let inspected = archive.clone();
        let root_name = tokio::task::spawn_blocking(move || appgen_core::archive_root(&inspected))
            .await?
            .map_err(|source| BuildError::Chart {
                chart: chart.to_string(),
                source,
            })?;
        let _extract = scratch.lock(&root_name).await;

        let dest = scratch.dir().to_path_buf();
        let root = tokio::task::spawn_blocking(move || appgen_core::extract_once(&archive, &dest))
            .await?
            .map_err(|source| BuildError::Chart {
                chart: chart.to_string(),
                source,
            })?;

        tracing::debug!(chart, root = %root.display(), "tarball extracted");
        Ok(root)
    }

    async fn archive_path(
        &self,
        chart: &str,
        location: &str,
        base_name: &str,
        scratch: &Scratch,
    ) -> Result<PathBuf> {
        let local = Path::new(location);
        if local.is_file() {
            return Ok(local.to_path_buf());
        }

        let cached = scratch.join(format!("{}.tgz", base_name));
        if cached.is_file() {
            tracing::info!(chart, archive = %cached.display(), "using downloaded tarball");
            return Ok(cached);
        }

        let url = Url::parse(location).map_err(|e| BuildError::InvalidUrl {
            chart: chart.to_string(),
            url: location.to_string(),
            reason: e.to_string(),
        })?;
        self.download(chart, url, &cached).await?;
        Ok(cached)
    }

    /// Stream `url` into `dest` through a `.part` file renamed on completion
    async fn download(&self, chart: &str, url: Url, dest: &Path) -> Result<()> {
        tracing::info!(chart, url = %url, "downloading tarball");
        let url_text = url.to_string();

        let response = self
            .client
            .get(url)
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| BuildError::download(chart, &url_text, e))?;

        let partial = dest.with_extension("tgz.part");
        let mut file = tokio::fs::File::create(&partial).await?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| BuildError::download(chart, &url_text, e))?;
            file.write_all(&chunk).await?;
            written += chunk.len() as u64;
        }
        file.flush().await?;
        drop(file);

        tokio::fs::rename(&partial, dest).await?;
        tracing::debug!(chart, bytes = written, dest = %dest.display(), "download complete");
        Ok(())
    }
}
