//! Bundle finalization: checksum file, then the compressed archive

use std::path::PathBuf;

use appgen_core::{ChecksumConfig, ChecksumManifest, OutputLayout};

use crate::error::Result;

/// What finalization produced
#[derive(Debug, Clone)]
pub struct Bundle {
    pub checksum_file: PathBuf,
    pub checksummed: usize,
    pub archive: PathBuf,
    pub archived: usize,
}

/// Hash the output tree, write the checksum file and archive the tree
///
/// On failure the tree is left on disk as is.
pub async fn finalize(layout: &OutputLayout, checksum: &ChecksumConfig) -> Result<Bundle> {
    let root = layout.root.clone();
    let bundle = layout.bundle.clone();
    let checksum = checksum.clone();

    let result = tokio::task::spawn_blocking(move || -> appgen_core::Result<Bundle> {
        let manifest = ChecksumManifest::generate(&root, &checksum)?;
        let checksum_file = manifest.write(&root)?;
        let archived = appgen_core::create_bundle(&root, &bundle)?;
        Ok(Bundle {
            checksum_file,
            checksummed: manifest.entries.len(),
            archive: bundle,
            archived,
        })
    })
    .await??;

    tracing::info!(
        archive = %result.archive.display(),
        files = result.archived,
        "bundle created"
    );
    Ok(result)
}
