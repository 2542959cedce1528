//! Archive creation and extraction
//!
//! Bundles are written with sorted entries and fixed headers so the same
//! tree always produces the same archive.

use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::{Component, Path, PathBuf};
use tar::{Archive, Builder, Header};
use walkdir::WalkDir;

use crate::error::{CoreError, Result};
use crate::layout::FAILED_MARKER;

/// Information about a file in an archive
#[derive(Debug, Clone)]
pub struct ArchiveEntry {
    /// Relative path within the archive
    pub path: String,
    /// File size in bytes
    pub size: u64,
    /// Whether this is a directory
    pub is_dir: bool,
}

/// Archive every file under `root` into a gzip tarball at `output`
///
/// Entry paths are relative to `root`. The failure marker is never archived.
/// Returns the number of files written.
pub fn create_bundle(root: &Path, output: &Path) -> Result<usize> {
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(|e| CoreError::Archive {
            message: format!("cannot walk {}: {}", root.display(), e),
        })?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = entry
            .path()
            .strip_prefix(root)
            .map_err(|e| CoreError::Archive {
                message: e.to_string(),
            })?
            .to_path_buf();
        if rel == Path::new(FAILED_MARKER) {
            continue;
        }
        files.push((entry.path().to_path_buf(), rel));
    }
    files.sort_by(|a, b| a.1.cmp(&b.1));

    if let Some(parent) = output.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = File::create(output)?;
    let encoder = GzEncoder::new(file, Compression::default());
    let mut builder = Builder::new(encoder);

    for (path, rel) in &files {
        let content = std::fs::read(path)?;
        let name = rel
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        add_bytes_to_archive(&mut builder, &name, &content)?;
    }

    let encoder = builder.into_inner()?;
    encoder.finish()?.flush()?;

    tracing::debug!(files = files.len(), archive = %output.display(), "bundle written");
    Ok(files.len())
}

/// Top-level directory of an archive, taken from its first entry
pub fn archive_root(archive_path: &Path) -> Result<String> {
    let file = File::open(archive_path)?;
    let mut archive = Archive::new(GzDecoder::new(file));

    let mut entries = archive.entries()?;
    let first = entries.next().ok_or_else(|| CoreError::Archive {
        message: format!("{} is empty", archive_path.display()),
    })??;
    let path = first.path()?.into_owned();

    path.components()
        .find_map(|c| match c {
            Component::Normal(name) => Some(name.to_string_lossy().into_owned()),
            _ => None,
        })
        .ok_or_else(|| CoreError::Archive {
            message: format!(
                "cannot determine the root folder of {}",
                archive_path.display()
            ),
        })
}

/// Extract an archive to a destination directory
pub fn extract_archive(archive_path: &Path, dest: &Path) -> Result<()> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    std::fs::create_dir_all(dest)?;
    archive.unpack(dest).map_err(|e| CoreError::Archive {
        message: format!("cannot extract {}: {}", archive_path.display(), e),
    })?;

    Ok(())
}

/// Extract an archive unless its root folder already exists in `dest`
///
/// Returns the extracted root directory.
pub fn extract_once(archive_path: &Path, dest: &Path) -> Result<PathBuf> {
    let root = dest.join(archive_root(archive_path)?);
    if root.is_dir() {
        tracing::debug!(root = %root.display(), "archive already extracted");
    } else {
        extract_archive(archive_path, dest)?;
    }
    Ok(root)
}

/// List files in an archive
pub fn list_archive(archive_path: &Path) -> Result<Vec<ArchiveEntry>> {
    let file = File::open(archive_path)?;
    let decoder = GzDecoder::new(file);
    let mut archive = Archive::new(decoder);

    let mut entries = Vec::new();

    for entry in archive.entries()? {
        let entry = entry?;
        let path = entry.path()?.to_string_lossy().to_string();
        let size = entry.header().size()?;
        let is_dir = entry.header().entry_type().is_dir();

        entries.push(ArchiveEntry { path, size, is_dir });
    }

    Ok(entries)
}

fn add_bytes_to_archive<W: Write>(
    builder: &mut Builder<W>,
    archive_path: &str,
    content: &[u8],
) -> Result<()> {
    let mut header = Header::new_gnu();
    header.set_size(content.len() as u64);
    header.set_mode(0o644);
    header.set_mtime(0);
    header.set_cksum();

    builder.append_data(&mut header, archive_path, content)?;

    Ok(())
}
