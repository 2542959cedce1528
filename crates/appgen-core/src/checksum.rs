//! Checksum file for the generated application tree
//!
//! One line per file, sorted by path:
//!
//! ```text
//! 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08 ./charts/example-0.1.0.tgz
//! ```

use md5::Md5;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::config::ChecksumConfig;
use crate::error::{CoreError, Result};
use crate::layout::FAILED_MARKER;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    #[default]
    Sha256,
    Md5,
}

impl ChecksumAlgorithm {
    /// `checksum.sha256` or `checksum.md5`
    pub fn file_name(self) -> &'static str {
        match self {
            ChecksumAlgorithm::Sha256 => "checksum.sha256",
            ChecksumAlgorithm::Md5 => "checksum.md5",
        }
    }

    fn digest_len(self) -> usize {
        match self {
            ChecksumAlgorithm::Sha256 => 64,
            ChecksumAlgorithm::Md5 => 32,
        }
    }

    /// Hex digest of a file, read in chunks
    pub fn hash_file(self, path: &Path) -> Result<String> {
        match self {
            ChecksumAlgorithm::Sha256 => hash_reader::<Sha256>(path),
            ChecksumAlgorithm::Md5 => hash_reader::<Md5>(path),
        }
    }
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumAlgorithm::Sha256 => f.write_str("sha256"),
            ChecksumAlgorithm::Md5 => f.write_str("md5"),
        }
    }
}

/// A file entry in the checksum file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumEntry {
    /// Path relative to the tree root, `/`-separated
    pub path: String,
    pub digest: String,
}

/// Checksums of every file of a tree
#[derive(Debug, Clone)]
pub struct ChecksumManifest {
    pub algorithm: ChecksumAlgorithm,
    /// Sorted by path
    pub entries: Vec<ChecksumEntry>,
}

impl fmt::Display for ChecksumManifest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for entry in &self.entries {
            writeln!(f, "{} ./{}", entry.digest, entry.path)?;
        }
        Ok(())
    }
}

impl ChecksumManifest {
    /// Hash every file under `root`
    ///
    /// The checksum file itself, the failure marker and any file whose
    /// extension is excluded by `config` are skipped.
    pub fn generate(root: &Path, config: &ChecksumConfig) -> Result<Self> {
        let algorithm = config.algorithm;
        let mut files = BTreeMap::new();

        for entry in WalkDir::new(root).follow_links(false) {
            let entry = entry.map_err(|e| std::io::Error::other(e.to_string()))?;
            if !entry.file_type().is_file() {
                continue;
            }

            let rel = relative_path(root, entry.path());
            if !is_hashed(&rel, config) {
                continue;
            }

            files.insert(rel, algorithm.hash_file(entry.path())?);
        }

        Ok(Self {
            algorithm,
            entries: files
                .into_iter()
                .map(|(path, digest)| ChecksumEntry { path, digest })
                .collect(),
        })
    }

    /// Write `checksum.<algo>` into `root` and return its path
    pub fn write(&self, root: &Path) -> Result<PathBuf> {
        let path = root.join(self.algorithm.file_name());
        std::fs::write(&path, self.to_string())?;
        Ok(path)
    }

    /// Parse checksum file content
    pub fn parse(content: &str, algorithm: ChecksumAlgorithm, path: &Path) -> Result<Self> {
        let mut entries = Vec::new();

        for (index, line) in content.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let invalid = |message: String| CoreError::InvalidChecksumFile {
                path: path.to_path_buf(),
                message: format!("line {}: {}", index + 1, message),
            };

            let (digest, file) = line
                .split_once(char::is_whitespace)
                .ok_or_else(|| invalid("expected '<digest> <path>'".to_string()))?;

            if digest.len() != algorithm.digest_len()
                || !digest.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(invalid(format!("not a {} digest: {}", algorithm, digest)));
            }

            let file = file.trim();
            let file = file.strip_prefix("./").unwrap_or(file);
            entries.push(ChecksumEntry {
                path: file.to_string(),
                digest: digest.to_ascii_lowercase(),
            });
        }

        entries.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(Self { algorithm, entries })
    }

    /// Load the checksum file of a tree, whichever algorithm it uses
    pub fn load(root: &Path) -> Result<Self> {
        for algorithm in [ChecksumAlgorithm::Sha256, ChecksumAlgorithm::Md5] {
            let path = root.join(algorithm.file_name());
            if path.is_file() {
                let content = std::fs::read_to_string(&path)?;
                return Self::parse(&content, algorithm, &path);
            }
        }

        Err(CoreError::InvalidChecksumFile {
            path: root.join(ChecksumAlgorithm::default().file_name()),
            message: "no checksum file found".to_string(),
        })
    }

    /// Re-hash the tree and compare against the recorded digests
    pub fn verify(&self, root: &Path) -> Result<VerificationResult> {
        let mut result = VerificationResult::default();

        for entry in &self.entries {
            let path = root.join(&entry.path);
            if !path.is_file() {
                result.missing.push(entry.path.clone());
                continue;
            }

            let actual = self.algorithm.hash_file(&path)?;
            if actual != entry.digest {
                result.mismatched.push(MismatchedFile {
                    path: entry.path.clone(),
                    expected: entry.digest.clone(),
                    actual,
                });
            }
        }

        result.valid = result.mismatched.is_empty() && result.missing.is_empty();
        Ok(result)
    }

    /// Paths listed in the checksum file
    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }
}

/// Result of checking a tree against its checksum file
#[derive(Debug, Clone, Default)]
pub struct VerificationResult {
    pub valid: bool,
    pub mismatched: Vec<MismatchedFile>,
    pub missing: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct MismatchedFile {
    pub path: String,
    pub expected: String,
    pub actual: String,
}

fn is_hashed(rel: &str, config: &ChecksumConfig) -> bool {
    if rel == ChecksumAlgorithm::Sha256.file_name()
        || rel == ChecksumAlgorithm::Md5.file_name()
        || rel == FAILED_MARKER
    {
        return false;
    }

    match Path::new(rel).extension().and_then(|e| e.to_str()) {
        Some(ext) => !config
            .exclude_extensions
            .iter()
            .any(|excluded| excluded.trim_start_matches('.') == ext),
        None => true,
    }
}

fn relative_path(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    rel.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

fn hash_reader<D: Digest>(path: &Path) -> Result<String> {
    let file = std::fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = reader.read(&mut buffer)?;
        if bytes_read == 0 {
            break;
        }
        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        std::fs::create_dir_all(root.join("charts")).unwrap();
        std::fs::create_dir_all(root.join("plugins")).unwrap();
        std::fs::write(root.join("metadata.yaml"), "app_name: demo\n").unwrap();
        std::fs::write(root.join("charts/example-0.1.0.tgz"), b"archive").unwrap();
        std::fs::write(root.join("plugins/setup.py"), "import setuptools\n").unwrap();
        std::fs::write(root.join(FAILED_MARKER), "boom\n").unwrap();
        temp
    }

    #[test]
    fn test_hash_known_content() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("hello.txt");
        std::fs::write(&path, "hello world").unwrap();

        assert_eq!(
            ChecksumAlgorithm::Sha256.hash_file(&path).unwrap(),
            "b94d27b9934d3e08a52e52d7da7dabfac484efe37a5380ee9088f7ace2efcde9"
        );
        assert_eq!(
            ChecksumAlgorithm::Md5.hash_file(&path).unwrap(),
            "5eb63bbbe01eeed093cb22bb8f5acdc3"
        );
    }

    #[test]
    fn test_generate_lists_every_file_once_sorted() {
        let temp = tree();
        let manifest = ChecksumManifest::generate(temp.path(), &ChecksumConfig::default()).unwrap();
        manifest.write(temp.path()).unwrap();

        // a second pass must not pick up the checksum file it just wrote
        let manifest = ChecksumManifest::generate(temp.path(), &ChecksumConfig::default()).unwrap();
        let paths: Vec<&str> = manifest.paths().collect();
        assert_eq!(
            paths,
            vec!["charts/example-0.1.0.tgz", "metadata.yaml", "plugins/setup.py"]
        );

        let text = manifest.to_string();
        assert!(text.lines().all(|l| l.split(' ').nth(1).unwrap().starts_with("./")));
    }

    #[test]
    fn test_excluded_extensions() {
        let temp = tree();
        let config = ChecksumConfig {
            algorithm: ChecksumAlgorithm::Md5,
            exclude_extensions: vec!["py".to_string(), ".cfg".to_string()],
        };
        let manifest = ChecksumManifest::generate(temp.path(), &config).unwrap();
        assert!(manifest.paths().all(|p| !p.ends_with(".py")));
        assert_eq!(manifest.entries.len(), 2);
    }

    #[test]
    fn test_verify_detects_changes() {
        let temp = tree();
        let manifest = ChecksumManifest::generate(temp.path(), &ChecksumConfig::default()).unwrap();
        manifest.write(temp.path()).unwrap();

        let loaded = ChecksumManifest::load(temp.path()).unwrap();
        assert!(loaded.verify(temp.path()).unwrap().valid);

        std::fs::write(temp.path().join("metadata.yaml"), "tampered\n").unwrap();
        std::fs::remove_file(temp.path().join("plugins/setup.py")).unwrap();

        let result = loaded.verify(temp.path()).unwrap();
        assert!(!result.valid);
        assert_eq!(result.mismatched.len(), 1);
        assert_eq!(result.mismatched[0].path, "metadata.yaml");
        assert_eq!(result.missing, vec!["plugins/setup.py"]);
    }

    #[test]
    fn test_parse_rejects_bad_digest() {
        let err = ChecksumManifest::parse(
            "nothex ./a\n",
            ChecksumAlgorithm::Md5,
            Path::new("checksum.md5"),
        )
        .unwrap_err();
        assert!(matches!(err, CoreError::InvalidChecksumFile { .. }));
    }
}
