//! Scratch directory shared by all charts of a run
//!
//! Holds git working copies, downloaded tarballs and their extracted trees.
//! Two charts may write the same entry (same repo, same archive, or two
//! archives sharing a root folder), so writes are serialized per entry name.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::error::Result;

#[derive(Debug)]
pub struct Scratch {
    dir: PathBuf,
    locks: Mutex<HashMap<String, Arc<AsyncMutex<()>>>>,
}

impl Scratch {
    /// Use `dir` as scratch area, creating it if needed
    ///
    /// A relative `dir` is resolved against the current directory, so every
    /// path handed out stays valid whatever working directory a tool runs in.
    pub fn new(dir: &Path) -> Result<Self> {
        let dir = std::path::absolute(dir)?;
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            locks: Mutex::new(HashMap::new()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn join(&self, name: impl AsRef<Path>) -> PathBuf {
        self.dir.join(name)
    }

    /// Exclusive access to one entry of the scratch directory
    ///
    /// `entry` is a file or folder name directly under the scratch dir, so
    /// every writer of the same path contends on the same lock.
    pub async fn lock(&self, entry: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut locks = self.locks.lock().unwrap_or_else(|e| e.into_inner());
            locks
                .entry(entry.to_string())
                .or_insert_with(|| Arc::new(AsyncMutex::new(())))
                .clone()
        };
        lock.lock_owned().await
    }
}
