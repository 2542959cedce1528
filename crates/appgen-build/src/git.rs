//! Git sources
//!
//! A repository is cloned into the scratch directory under its derived name
//! the first time it is needed and pulled on every later run.

use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::Result;
use crate::process::ToolCommand;
use crate::scratch::Scratch;

/// Clones and refreshes git working copies
#[derive(Debug, Clone)]
pub struct GitFetcher {
    git: PathBuf,
    timeout: Duration,
}

impl GitFetcher {
    pub fn new(git: &Path, timeout: Duration) -> Self {
        Self {
            git: git.to_path_buf(),
            timeout,
        }
    }

    /// Clone `url` as `<scratch>/<repo_name>`, or pull if already cloned
    ///
    /// Returns the working copy directory.
    pub async fn fetch(
        &self,
        chart: &str,
        url: &str,
        repo_name: &str,
        scratch: &Scratch,
    ) -> Result<PathBuf> {
        let _guard = scratch.lock(repo_name).await;
        let dest = scratch.join(repo_name);

        if dest.join(".git").exists() {
            tracing::info!(chart, repo = repo_name, "updating git repository");
            ToolCommand::new(&self.git, "pull", &dest, self.timeout)
                .chart(chart)
                .arg("pull")
                .run()
                .await?;
        } else {
            tracing::info!(chart, url, "cloning git repository");
            ToolCommand::new(&self.git, "clone", scratch.dir(), self.timeout)
                .chart(chart)
                .arg("clone")
                .arg(url)
                .arg(repo_name)
                .run()
                .await?;
        }

        Ok(dest)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::error::BuildError;
    use std::os::unix::fs::PermissionsExt;
    use tempfile::TempDir;

    /// Fake git recording its arguments and working directory
    fn fake_git(dir: &Path) -> PathBuf {
        let path = dir.join("git");
        let log = dir.join("git.log");
        let script = format!(
            "#!/bin/sh\necho \"$(pwd) $*\" >> {log}\nif [ \"$1\" = clone ]; then mkdir -p \"$3/.git\"; fi\nif [ \"$1\" = pull ] && [ -f fail ]; then echo 'merge conflict' >&2; exit 1; fi\n",
            log = log.display()
        );
        std::fs::write(&path, script).unwrap();
        std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
        path
    }

    fn log(dir: &Path) -> Vec<String> {
        std::fs::read_to_string(dir.join("git.log"))
            .unwrap()
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[tokio::test]
    async fn test_clone_then_pull() {
        let temp = TempDir::new().unwrap();
        let git = fake_git(temp.path());
        let scratch = Scratch::new(&temp.path().join("scratch")).unwrap();
        let fetcher = GitFetcher::new(&git, Duration::from_secs(10));

        let first = fetcher
            .fetch("c", "https://opendev.org/x/repo.git", "repo", &scratch)
            .await
            .unwrap();
        let second = fetcher
            .fetch("c", "https://opendev.org/x/repo.git", "repo", &scratch)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(first, scratch.join("repo"));

        let calls = log(temp.path());
        assert_eq!(calls.len(), 2);
        assert!(calls[0].ends_with("clone https://opendev.org/x/repo.git repo"));
        assert!(calls[1].ends_with("/repo pull"));
    }

    #[tokio::test]
    async fn test_pull_failure_names_chart() {
        let temp = TempDir::new().unwrap();
        let git = fake_git(temp.path());
        let scratch = Scratch::new(&temp.path().join("scratch")).unwrap();
        std::fs::create_dir_all(scratch.join("repo/.git")).unwrap();
        std::fs::write(scratch.join("repo/fail"), "").unwrap();

        let err = GitFetcher::new(&git, Duration::from_secs(10))
            .fetch("my-chart", "https://x/repo.git", "repo", &scratch)
            .await
            .unwrap_err();
        match err {
            BuildError::ToolFailed {
                chart,
                action,
                stderr,
                ..
            } => {
                assert_eq!(chart, "my-chart");
                assert_eq!(action, "pull");
                assert_eq!(stderr, "merge conflict");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }
}
