//! External tool invocation
//!
//! Every command runs with an explicit working directory and a timeout; the
//! process-wide current directory is never changed. A command that outlives
//! its timeout is killed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::process::Command;

use crate::error::{BuildError, Result};

/// Captured output of a successful command
#[derive(Debug, Clone, Default)]
pub struct ToolOutput {
    pub stdout: String,
    pub stderr: String,
}

/// One invocation of an external tool on behalf of a chart
#[derive(Debug, Clone)]
pub struct ToolCommand {
    program: PathBuf,
    action: String,
    args: Vec<OsString>,
    cwd: PathBuf,
    timeout: Duration,
    chart: String,
}

impl ToolCommand {
    pub fn new(program: &Path, action: &str, cwd: &Path, timeout: Duration) -> Self {
        Self {
            program: program.to_path_buf(),
            action: action.to_string(),
            args: Vec::new(),
            cwd: cwd.to_path_buf(),
            timeout,
            chart: String::new(),
        }
    }

    /// Chart reported in errors
    pub fn chart(mut self, chart: &str) -> Self {
        self.chart = chart.to_string();
        self
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Short tool name used in messages
    pub fn tool(&self) -> String {
        self.program
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.program.display().to_string())
    }

    /// Run to completion, failing on a non-zero exit with the captured stderr
    pub async fn run(&self) -> Result<ToolOutput> {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.args)
            .current_dir(&self.cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        tracing::debug!(
            tool = %self.tool(),
            action = %self.action,
            chart = %self.chart,
            cwd = %self.cwd.display(),
            "running {:?}",
            self.args
        );

        let start = Instant::now();
        let output = match tokio::time::timeout(self.timeout, cmd.output()).await {
            Ok(result) => result.map_err(|source| BuildError::Spawn {
                chart: self.chart.clone(),
                tool: self.program.display().to_string(),
                source,
            })?,
            Err(_) => {
                return Err(BuildError::Timeout {
                    chart: self.chart.clone(),
                    tool: self.tool(),
                    action: self.action.clone(),
                    timeout: self.timeout,
                });
            }
        };

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
        tracing::debug!(
            tool = %self.tool(),
            action = %self.action,
            elapsed_ms = start.elapsed().as_millis() as u64,
            status = %output.status,
            "finished"
        );

        if !output.status.success() {
            let code = output
                .status
                .code()
                .map(|c| c.to_string())
                .unwrap_or_else(|| "none".to_string());
            // some tools report errors on stdout only
            let diagnostic = if stderr.trim().is_empty() {
                stdout.trim().to_string()
            } else {
                stderr.trim().to_string()
            };
            return Err(BuildError::ToolFailed {
                chart: self.chart.clone(),
                tool: self.tool(),
                action: self.action.clone(),
                code,
                stderr: diagnostic,
            });
        }

        Ok(ToolOutput { stdout, stderr })
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sh(script: &str, cwd: &Path, timeout: Duration) -> ToolCommand {
        ToolCommand::new(Path::new("sh"), "test", cwd, timeout)
            .chart("example")
            .args(["-c", script])
    }

    #[tokio::test]
    async fn test_runs_in_given_directory() {
        let temp = TempDir::new().unwrap();
        let output = sh("pwd", temp.path(), Duration::from_secs(10))
            .run()
            .await
            .unwrap();
        let reported = PathBuf::from(output.stdout.trim()).canonicalize().unwrap();
        assert_eq!(reported, temp.path().canonicalize().unwrap());
    }

    #[tokio::test]
    async fn test_failure_surfaces_stderr() {
        let temp = TempDir::new().unwrap();
        let err = sh("echo broken chart >&2; exit 3", temp.path(), Duration::from_secs(10))
            .run()
            .await
            .unwrap_err();
        match err {
            BuildError::ToolFailed {
                chart, code, stderr, ..
            } => {
                assert_eq!(chart, "example");
                assert_eq!(code, "3");
                assert_eq!(stderr, "broken chart");
            }
            other => panic!("unexpected error {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_timeout() {
        let temp = TempDir::new().unwrap();
        let err = sh("sleep 5", temp.path(), Duration::from_millis(100))
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, BuildError::Timeout { .. }));
    }

    #[tokio::test]
    async fn test_missing_program() {
        let temp = TempDir::new().unwrap();
        let err = ToolCommand::new(
            Path::new("/nonexistent/appgen-tool"),
            "lint",
            temp.path(),
            Duration::from_secs(1),
        )
        .chart("example")
        .run()
        .await
        .unwrap_err();
        assert!(matches!(err, BuildError::Spawn { .. }));
        assert_eq!(err.chart(), Some("example"));
        assert!(err.to_string().contains("for chart example"));
    }
}
