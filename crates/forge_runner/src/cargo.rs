//! Cargo subprocess execution.

use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use forge_core::{BuildOutcome, CoreError, CoreResult, ProjectCompiler};

use crate::error::{RunnerError, RunnerResult};

/// Result of a single toolchain invocation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code of the process (-1 when terminated by a signal).
    pub exit_code: i64,
    /// Captured stdout.
    pub stdout: String,
    /// Captured stderr.
    pub stderr: String,
    /// Invocation start time.
    pub started_at: DateTime<Utc>,
    /// Invocation end time.
    pub finished_at: DateTime<Utc>,
    /// Duration in milliseconds.
    pub duration_ms: u64,
}

impl ExecutionResult {
    /// Check if the invocation was successful (exit code 0).
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }

    /// Get combined output (stdout + stderr).
    pub fn combined_output(&self) -> String {
        if self.stdout.is_empty() {
            self.stderr.clone()
        } else if self.stderr.is_empty() {
            self.stdout.clone()
        } else {
            format!("{}\n{}", self.stdout, self.stderr)
        }
    }
}

/// Invokes `cargo build` / `cargo run` in a project directory.
pub struct CargoRunner {
    cargo_path: String,
}

impl Default for CargoRunner {
    fn default() -> Self {
        Self::from_env()
    }
}

impl CargoRunner {
    pub fn new(cargo_path: impl Into<String>) -> Self {
        Self {
            cargo_path: cargo_path.into(),
        }
    }

    /// Create a runner honoring the `CARGO_PATH` override.
    pub fn from_env() -> Self {
        Self::new(std::env::var("CARGO_PATH").unwrap_or_else(|_| "cargo".to_string()))
    }

    /// Execute a cargo subcommand in `project_dir` with captured output.
    pub async fn execute(&self, project_dir: &Path, subcommand: &str) -> RunnerResult<ExecutionResult> {
        let started_at = Utc::now();
        debug!(
            cargo = %self.cargo_path,
            subcommand,
            dir = %project_dir.display(),
            "invoking cargo"
        );

        let output = tokio::process::Command::new(&self.cargo_path)
            .arg(subcommand)
            .current_dir(project_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|e| RunnerError::Spawn {
                command: format!("{} {}", self.cargo_path, subcommand),
                message: e.to_string(),
            })?;

        let finished_at = Utc::now();
        let duration_ms = (finished_at - started_at).num_milliseconds().max(0) as u64;

        Ok(ExecutionResult {
            exit_code: output.status.code().map(i64::from).unwrap_or(-1),
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            started_at,
            finished_at,
            duration_ms,
        })
    }

    fn outcome(result: ExecutionResult) -> BuildOutcome {
        if result.success() {
            // Successful runs report stdout; cargo chatter on stderr is noise.
            BuildOutcome::success(if result.stdout.is_empty() {
                result.stderr
            } else {
                result.stdout
            })
        } else {
            BuildOutcome::failure(result.combined_output())
        }
    }
}

#[async_trait]
impl ProjectCompiler for CargoRunner {
    async fn build(&self, project_dir: &Path) -> CoreResult<BuildOutcome> {
        let result = self
            .execute(project_dir, "build")
            .await
            .map_err(|e| CoreError::Compiler(e.to_string()))?;
        Ok(Self::outcome(result))
    }

    async fn run(&self, project_dir: &Path) -> CoreResult<BuildOutcome> {
        let result = self
            .execute(project_dir, "run")
            .await
            .map_err(|e| CoreError::Compiler(e.to_string()))?;
        Ok(Self::outcome(result))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(exit_code: i64, stdout: &str, stderr: &str) -> ExecutionResult {
        let now = Utc::now();
        ExecutionResult {
            exit_code,
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            started_at: now,
            finished_at: now,
            duration_ms: 0,
        }
    }

    #[test]
    fn test_combined_output_joins_streams() {
        assert_eq!(result(0, "out", "err").combined_output(), "out\nerr");
        assert_eq!(result(0, "out", "").combined_output(), "out");
        assert_eq!(result(0, "", "err").combined_output(), "err");
    }

    #[test]
    fn test_success_is_exit_code_zero() {
        assert!(result(0, "", "").success());
        assert!(!result(101, "", "").success());
    }

    #[test]
    fn test_failure_outcome_carries_full_diagnostic() {
        let outcome = CargoRunner::outcome(result(
            101,
            "",
            "error[E0308]: mismatched types\n --> src/main.rs:3:5",
        ));
        assert!(!outcome.success);
        assert!(outcome.output.contains("error[E0308]"));
    }

    #[test]
    fn test_success_outcome_prefers_stdout() {
        let outcome = CargoRunner::outcome(result(0, "Hello, world!\n", "Compiling demo v0.1.0"));
        assert!(outcome.success);
        assert_eq!(outcome.output, "Hello, world!\n");
    }

    #[tokio::test]
    async fn test_missing_cargo_binary_is_a_spawn_error() {
        let temp = tempfile::tempdir().unwrap();
        let runner = CargoRunner::new("/nonexistent/cargo-binary");
        let result = runner.execute(temp.path(), "build").await;
        assert!(matches!(result, Err(RunnerError::Spawn { .. })));
    }
}
