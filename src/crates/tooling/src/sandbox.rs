//! Sandboxed command execution.
//!
//! The [`SandboxExecutor`] trait is the isolation boundary: the default
//! [`ProcessSandbox`] runs commands as local subprocesses with a timeout,
//! and stronger isolation backends can implement the same trait.

use crate::{Result, ToolingError};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;
use tokio::process::Command;

/// Outcome of a sandboxed command run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionOutcome {
    /// Captured standard output.
    pub stdout: String,

    /// Captured standard error.
    pub stderr: String,

    /// Process exit code; `None` when killed by a signal or timeout.
    pub exit_code: Option<i32>,

    /// True when the command was killed for exceeding its timeout.
    pub timed_out: bool,
}

impl ExecutionOutcome {
    /// Whether the command completed with a zero exit code.
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }

    /// Render the outcome as a result string for the model.
    pub fn summarize(&self) -> String {
        if self.timed_out {
            return format!("Command timed out.\nstdout:\n{}\nstderr:\n{}", self.stdout, self.stderr);
        }
        format!(
            "exit code: {}\nstdout:\n{}\nstderr:\n{}",
            self.exit_code
                .map(|c| c.to_string())
                .unwrap_or_else(|| "killed".to_string()),
            self.stdout,
            self.stderr
        )
    }
}

/// Executes commands in an isolated environment.
#[async_trait]
pub trait SandboxExecutor: Send + Sync {
    /// Run a command (program + arguments) with the given timeout.
    async fn run(&self, command: &[String], timeout: Duration) -> Result<ExecutionOutcome>;
}

/// Subprocess-backed sandbox: spawns the command in a working directory with
/// a hard timeout, killing the process when the budget expires.
pub struct ProcessSandbox {
    working_dir: PathBuf,
}

impl ProcessSandbox {
    /// Create a sandbox that runs commands inside `working_dir`.
    pub fn new(working_dir: impl Into<PathBuf>) -> Self {
        Self {
            working_dir: working_dir.into(),
        }
    }
}

#[async_trait]
impl SandboxExecutor for ProcessSandbox {
    async fn run(&self, command: &[String], timeout: Duration) -> Result<ExecutionOutcome> {
        let Some(program) = command.first() else {
            return Err(ToolingError::Execution("empty command".to_string()));
        };

        let mut child = Command::new(program)
            .args(&command[1..])
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| ToolingError::Execution(format!("failed to spawn {}: {}", program, e)))?;

        let mut stdout_pipe = child.stdout.take();
        let mut stderr_pipe = child.stderr.take();

        let waited = tokio::time::timeout(timeout, async {
            let mut stdout = String::new();
            let mut stderr = String::new();
            if let Some(pipe) = stdout_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut stdout).await;
            }
            if let Some(pipe) = stderr_pipe.as_mut() {
                let _ = pipe.read_to_string(&mut stderr).await;
            }
            let status = child.wait().await;
            (stdout, stderr, status)
        })
        .await;

        match waited {
            Ok((stdout, stderr, status)) => {
                let status = status
                    .map_err(|e| ToolingError::Execution(format!("wait failed: {}", e)))?;
                Ok(ExecutionOutcome {
                    stdout,
                    stderr,
                    exit_code: status.code(),
                    timed_out: false,
                })
            }
            Err(_) => {
                tracing::warn!(command = %program, "sandboxed command timed out, killing");
                let _ = child.start_kill();
                Ok(ExecutionOutcome {
                    stdout: String::new(),
                    stderr: String::new(),
                    exit_code: None,
                    timed_out: true,
                })
            }
        }
    }
}
