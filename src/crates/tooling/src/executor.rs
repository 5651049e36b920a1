//! Name-dispatched tool execution for the member agent.

use crate::sandbox::SandboxExecutor;
use crate::security::SecurityValidator;
use crate::workspace::WorkspaceTools;
use crate::{Result, ToolingError};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use std::time::Duration;

const SNIPPET_FILE: &str = ".codelead_snippet.py";

/// Executes the fixed tool menu against a workspace.
///
/// Every call is validated before it runs. Errors are ordinary values here;
/// the agent loop converts them into tool-result messages so the model can
/// correct course, and only the caller decides what is fatal.
pub struct ToolExecutor {
    workspace: WorkspaceTools,
    validator: SecurityValidator,
    sandbox: Arc<dyn SandboxExecutor>,
    command_timeout: Duration,
}

impl ToolExecutor {
    /// Create an executor over the given workspace root.
    pub fn new(
        workspace_root: impl Into<std::path::PathBuf>,
        sandbox: Arc<dyn SandboxExecutor>,
        strict_security: bool,
        command_timeout: Duration,
    ) -> Self {
        let root = workspace_root.into();
        Self {
            workspace: WorkspaceTools::new(&root),
            validator: SecurityValidator::new(root, strict_security),
            sandbox,
            command_timeout,
        }
    }

    /// Execute a named tool with JSON arguments, returning the result string
    /// that gets fed back to the model.
    pub async fn execute(&mut self, name: &str, args: &JsonValue) -> Result<String> {
        tracing::debug!(tool = name, "executing tool");
        match name {
            "read_file" => {
                let path = str_arg(args, "path", name)?;
                let resolved = self.validator.validate_path(path)?;
                self.workspace.read_file(path, &resolved)
            }
            "write_file" => {
                let path = str_arg(args, "path", name)?;
                let content = str_arg(args, "content", name)?;
                let review_gate = bool_arg(args, "review_gate").unwrap_or(false);
                let resolved = self.validator.validate_path(path)?;
                self.workspace
                    .write_file(path, &resolved, content, review_gate)
            }
            "edit_file" => {
                let path = str_arg(args, "path", name)?;
                let search = str_arg(args, "search", name)?;
                let replacement = str_arg(args, "replacement", name)?;
                let review_gate = bool_arg(args, "review_gate").unwrap_or(false);
                let resolved = self.validator.validate_path(path)?;
                self.workspace
                    .edit_file(path, &resolved, search, replacement, review_gate)
            }
            "list_files" => {
                let dir = args
                    .get("directory")
                    .and_then(|v| v.as_str())
                    .unwrap_or(".");
                let resolved = self.validator.validate_path(dir)?;
                self.workspace.list_files(&resolved)
            }
            "search_code" => {
                let pattern = str_arg(args, "pattern", name)?;
                self.workspace.search_code(pattern)
            }
            "execute_code" => {
                let code = str_arg(args, "code", name)?;
                self.validator.validate_code(code)?;
                self.run_snippet(code).await
            }
            "run_tests" => {
                let target = args.get("target").and_then(|v| v.as_str());
                self.run_tests(target).await
            }
            other => Err(ToolingError::UnknownTool(other.to_string())),
        }
    }

    /// Files written during this session.
    pub fn changed_files(&self) -> Vec<String> {
        self.workspace.changed_files().to_vec()
    }

    /// Summaries of changes held behind the review gate.
    pub fn staged_summaries(&self) -> Vec<String> {
        self.workspace
            .staged_changes()
            .map(|c| c.summary())
            .collect()
    }

    /// Apply all review-gated changes to disk.
    pub fn apply_staged(&mut self) -> Result<Vec<String>> {
        self.workspace.apply_staged()
    }

    /// Discard all review-gated changes.
    pub fn discard_staged(&mut self) -> usize {
        self.workspace.discard_staged()
    }

    async fn run_snippet(&self, code: &str) -> Result<String> {
        let snippet_path = self.workspace.root().join(SNIPPET_FILE);
        std::fs::write(&snippet_path, code)?;

        let command = vec!["python3".to_string(), SNIPPET_FILE.to_string()];
        self.validator.validate_command(&command)?;

        let outcome = self.sandbox.run(&command, self.command_timeout).await;
        let _ = std::fs::remove_file(&snippet_path);
        Ok(outcome?.summarize())
    }

    async fn run_tests(&self, target: Option<&str>) -> Result<String> {
        let command = if self.workspace.root().join("Cargo.toml").exists() {
            let mut cmd = vec!["cargo".to_string(), "test".to_string()];
            if let Some(t) = target {
                cmd.push(t.to_string());
            }
            cmd
        } else {
            vec![
                "pytest".to_string(),
                target.unwrap_or("tests").to_string(),
            ]
        };

        self.validator.validate_command(&command)?;
        let outcome = self.sandbox.run(&command, self.command_timeout).await?;
        Ok(outcome.summarize())
    }
}

fn str_arg<'a>(args: &'a JsonValue, key: &str, tool: &str) -> Result<&'a str> {
    args.get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| ToolingError::InvalidArguments {
            tool: tool.to_string(),
            reason: format!("missing string argument '{}'", key),
        })
}

fn bool_arg(args: &JsonValue, key: &str) -> Option<bool> {
    args.get(key).and_then(|v| v.as_bool())
}
