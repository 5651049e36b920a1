//! Workflow configuration.
//!
//! An explicit value object constructed once (in `main` or a test) and
//! passed down; nothing here is global or mutable at a distance. Loadable
//! from a YAML file, with defaults that work against a local Ollama server.

use crate::{OrchestratorError, Result};
use llm::local::OllamaClient;
use llm::remote::ClaudeClient;
use llm::{ChatModel, LocalLlmConfig, RemoteLlmConfig};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Which backend a model role talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelProvider {
    /// Local Ollama server.
    Ollama,
    /// Anthropic Claude API.
    Claude,
}

/// Settings for one model role (lead or member).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelSettings {
    /// Backend to use.
    pub provider: ModelProvider,

    /// Base URL of the backend.
    pub base_url: String,

    /// Model name.
    pub model: String,

    /// Environment variable holding the API key (remote providers only).
    #[serde(default)]
    pub api_key_env: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_model_timeout")]
    pub timeout_secs: u64,
}

impl ModelSettings {
    /// Default lead settings: a local planning/review model.
    pub fn local(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            provider: ModelProvider::Ollama,
            base_url: base_url.into(),
            model: model.into(),
            api_key_env: None,
            timeout_secs: default_model_timeout(),
        }
    }

    /// Build a chat model client from these settings.
    ///
    /// Dispatch happens here, once; everything downstream works through
    /// `Box<dyn ChatModel>`.
    pub fn connect(&self) -> Result<Box<dyn ChatModel>> {
        let timeout = Duration::from_secs(self.timeout_secs);
        match self.provider {
            ModelProvider::Ollama => {
                let config =
                    LocalLlmConfig::new(&self.base_url, &self.model).with_timeout(timeout);
                Ok(Box::new(OllamaClient::new(config)))
            }
            ModelProvider::Claude => {
                let env_var = self.api_key_env.as_deref().unwrap_or("ANTHROPIC_API_KEY");
                let config = RemoteLlmConfig::from_env(env_var, &self.base_url, &self.model)
                    .map_err(OrchestratorError::Capability)?
                    .with_timeout(timeout);
                Ok(Box::new(ClaudeClient::new(config)))
            }
        }
    }
}

/// Top-level configuration for the workflow engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// SQLite connection string, e.g. "sqlite:workflows.db" or "sqlite::memory:".
    #[serde(default = "default_database_url")]
    pub database_url: String,

    /// Root directory the member agent's tools operate in. One workflow at a
    /// time per workspace; concurrent runs over the same root are not
    /// coordinated.
    pub workspace_root: PathBuf,

    /// Lead model (planning and review).
    pub lead: ModelSettings,

    /// Member model (implementation with tools).
    pub member: ModelSettings,

    /// Tool-use iteration ceiling for one implementation attempt.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,

    /// Timeout for each sandboxed command, in seconds.
    #[serde(default = "default_command_timeout")]
    pub command_timeout_secs: u64,

    /// When true only allow-listed commands may run in the sandbox.
    #[serde(default = "default_strict_security")]
    pub strict_security: bool,
}

impl OrchestratorConfig {
    /// Create a configuration with defaults for the given workspace.
    pub fn new(workspace_root: impl Into<PathBuf>) -> Self {
        Self {
            database_url: default_database_url(),
            workspace_root: workspace_root.into(),
            lead: ModelSettings::local("http://localhost:11434", "qwen2.5-coder:14b"),
            member: ModelSettings::local("http://localhost:11434", "qwen2.5-coder:7b"),
            max_iterations: default_max_iterations(),
            command_timeout_secs: default_command_timeout(),
            strict_security: default_strict_security(),
        }
    }

    /// Load configuration from a YAML file.
    pub fn from_yaml_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&raw)
            .map_err(|e| OrchestratorError::Config(format!("{}: {}", path.display(), e)))
    }

    /// Set the database URL.
    pub fn with_database_url(mut self, url: impl Into<String>) -> Self {
        self.database_url = url.into();
        self
    }

    /// Set the iteration ceiling.
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Per-command sandbox timeout.
    pub fn command_timeout(&self) -> Duration {
        Duration::from_secs(self.command_timeout_secs)
    }
}

fn default_database_url() -> String {
    "sqlite:workflows.db".to_string()
}

fn default_max_iterations() -> usize {
    10
}

fn default_command_timeout() -> u64 {
    120
}

fn default_strict_security() -> bool {
    true
}

fn default_model_timeout() -> u64 {
    300
}
