//! Two-agent development workflow engine.
//!
//! A lead model plans and reviews; a member model implements with tools.
//! Every stage transition is recorded as a durable checkpoint in SQLite
//! before the workflow state advances, so an interrupted workflow can be
//! resumed from its last pause point. Human approval gates sit after
//! planning and after implementation; both a programmatic API
//! ([`workflow::WorkflowMachine`]) and an interactive terminal driver
//! ([`workflow::InteractiveDriver`]) run over the same state machine.

pub mod agent;
pub mod config;
pub mod context;
pub mod db;
pub mod verify;
pub mod workflow;

use thiserror::Error;

/// Errors that can occur during workflow orchestration.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Task not found.
    #[error("Task not found: {0}")]
    TaskNotFound(String),

    /// Task is in a terminal state and cannot be resumed.
    #[error("Task {task_id} is not resumable from state {state}")]
    NotResumable { task_id: String, state: String },

    /// Invalid state transition.
    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },

    /// A decision or request was rejected at the API boundary.
    #[error("Validation error: {0}")]
    Validation(String),

    /// A model call failed; the owning task is marked failed.
    #[error("Capability error: {0}")]
    Capability(#[from] llm::LlmError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Workspace or tooling setup failed outside the agent loop.
    #[error("Tooling error: {0}")]
    Tooling(#[from] tooling::ToolingError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type for orchestrator operations.
pub type Result<T> = std::result::Result<T, OrchestratorError>;
