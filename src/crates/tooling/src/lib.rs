//! Workspace tools for the member agent.
//!
//! This crate provides the fixed tool menu the implementing agent works with:
//! file operations with review-gate staging, in-workspace code search, and
//! sandboxed command execution. Every execution-class operation passes
//! through the [`SecurityValidator`] first; a rejection is returned as an
//! error the caller feeds back to the model rather than a crash.

pub mod executor;
pub mod sandbox;
pub mod schema;
pub mod security;
pub mod workspace;

pub use executor::ToolExecutor;
pub use sandbox::{ExecutionOutcome, ProcessSandbox, SandboxExecutor};
pub use schema::coding_tool_schemas;
pub use security::SecurityValidator;
pub use workspace::{StagedChange, WorkspaceTools};

use thiserror::Error;

/// Result type for tooling operations.
pub type Result<T> = std::result::Result<T, ToolingError>;

/// Errors that can occur while executing tools.
///
/// `SecurityRejection` and most other variants are recoverable from the
/// workflow's point of view: they become the tool's result string and the
/// agent loop continues.
#[derive(Debug, Error)]
pub enum ToolingError {
    /// Tool name not in the registered menu.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Arguments did not match the tool's schema.
    #[error("Invalid arguments for {tool}: {reason}")]
    InvalidArguments { tool: String, reason: String },

    /// The security validator refused the operation.
    #[error("Security rejection: {0}")]
    SecurityRejection(String),

    /// Path resolves outside the workspace root.
    #[error("Path outside workspace: {0}")]
    PathOutsideWorkspace(String),

    /// Filesystem operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid search pattern.
    #[error("Invalid pattern: {0}")]
    InvalidPattern(#[from] regex::Error),

    /// Sandboxed execution failed to start or was interrupted.
    #[error("Execution error: {0}")]
    Execution(String),

    /// Serialization failure in tool arguments or results.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
