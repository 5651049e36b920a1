//! Checkpoint names, operator decisions, and the payloads the workflow
//! surfaces when it pauses or finishes.

use crate::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Named points at which the workflow persists a durable checkpoint.
///
/// First occurrences follow the canonical order below; plan revisions and
/// implementation retries append repeated names to the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CheckpointName {
    WorkflowStart,
    AfterPlanning,
    StartImplementation,
    AfterImplementation,
    AfterReview,
    AfterVerification,
}

impl CheckpointName {
    pub fn as_str(&self) -> &'static str {
        match self {
            CheckpointName::WorkflowStart => "workflow_start",
            CheckpointName::AfterPlanning => "after_planning",
            CheckpointName::StartImplementation => "start_implementation",
            CheckpointName::AfterImplementation => "after_implementation",
            CheckpointName::AfterReview => "after_review",
            CheckpointName::AfterVerification => "after_verification",
        }
    }
}

impl fmt::Display for CheckpointName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for CheckpointName {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "workflow_start" => Ok(CheckpointName::WorkflowStart),
            "after_planning" => Ok(CheckpointName::AfterPlanning),
            "start_implementation" => Ok(CheckpointName::StartImplementation),
            "after_implementation" => Ok(CheckpointName::AfterImplementation),
            "after_review" => Ok(CheckpointName::AfterReview),
            "after_verification" => Ok(CheckpointName::AfterVerification),
            other => Err(OrchestratorError::Validation(format!(
                "unknown checkpoint name: {}",
                other
            ))),
        }
    }
}

/// An operator's answer at an approval gate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "decision", rename_all = "snake_case")]
pub enum Decision {
    /// Accept the plan or implementation and move on.
    Approve,
    /// Stop the workflow; the reason is recorded on the task.
    Reject { reason: String },
    /// Plan gate only: send the plan back with feedback for revision.
    Edit { feedback: String },
    /// Implementation gate only: discard the implementation and redo it
    /// against the approved plan.
    Retry,
}

/// One tool call the member agent made, for the audit trail.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolInvocation {
    pub tool: String,
    pub arguments: serde_json::Value,
    /// Truncated result or error text fed back to the model.
    pub outcome: String,
}

/// What the member agent produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImplementationArtifact {
    /// False when the iteration ceiling was hit before the agent finished.
    pub success: bool,
    /// The agent's final assistant message.
    pub summary: String,
    pub iterations: u32,
    pub tool_invocations: Vec<ToolInvocation>,
    pub files_changed: Vec<String>,
}

/// A single verification check and its result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationCheck {
    pub name: String,
    pub passed: bool,
    pub detail: String,
}

/// Outcome of the post-review verification stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerificationReport {
    pub passed: bool,
    pub checks: Vec<VerificationCheck>,
}

impl VerificationReport {
    pub fn from_checks(checks: Vec<VerificationCheck>) -> Self {
        let passed = checks.iter().all(|c| c.passed);
        VerificationReport { passed, checks }
    }
}

/// Payload surfaced when the workflow parks at an approval gate.
///
/// Resume reconstructs this from stored rows, so an operator who comes
/// back later sees exactly what was pending.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PauseState {
    pub task_id: String,
    pub state: super::WorkflowState,
    pub checkpoint: CheckpointName,
    /// Plan text at the plan gate; implementation summary at the
    /// implementation gate.
    pub payload: serde_json::Value,
}

/// Payload surfaced when the workflow reaches a terminal state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TerminalState {
    pub task_id: String,
    pub state: super::WorkflowState,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Result of driving the workflow until it can go no further on its own.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum WorkflowOutcome {
    /// Waiting on a human decision.
    Pause(PauseState),
    /// Nothing more will happen for this task.
    Terminal(TerminalState),
}

impl WorkflowOutcome {
    pub fn task_id(&self) -> &str {
        match self {
            WorkflowOutcome::Pause(p) => &p.task_id,
            WorkflowOutcome::Terminal(t) => &t.task_id,
        }
    }

    pub fn is_pause(&self) -> bool {
        matches!(self, WorkflowOutcome::Pause(_))
    }
}
