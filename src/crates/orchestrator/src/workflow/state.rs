//! Workflow states and transition legality.

use crate::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Fine-grained position of a task in the workflow.
///
/// The happy path runs pending → planning → plan_awaiting_approval →
/// plan_approved → implementing → reviewing → verifying →
/// implementation_awaiting_approval → completed. Rejections and capability
/// failures branch to the terminal off-path states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowState {
    Pending,
    Planning,
    PlanAwaitingApproval,
    PlanApproved,
    PlanRejected,
    Implementing,
    Reviewing,
    Verifying,
    ImplementationAwaitingApproval,
    ImplementationRejected,
    Completed,
    Failed,
}

impl WorkflowState {
    /// String form stored in the database.
    pub fn as_str(&self) -> &'static str {
        match self {
            WorkflowState::Pending => "pending",
            WorkflowState::Planning => "planning",
            WorkflowState::PlanAwaitingApproval => "plan_awaiting_approval",
            WorkflowState::PlanApproved => "plan_approved",
            WorkflowState::PlanRejected => "plan_rejected",
            WorkflowState::Implementing => "implementing",
            WorkflowState::Reviewing => "reviewing",
            WorkflowState::Verifying => "verifying",
            WorkflowState::ImplementationAwaitingApproval => "implementation_awaiting_approval",
            WorkflowState::ImplementationRejected => "implementation_rejected",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
        }
    }

    /// Terminal states accept no further transitions.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            WorkflowState::Completed
                | WorkflowState::Failed
                | WorkflowState::PlanRejected
                | WorkflowState::ImplementationRejected
        )
    }

    /// Non-terminal states can be picked up again by the resume controller.
    pub fn is_resumable(&self) -> bool {
        !self.is_terminal()
    }

    /// Coarse lifecycle status that accompanies this state.
    pub fn coarse_status(&self) -> &'static str {
        match self {
            WorkflowState::Pending => "pending",
            WorkflowState::Completed => "completed",
            WorkflowState::Failed => "failed",
            WorkflowState::PlanRejected | WorkflowState::ImplementationRejected => "cancelled",
            _ => "in_progress",
        }
    }

    /// Whether moving to `next` is a legal transition.
    pub fn can_transition_to(&self, next: WorkflowState) -> bool {
        use WorkflowState::*;
        match (self, next) {
            (Pending, Planning) => true,
            (Planning, PlanAwaitingApproval) | (Planning, Failed) => true,
            // edit loops back through planning
            (PlanAwaitingApproval, PlanApproved)
            | (PlanAwaitingApproval, PlanRejected)
            | (PlanAwaitingApproval, Planning) => true,
            (PlanApproved, Implementing) => true,
            (Implementing, Reviewing) | (Implementing, Failed) => true,
            (Reviewing, Verifying) | (Reviewing, Failed) => true,
            (Verifying, ImplementationAwaitingApproval) | (Verifying, Failed) => true,
            // retry loops back into implementing
            (ImplementationAwaitingApproval, Completed)
            | (ImplementationAwaitingApproval, ImplementationRejected)
            | (ImplementationAwaitingApproval, Implementing) => true,
            _ => false,
        }
    }

    /// Check and describe an attempted transition.
    pub fn transition_to(&self, next: WorkflowState) -> Result<WorkflowState> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(OrchestratorError::InvalidStateTransition {
                from: self.as_str().to_string(),
                to: next.as_str().to_string(),
            })
        }
    }
}

impl fmt::Display for WorkflowState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WorkflowState {
    type Err = OrchestratorError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "pending" => Ok(WorkflowState::Pending),
            "planning" => Ok(WorkflowState::Planning),
            "plan_awaiting_approval" => Ok(WorkflowState::PlanAwaitingApproval),
            "plan_approved" => Ok(WorkflowState::PlanApproved),
            "plan_rejected" => Ok(WorkflowState::PlanRejected),
            "implementing" => Ok(WorkflowState::Implementing),
            "reviewing" => Ok(WorkflowState::Reviewing),
            "verifying" => Ok(WorkflowState::Verifying),
            "implementation_awaiting_approval" => Ok(WorkflowState::ImplementationAwaitingApproval),
            "implementation_rejected" => Ok(WorkflowState::ImplementationRejected),
            "completed" => Ok(WorkflowState::Completed),
            "failed" => Ok(WorkflowState::Failed),
            other => Err(OrchestratorError::Validation(format!(
                "unknown workflow state: {}",
                other
            ))),
        }
    }
}
