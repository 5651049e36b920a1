//! Task model for database persistence.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A development task moving through the workflow.
///
/// `status` is the coarse lifecycle (pending, in_progress, completed,
/// failed, cancelled); `workflow_state` is the fine-grained state machine
/// position. Artifact columns hold what each stage produced: the plan text,
/// the implementation artifact (JSON), the lead's review, and the
/// verification report (JSON).
///
/// # Timestamps
/// All timestamp fields are RFC 3339 strings due to SQLite type limitations.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Task {
    /// Unique task identifier (UUID string).
    pub id: String,

    /// The operator's original request.
    pub request: String,

    /// Coarse status: pending, in_progress, completed, failed, cancelled.
    pub status: String,

    /// Fine-grained workflow state (see `workflow::WorkflowState`).
    pub workflow_state: String,

    /// Plan produced by the lead, awaiting or past approval.
    pub plan: Option<String>,

    /// Implementation artifact as JSON.
    pub implementation: Option<String>,

    /// Review text produced by the lead.
    pub review: Option<String>,

    /// Verification report as JSON.
    pub verification_result: Option<String>,

    /// Error details when the task failed.
    pub error_details: Option<String>,

    /// Number of implementation retries requested so far.
    pub retry_count: i64,

    /// Plan approval timestamp (RFC 3339, optional).
    pub plan_approved_at: Option<String>,

    /// Who approved the plan.
    pub plan_approved_by: Option<String>,

    /// Why the plan was rejected, if it was.
    pub plan_rejection_reason: Option<String>,

    /// Implementation approval timestamp (RFC 3339, optional).
    pub implementation_approved_at: Option<String>,

    /// Who approved the implementation.
    pub implementation_approved_by: Option<String>,

    /// Why the implementation was rejected, if it was.
    pub implementation_rejection_reason: Option<String>,

    /// Creation timestamp (RFC 3339).
    pub created_at: String,

    /// Last update timestamp (RFC 3339).
    pub updated_at: String,
}

impl Task {
    /// Create a new pending task for a request.
    pub fn new(id: String, request: String) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id,
            request,
            status: "pending".to_string(),
            workflow_state: "pending".to_string(),
            plan: None,
            implementation: None,
            review: None,
            verification_result: None,
            error_details: None,
            retry_count: 0,
            plan_approved_at: None,
            plan_approved_by: None,
            plan_rejection_reason: None,
            implementation_approved_at: None,
            implementation_approved_by: None,
            implementation_rejection_reason: None,
            created_at: now.clone(),
            updated_at: now,
        }
    }
}
