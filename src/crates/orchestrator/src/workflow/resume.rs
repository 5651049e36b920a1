//! Resuming interrupted workflows from their durable record.

use crate::db::{CheckpointRepository, TaskRepository};
use crate::workflow::{
    CheckpointName, PauseState, WorkflowMachine, WorkflowOutcome, WorkflowState,
};
use crate::{OrchestratorError, Result};
use serde::{Deserialize, Serialize};

/// A task the resume controller could pick up.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResumableTask {
    pub task_id: String,
    pub state: WorkflowState,
    pub request: String,
    pub updated_at: String,
    /// Name of the most recent checkpoint, if any was written.
    pub latest_checkpoint: Option<String>,
}

impl WorkflowMachine {
    /// Pick a task up from wherever its durable record left it.
    ///
    /// Pause states re-surface the stored gate payload without any model
    /// call. In-flight states re-enter their stage; progress inside an
    /// interrupted tool loop is not replayed.
    pub async fn resume(&self, task_id: &str) -> Result<WorkflowOutcome> {
        let task = self.load_task(task_id).await?;
        let state: WorkflowState = task.workflow_state.parse()?;

        if state.is_terminal() {
            return Err(OrchestratorError::NotResumable {
                task_id: task_id.to_string(),
                state: state.to_string(),
            });
        }
        tracing::info!(task_id, state = %state, "resuming workflow");

        match state {
            WorkflowState::Pending => {
                // created but never driven; start from planning
                self.run_planning_from_pending(task_id).await
            }
            WorkflowState::Planning => self.run_planning(task_id, None).await,
            WorkflowState::PlanAwaitingApproval => {
                self.surface_pause(task_id, state, CheckpointName::AfterPlanning)
                    .await
            }
            WorkflowState::PlanApproved | WorkflowState::Implementing => {
                self.run_implementation(task_id).await
            }
            WorkflowState::Reviewing => {
                let artifact = self.stored_artifact(task_id).await?;
                let plan = task.plan.clone().ok_or_else(|| {
                    OrchestratorError::Validation(format!("task {} has no stored plan", task_id))
                })?;
                self.run_review_onward(task_id, &plan, artifact).await
            }
            WorkflowState::Verifying => {
                let artifact = self.stored_artifact(task_id).await?;
                let review = task.review.clone().unwrap_or_default();
                self.run_verification_onward(task_id, artifact, review).await
            }
            WorkflowState::ImplementationAwaitingApproval => {
                self.surface_pause(task_id, state, CheckpointName::AfterVerification)
                    .await
            }
            // already rejected above; kept for exhaustiveness
            WorkflowState::PlanRejected
            | WorkflowState::ImplementationRejected
            | WorkflowState::Completed
            | WorkflowState::Failed => Err(OrchestratorError::NotResumable {
                task_id: task_id.to_string(),
                state: state.to_string(),
            }),
        }
    }

    /// All tasks in a non-terminal state, most recently touched first.
    pub async fn list_resumable(&self) -> Result<Vec<ResumableTask>> {
        let states = [
            WorkflowState::Pending,
            WorkflowState::Planning,
            WorkflowState::PlanAwaitingApproval,
            WorkflowState::PlanApproved,
            WorkflowState::Implementing,
            WorkflowState::Reviewing,
            WorkflowState::Verifying,
            WorkflowState::ImplementationAwaitingApproval,
        ];
        let names: Vec<&str> = states.iter().map(|s| s.as_str()).collect();
        let tasks = TaskRepository::list_by_workflow_states(self.pool(), &names).await?;

        let mut out = Vec::with_capacity(tasks.len());
        for task in tasks {
            let latest = CheckpointRepository::latest_for_task(self.pool(), &task.id).await?;
            out.push(ResumableTask {
                state: task.workflow_state.parse()?,
                task_id: task.id,
                request: task.request,
                updated_at: task.updated_at,
                latest_checkpoint: latest.map(|c| c.checkpoint_name),
            });
        }
        Ok(out)
    }

    async fn run_planning_from_pending(&self, task_id: &str) -> Result<WorkflowOutcome> {
        let task = self.load_task(task_id).await?;
        self.checkpoint_start(task_id, &task.request).await?;
        self.run_planning(task_id, None).await
    }

    /// Re-surface a pause from its stored checkpoint row, byte for byte.
    async fn surface_pause(
        &self,
        task_id: &str,
        state: WorkflowState,
        checkpoint: CheckpointName,
    ) -> Result<WorkflowOutcome> {
        let row = CheckpointRepository::latest_named(self.pool(), task_id, checkpoint.as_str())
            .await?
            .ok_or_else(|| {
                OrchestratorError::Validation(format!(
                    "task {} is parked at {} but has no {} checkpoint",
                    task_id, state, checkpoint
                ))
            })?;
        Ok(WorkflowOutcome::Pause(PauseState {
            task_id: task_id.to_string(),
            state,
            checkpoint,
            payload: row.data()?,
        }))
    }

    async fn stored_artifact(
        &self,
        task_id: &str,
    ) -> Result<crate::workflow::ImplementationArtifact> {
        let task = self.load_task(task_id).await?;
        let raw = task.implementation.ok_or_else(|| {
            OrchestratorError::Validation(format!(
                "task {} has no stored implementation to resume from",
                task_id
            ))
        })?;
        Ok(serde_json::from_str(&raw)?)
    }

    async fn checkpoint_start(&self, task_id: &str, request: &str) -> Result<()> {
        // a pending task may have crashed before or after its first
        // checkpoint; only write one if none exists
        let existing = CheckpointRepository::latest_named(
            self.pool(),
            task_id,
            CheckpointName::WorkflowStart.as_str(),
        )
        .await?;
        if existing.is_none() {
            CheckpointRepository::create(
                self.pool(),
                uuid::Uuid::new_v4().to_string(),
                task_id,
                CheckpointName::WorkflowStart.as_str(),
                serde_json::json!({ "request": request }).to_string(),
            )
            .await?;
        }
        TaskRepository::update_state(
            self.pool(),
            task_id,
            WorkflowState::Planning.as_str(),
            WorkflowState::Planning.coarse_status(),
        )
        .await?;
        Ok(())
    }
}
