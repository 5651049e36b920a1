//! The workflow state machine.
//!
//! Every durable step follows the same discipline: persist the checkpoint
//! first, then advance the workflow state. A crash between the two leaves
//! the task one state behind its log, which resume handles by re-entering
//! the stage; it never leaves a state the log knows nothing about.

use crate::agent::MemberAgent;
use crate::config::OrchestratorConfig;
use crate::context::{ContextAssembler, FileTreeContext};
use crate::db::{CheckpointRepository, DatabasePool, TaskRepository};
use crate::db::models::Task;
use crate::verify::{QuickVerifier, Verifier};
use crate::workflow::{
    CheckpointName, Decision, ImplementationArtifact, PauseState, TerminalState, WorkflowOutcome,
    WorkflowState,
};
use crate::{OrchestratorError, Result};
use llm::{ChatModel, ChatRequest, Message};
use serde_json::json;
use std::sync::Arc;
use tooling::{ProcessSandbox, ToolExecutor};
use uuid::Uuid;

const LEAD_PLANNER_PROMPT: &str = "You are the technical lead on a software project. Given a \
task and a snapshot of the workspace, produce a concrete implementation plan: a short numbered \
list of steps naming the files to create or change and what each change does. Plan only; do not \
write the code.";

const LEAD_REVIEWER_PROMPT: &str = "You are the technical lead reviewing an implementation \
produced by another engineer. You are given the approved plan, the engineer's summary, and the \
list of changed files. Assess whether the work follows the plan and flag anything that looks \
wrong or incomplete. Be brief and specific.";

/// Drives tasks through the two-agent workflow.
///
/// Holds no per-task state; everything lives in the database, so one
/// machine can serve many tasks and a fresh machine can pick up where
/// another stopped.
pub struct WorkflowMachine {
    pool: DatabasePool,
    config: OrchestratorConfig,
    lead: Box<dyn ChatModel>,
    member: Box<dyn ChatModel>,
    context: Box<dyn ContextAssembler>,
    verifier: Box<dyn Verifier>,
}

impl WorkflowMachine {
    pub fn new(
        pool: DatabasePool,
        config: OrchestratorConfig,
        lead: Box<dyn ChatModel>,
        member: Box<dyn ChatModel>,
    ) -> Self {
        Self {
            pool,
            config,
            lead,
            member,
            context: Box::new(FileTreeContext::new()),
            verifier: Box::new(QuickVerifier),
        }
    }

    /// Replace the workspace context assembler.
    pub fn with_context(mut self, context: Box<dyn ContextAssembler>) -> Self {
        self.context = context;
        self
    }

    /// Replace the verification stage.
    pub fn with_verifier(mut self, verifier: Box<dyn Verifier>) -> Self {
        self.verifier = verifier;
        self
    }

    pub fn pool(&self) -> &DatabasePool {
        &self.pool
    }

    /// Create a task for `request` and run it to its first pause or
    /// terminal state.
    pub async fn start(&self, request: &str) -> Result<WorkflowOutcome> {
        let request = request.trim();
        if request.is_empty() {
            return Err(OrchestratorError::Validation(
                "request must not be empty".to_string(),
            ));
        }

        let task_id = Uuid::new_v4().to_string();
        TaskRepository::create(&self.pool, task_id.clone(), request.to_string()).await?;
        tracing::info!(task_id = %task_id, "workflow started");

        self.checkpoint(&task_id, CheckpointName::WorkflowStart, json!({ "request": request }))
            .await?;
        self.advance(&task_id, WorkflowState::Pending, WorkflowState::Planning)
            .await?;

        self.run_planning(&task_id, None).await
    }

    /// Answer a pending approval gate.
    ///
    /// The checkpoint names which gate the caller believes is open; a
    /// mismatch with the task's actual state is rejected before anything
    /// is mutated, as is a decision kind the gate does not accept.
    pub async fn decide(
        &self,
        task_id: &str,
        checkpoint: CheckpointName,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        let task = self.load_task(task_id).await?;
        let state: WorkflowState = task.workflow_state.parse()?;

        match state {
            WorkflowState::PlanAwaitingApproval => {
                if checkpoint != CheckpointName::AfterPlanning {
                    return Err(OrchestratorError::Validation(format!(
                        "task {} is at the plan gate (after_planning), not {}",
                        task_id, checkpoint
                    )));
                }
                self.decide_plan(task_id, state, decision).await
            }
            WorkflowState::ImplementationAwaitingApproval => {
                if checkpoint != CheckpointName::AfterVerification {
                    return Err(OrchestratorError::Validation(format!(
                        "task {} is at the implementation gate (after_verification), not {}",
                        task_id, checkpoint
                    )));
                }
                self.decide_implementation(task_id, state, decision).await
            }
            other => Err(OrchestratorError::Validation(format!(
                "task {} is not awaiting a decision (state: {})",
                task_id, other
            ))),
        }
    }

    async fn decide_plan(
        &self,
        task_id: &str,
        state: WorkflowState,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        match decision {
            Decision::Approve => {
                TaskRepository::record_plan_approval(&self.pool, task_id, "user").await?;
                self.advance(task_id, state, WorkflowState::PlanApproved).await?;
                tracing::info!(task_id, "plan approved");
                self.run_implementation(task_id).await
            }
            Decision::Reject { reason } => {
                let reason = non_empty(reason, "a plan rejection needs a reason")?;
                TaskRepository::record_plan_rejection(&self.pool, task_id, &reason).await?;
                self.advance(task_id, state, WorkflowState::PlanRejected).await?;
                tracing::info!(task_id, "plan rejected");
                Ok(WorkflowOutcome::Terminal(TerminalState {
                    task_id: task_id.to_string(),
                    state: WorkflowState::PlanRejected,
                    detail: Some(reason),
                }))
            }
            Decision::Edit { feedback } => {
                let feedback = non_empty(feedback, "a plan edit needs feedback")?;
                self.advance(task_id, state, WorkflowState::Planning).await?;
                tracing::info!(task_id, "plan sent back for revision");
                self.run_planning(task_id, Some(&feedback)).await
            }
            Decision::Retry => Err(OrchestratorError::Validation(
                "retry is not a valid decision at the plan gate".to_string(),
            )),
        }
    }

    async fn decide_implementation(
        &self,
        task_id: &str,
        state: WorkflowState,
        decision: Decision,
    ) -> Result<WorkflowOutcome> {
        match decision {
            Decision::Approve => {
                TaskRepository::record_implementation_approval(&self.pool, task_id, "user")
                    .await?;
                self.advance(task_id, state, WorkflowState::Completed).await?;
                tracing::info!(task_id, "implementation approved, workflow complete");
                Ok(WorkflowOutcome::Terminal(TerminalState {
                    task_id: task_id.to_string(),
                    state: WorkflowState::Completed,
                    detail: None,
                }))
            }
            Decision::Reject { reason } => {
                let reason = non_empty(reason, "an implementation rejection needs a reason")?;
                TaskRepository::record_implementation_rejection(&self.pool, task_id, &reason)
                    .await?;
                self.advance(task_id, state, WorkflowState::ImplementationRejected)
                    .await?;
                tracing::info!(task_id, "implementation rejected");
                Ok(WorkflowOutcome::Terminal(TerminalState {
                    task_id: task_id.to_string(),
                    state: WorkflowState::ImplementationRejected,
                    detail: Some(reason),
                }))
            }
            Decision::Retry => {
                TaskRepository::begin_retry(&self.pool, task_id).await?;
                self.advance(task_id, state, WorkflowState::Implementing).await?;
                tracing::info!(task_id, "implementation retry requested");
                self.run_implementation(task_id).await
            }
            Decision::Edit { .. } => Err(OrchestratorError::Validation(
                "edit is not a valid decision at the implementation gate".to_string(),
            )),
        }
    }

    /// Planning stage: prompt the lead, checkpoint the plan, park at the
    /// plan gate. With `feedback` this is a revision of the stored plan.
    pub(crate) async fn run_planning(
        &self,
        task_id: &str,
        feedback: Option<&str>,
    ) -> Result<WorkflowOutcome> {
        let task = self.load_task(task_id).await?;
        let workspace = self.context.assemble(&self.config.workspace_root).await?;

        let mut prompt = format!("Task: {}\n\nWorkspace:\n{}", task.request, workspace);
        if let Some(feedback) = feedback {
            if let Some(previous) = &task.plan {
                prompt.push_str(&format!("\n\nPrevious plan:\n{}", previous));
            }
            prompt.push_str(&format!("\n\nReviewer feedback to address:\n{}", feedback));
        }

        let request = ChatRequest::new(vec![
            Message::system(LEAD_PLANNER_PROMPT),
            Message::human(prompt),
        ]);
        let plan = match self.lead.chat(request).await {
            Ok(response) => response.message.content,
            Err(e) => return self.fail(task_id, &format!("planning failed: {}", e)).await,
        };

        TaskRepository::set_plan(&self.pool, task_id, &plan).await?;
        let payload = json!({ "plan": plan });
        self.checkpoint(task_id, CheckpointName::AfterPlanning, payload.clone())
            .await?;
        self.advance(
            task_id,
            WorkflowState::Planning,
            WorkflowState::PlanAwaitingApproval,
        )
        .await?;

        Ok(WorkflowOutcome::Pause(PauseState {
            task_id: task_id.to_string(),
            state: WorkflowState::PlanAwaitingApproval,
            checkpoint: CheckpointName::AfterPlanning,
            payload,
        }))
    }

    /// Implementation stage: the member agent loop, then review, then
    /// verification, parking at the implementation gate. Entered from
    /// `plan_approved` (fresh or retried) or re-entered from `implementing`
    /// after an interruption.
    pub(crate) async fn run_implementation(&self, task_id: &str) -> Result<WorkflowOutcome> {
        let task = self.load_task(task_id).await?;
        let state: WorkflowState = task.workflow_state.parse()?;
        let plan = task.plan.clone().ok_or_else(|| {
            OrchestratorError::Validation(format!("task {} has no stored plan", task_id))
        })?;

        if state == WorkflowState::PlanApproved {
            self.checkpoint(
                task_id,
                CheckpointName::StartImplementation,
                json!({ "plan": plan }),
            )
            .await?;
            self.advance(task_id, state, WorkflowState::Implementing).await?;
        }

        let sandbox = Arc::new(ProcessSandbox::new(&self.config.workspace_root));
        let mut executor = ToolExecutor::new(
            &self.config.workspace_root,
            sandbox,
            self.config.strict_security,
            self.config.command_timeout(),
        );
        let workspace = self.context.assemble(&self.config.workspace_root).await?;
        let agent = MemberAgent::new(self.member.clone(), self.config.max_iterations);

        let mut artifact = match agent
            .run(&mut executor, &task.request, &plan, &workspace)
            .await
        {
            Ok(artifact) => artifact,
            Err(OrchestratorError::Capability(e)) => {
                return self
                    .fail(task_id, &format!("implementation failed: {}", e))
                    .await;
            }
            Err(e) => return Err(e),
        };

        executor.apply_staged()?;
        artifact.files_changed = executor.changed_files();

        TaskRepository::set_implementation(
            &self.pool,
            task_id,
            &serde_json::to_string(&artifact)?,
        )
        .await?;
        self.checkpoint(
            task_id,
            CheckpointName::AfterImplementation,
            serde_json::to_value(&artifact)?,
        )
        .await?;
        self.advance(task_id, WorkflowState::Implementing, WorkflowState::Reviewing)
            .await?;

        self.run_review_onward(task_id, &plan, artifact).await
    }

    /// Review and verification; split out so resume can re-enter here when
    /// an implementation artifact is already stored.
    pub(crate) async fn run_review_onward(
        &self,
        task_id: &str,
        plan: &str,
        artifact: ImplementationArtifact,
    ) -> Result<WorkflowOutcome> {
        let prompt = format!(
            "Plan:\n{}\n\nEngineer's summary:\n{}\n\nChanged files: {}",
            plan,
            artifact.summary,
            if artifact.files_changed.is_empty() {
                "(none)".to_string()
            } else {
                artifact.files_changed.join(", ")
            }
        );
        let request = ChatRequest::new(vec![
            Message::system(LEAD_REVIEWER_PROMPT),
            Message::human(prompt),
        ]);
        let review = match self.lead.chat(request).await {
            Ok(response) => response.message.content,
            Err(e) => return self.fail(task_id, &format!("review failed: {}", e)).await,
        };

        TaskRepository::set_review(&self.pool, task_id, &review).await?;
        self.checkpoint(task_id, CheckpointName::AfterReview, json!({ "review": review }))
            .await?;
        self.advance(task_id, WorkflowState::Reviewing, WorkflowState::Verifying)
            .await?;

        self.run_verification_onward(task_id, artifact, review).await
    }

    pub(crate) async fn run_verification_onward(
        &self,
        task_id: &str,
        artifact: ImplementationArtifact,
        review: String,
    ) -> Result<WorkflowOutcome> {
        let report = self
            .verifier
            .verify(&self.config.workspace_root, &artifact)
            .await?;

        TaskRepository::set_verification(&self.pool, task_id, &serde_json::to_string(&report)?)
            .await?;
        let payload = json!({
            "summary": artifact.summary,
            "files_changed": artifact.files_changed,
            "review": review,
            "verification": report,
        });
        self.checkpoint(task_id, CheckpointName::AfterVerification, payload.clone())
            .await?;
        self.advance(
            task_id,
            WorkflowState::Verifying,
            WorkflowState::ImplementationAwaitingApproval,
        )
        .await?;

        Ok(WorkflowOutcome::Pause(PauseState {
            task_id: task_id.to_string(),
            state: WorkflowState::ImplementationAwaitingApproval,
            checkpoint: CheckpointName::AfterVerification,
            payload,
        }))
    }

    pub(crate) async fn load_task(&self, task_id: &str) -> Result<Task> {
        TaskRepository::get_by_id(&self.pool, task_id)
            .await?
            .ok_or_else(|| OrchestratorError::TaskNotFound(task_id.to_string()))
    }

    /// Validate and apply a state transition.
    async fn advance(&self, task_id: &str, from: WorkflowState, to: WorkflowState) -> Result<()> {
        let to = from.transition_to(to)?;
        TaskRepository::update_state(&self.pool, task_id, to.as_str(), to.coarse_status()).await?;
        tracing::debug!(task_id, from = %from, to = %to, "state advanced");
        Ok(())
    }

    /// Persist a checkpoint. Always called before the state advance it
    /// belongs to.
    async fn checkpoint(
        &self,
        task_id: &str,
        name: CheckpointName,
        data: serde_json::Value,
    ) -> Result<()> {
        CheckpointRepository::create(
            &self.pool,
            Uuid::new_v4().to_string(),
            task_id,
            name.as_str(),
            data.to_string(),
        )
        .await?;
        tracing::debug!(task_id, checkpoint = %name, "checkpoint written");
        Ok(())
    }

    /// Capability failure: record the details and finish the task. No
    /// checkpoint is written for a failure.
    async fn fail(&self, task_id: &str, details: &str) -> Result<WorkflowOutcome> {
        tracing::error!(task_id, details, "workflow failed");
        TaskRepository::record_failure(&self.pool, task_id, details).await?;
        Ok(WorkflowOutcome::Terminal(TerminalState {
            task_id: task_id.to_string(),
            state: WorkflowState::Failed,
            detail: Some(details.to_string()),
        }))
    }
}

fn non_empty(value: String, message: &str) -> Result<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        Err(OrchestratorError::Validation(message.to_string()))
    } else {
        Ok(trimmed.to_string())
    }
}
