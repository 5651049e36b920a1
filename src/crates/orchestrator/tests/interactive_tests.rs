//! The interactive driver runs the same state machine as the programmatic
//! API, so both styles must leave identical task records behind.

mod common;

use common::{text, Harness, ScriptedModel};
use orchestrator::db::{CheckpointRepository, TaskRepository};
use orchestrator::workflow::{
    CheckpointName, Decision, InteractiveDriver, Prompter, WorkflowOutcome, WorkflowState,
};
use std::collections::VecDeque;

/// Prompter double replaying scripted operator answers.
struct ScriptedPrompter {
    answers: VecDeque<String>,
    shown: Vec<String>,
}

impl ScriptedPrompter {
    fn new(answers: &[&str]) -> Self {
        Self {
            answers: answers.iter().map(|s| s.to_string()).collect(),
            shown: Vec::new(),
        }
    }
}

impl Prompter for ScriptedPrompter {
    fn show(&mut self, text: &str) {
        self.shown.push(text.to_string());
    }

    fn ask(&mut self, _question: &str) -> orchestrator::Result<String> {
        Ok(self.answers.pop_front().unwrap_or_default())
    }
}

fn scripts() -> (ScriptedModel, ScriptedModel) {
    (
        ScriptedModel::new(vec![text("the plan"), text("looks fine")]),
        ScriptedModel::new(vec![text("implemented it")]),
    )
}

#[tokio::test]
async fn test_interactive_run_to_completion() {
    let h = Harness::new().await;
    let (lead, member) = scripts();
    let machine = h.machine(lead, member);

    let mut driver = InteractiveDriver::new(machine, ScriptedPrompter::new(&["a", "approve"]));
    let outcome = driver.run("do a thing").await.unwrap();

    let terminal = match outcome {
        WorkflowOutcome::Terminal(t) => t,
        WorkflowOutcome::Pause(p) => panic!("expected terminal, got pause at {:?}", p.checkpoint),
    };
    assert_eq!(terminal.state, WorkflowState::Completed);
}

#[tokio::test]
async fn test_interactive_reject_with_reason() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan")]),
        ScriptedModel::unused(),
    );

    let mut driver =
        InteractiveDriver::new(machine, ScriptedPrompter::new(&["r", "too risky"]));
    let outcome = driver.run("do a thing").await.unwrap();

    let terminal = match outcome {
        WorkflowOutcome::Terminal(t) => t,
        WorkflowOutcome::Pause(_) => panic!("expected terminal"),
    };
    assert_eq!(terminal.state, WorkflowState::PlanRejected);
    assert_eq!(terminal.detail.as_deref(), Some("too risky"));
}

#[tokio::test]
async fn test_blank_rejection_reason_is_reprompted() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan")]),
        ScriptedModel::unused(),
    );

    // blank reason first; the driver must ask again instead of aborting
    let mut driver =
        InteractiveDriver::new(machine, ScriptedPrompter::new(&["r", "  ", "too risky"]));
    let outcome = driver.run("do a thing").await.unwrap();

    let terminal = match outcome {
        WorkflowOutcome::Terminal(t) => t,
        WorkflowOutcome::Pause(_) => panic!("expected terminal"),
    };
    assert_eq!(terminal.state, WorkflowState::PlanRejected);
    assert_eq!(terminal.detail.as_deref(), Some("too risky"));
}

#[tokio::test]
async fn test_blank_edit_feedback_is_reprompted() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("plan v1"), text("plan v2")]),
        ScriptedModel::unused(),
    );

    // blank feedback first, then real feedback, then reject to finish
    let mut driver = InteractiveDriver::new(
        machine,
        ScriptedPrompter::new(&["e", "", "split step one", "r", "stopping here"]),
    );
    let outcome = driver.run("do a thing").await.unwrap();

    assert!(matches!(outcome, WorkflowOutcome::Terminal(_)));
    let task_id = outcome.task_id().to_string();
    let task = TaskRepository::get_by_id(&h.pool, &task_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(task.plan.as_deref(), Some("plan v2"));
}

#[tokio::test]
async fn test_unrecognized_answers_are_reprompted() {
    let h = Harness::new().await;
    let (lead, member) = scripts();
    let machine = h.machine(lead, member);

    // garbage first, then valid answers
    let mut driver = InteractiveDriver::new(
        machine,
        ScriptedPrompter::new(&["maybe", "a", "nope", "a"]),
    );
    let outcome = driver.run("do a thing").await.unwrap();
    assert!(matches!(outcome, WorkflowOutcome::Terminal(_)));
}

#[tokio::test]
async fn test_both_styles_leave_identical_records() {
    // programmatic
    let h1 = Harness::new().await;
    let (lead, member) = scripts();
    let machine = h1.machine(lead, member);
    let first = match machine.start("do a thing").await.unwrap() {
        WorkflowOutcome::Pause(p) => p,
        _ => panic!("expected plan pause"),
    };
    machine
        .decide(&first.task_id, CheckpointName::AfterPlanning, Decision::Approve)
        .await
        .unwrap();
    machine
        .decide(
            &first.task_id,
            CheckpointName::AfterVerification,
            Decision::Approve,
        )
        .await
        .unwrap();
    let programmatic = TaskRepository::get_by_id(&h1.pool, &first.task_id)
        .await
        .unwrap()
        .unwrap();

    // interactive, same scripts and decisions
    let h2 = Harness::new().await;
    let (lead, member) = scripts();
    let machine = h2.machine(lead, member);
    let mut driver = InteractiveDriver::new(machine, ScriptedPrompter::new(&["a", "a"]));
    let outcome = driver.run("do a thing").await.unwrap();
    let interactive = TaskRepository::get_by_id(&h2.pool, outcome.task_id())
        .await
        .unwrap()
        .unwrap();

    assert_eq!(programmatic.workflow_state, interactive.workflow_state);
    assert_eq!(programmatic.status, interactive.status);
    assert_eq!(programmatic.plan, interactive.plan);
    assert_eq!(programmatic.review, interactive.review);
    assert_eq!(programmatic.retry_count, interactive.retry_count);
    assert_eq!(
        programmatic.plan_approved_by,
        interactive.plan_approved_by
    );
    assert_eq!(
        programmatic.implementation_approved_by,
        interactive.implementation_approved_by
    );

    assert_eq!(
        checkpoint_names(&h1.pool, &programmatic.id).await,
        checkpoint_names(&h2.pool, &interactive.id).await
    );
}

async fn checkpoint_names(pool: &orchestrator::db::DatabasePool, id: &str) -> Vec<String> {
    CheckpointRepository::list_for_task(pool, id)
        .await
        .unwrap()
        .into_iter()
        .map(|c| c.checkpoint_name)
        .collect()
}
