//! Resume behavior: picking interrupted workflows back up from the
//! database, with no work redone that is already on record.

mod common;

use common::{text, Harness, ScriptedModel};
use orchestrator::db::{CheckpointRepository, TaskRepository};
use orchestrator::workflow::{CheckpointName, Decision, WorkflowOutcome, WorkflowState};
use orchestrator::OrchestratorError;

fn pause_of(outcome: WorkflowOutcome) -> orchestrator::workflow::PauseState {
    match outcome {
        WorkflowOutcome::Pause(p) => p,
        WorkflowOutcome::Terminal(t) => panic!("expected pause, got terminal {:?}", t),
    }
}

#[tokio::test]
async fn test_resume_at_the_plan_gate_surfaces_the_stored_payload() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan")]),
        ScriptedModel::unused(),
    );
    let original = pause_of(machine.start("do a thing").await.unwrap());

    // a fresh machine over the same database, with models that must not
    // be consulted
    let lead_probe = ScriptedModel::unused();
    let resumed_machine = h.machine(lead_probe.handle(), ScriptedModel::unused());
    let resumed = pause_of(resumed_machine.resume(&original.task_id).await.unwrap());

    assert_eq!(resumed.task_id, original.task_id);
    assert_eq!(resumed.state, WorkflowState::PlanAwaitingApproval);
    assert_eq!(resumed.checkpoint, CheckpointName::AfterPlanning);
    assert_eq!(resumed.payload, original.payload);
    assert_eq!(lead_probe.calls(), 0);
}

#[tokio::test]
async fn test_resume_at_the_implementation_gate_surfaces_the_stored_payload() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan"), text("review")]),
        ScriptedModel::new(vec![text("summary")]),
    );
    let pause = pause_of(machine.start("do a thing").await.unwrap());
    let original = pause_of(
        machine
            .decide(&pause.task_id, CheckpointName::AfterPlanning, Decision::Approve)
            .await
            .unwrap(),
    );

    let resumed_machine = h.machine(ScriptedModel::unused(), ScriptedModel::unused());
    let resumed = pause_of(resumed_machine.resume(&original.task_id).await.unwrap());

    assert_eq!(resumed.checkpoint, CheckpointName::AfterVerification);
    assert_eq!(resumed.payload, original.payload);
}

#[tokio::test]
async fn test_repeated_resume_is_idempotent_at_the_plan_gate() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan")]),
        ScriptedModel::unused(),
    );
    let pause = pause_of(machine.start("do a thing").await.unwrap());
    let task_id = pause.task_id.clone();

    let first = pause_of(machine.resume(&task_id).await.unwrap());
    let second = pause_of(machine.resume(&task_id).await.unwrap());

    assert_eq!(first.payload, second.payload);
    assert_eq!(first.state, second.state);
    assert_eq!(first.checkpoint, second.checkpoint);

    // resuming a parked task writes nothing and moves nothing
    assert_eq!(
        CheckpointRepository::count_for_task(&h.pool, &task_id)
            .await
            .unwrap(),
        2 // workflow_start, after_planning
    );
    let task = TaskRepository::get_by_id(&h.pool, &task_id).await.unwrap().unwrap();
    assert_eq!(task.workflow_state, "plan_awaiting_approval");
}

#[tokio::test]
async fn test_repeated_resume_is_idempotent_at_the_implementation_gate() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan"), text("review")]),
        ScriptedModel::new(vec![text("summary")]),
    );
    let pause = pause_of(machine.start("do a thing").await.unwrap());
    let task_id = pause.task_id.clone();
    machine
        .decide(&task_id, CheckpointName::AfterPlanning, Decision::Approve)
        .await
        .unwrap();

    let before = CheckpointRepository::count_for_task(&h.pool, &task_id)
        .await
        .unwrap();
    let first = pause_of(machine.resume(&task_id).await.unwrap());
    let second = pause_of(machine.resume(&task_id).await.unwrap());

    assert_eq!(first.payload, second.payload);
    assert_eq!(first.checkpoint, CheckpointName::AfterVerification);
    assert_eq!(
        CheckpointRepository::count_for_task(&h.pool, &task_id)
            .await
            .unwrap(),
        before
    );
}

#[tokio::test]
async fn test_terminal_states_are_not_resumable() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("the plan")]),
        ScriptedModel::unused(),
    );
    let pause = pause_of(machine.start("do a thing").await.unwrap());
    machine
        .decide(
            &pause.task_id,
            CheckpointName::AfterPlanning,
            Decision::Reject {
                reason: "not now".to_string(),
            },
        )
        .await
        .unwrap();

    let err = machine.resume(&pause.task_id).await.unwrap_err();
    match err {
        OrchestratorError::NotResumable { task_id, state } => {
            assert_eq!(task_id, pause.task_id);
            assert_eq!(state, "plan_rejected");
        }
        other => panic!("expected NotResumable, got {:?}", other),
    }
}

#[tokio::test]
async fn test_resume_unknown_task() {
    let h = Harness::new().await;
    let machine = h.machine(ScriptedModel::unused(), ScriptedModel::unused());

    let err = machine.resume("no-such-task").await.unwrap_err();
    assert!(matches!(err, OrchestratorError::TaskNotFound(_)));
}

#[tokio::test]
async fn test_resume_from_verifying_uses_stored_artifacts_without_model_calls() {
    let h = Harness::new().await;
    TaskRepository::create(&h.pool, "t1".to_string(), "do a thing".to_string())
        .await
        .unwrap();
    TaskRepository::set_plan(&h.pool, "t1", "the plan").await.unwrap();
    let artifact = serde_json::json!({
        "success": true,
        "summary": "summary",
        "iterations": 2,
        "tool_invocations": [],
        "files_changed": [],
    });
    TaskRepository::set_implementation(&h.pool, "t1", &artifact.to_string())
        .await
        .unwrap();
    TaskRepository::set_review(&h.pool, "t1", "review").await.unwrap();
    TaskRepository::update_state(&h.pool, "t1", "verifying", "in_progress")
        .await
        .unwrap();

    let lead = ScriptedModel::unused();
    let member = ScriptedModel::unused();
    let machine = h.machine(lead.handle(), member.handle());
    let pause = pause_of(machine.resume("t1").await.unwrap());

    assert_eq!(pause.checkpoint, CheckpointName::AfterVerification);
    assert_eq!(pause.payload["review"], "review");
    assert_eq!(lead.calls(), 0);
    assert_eq!(member.calls(), 0);
}

#[tokio::test]
async fn test_resume_from_reviewing_redoes_review_only() {
    let h = Harness::new().await;
    TaskRepository::create(&h.pool, "t1".to_string(), "do a thing".to_string())
        .await
        .unwrap();
    TaskRepository::set_plan(&h.pool, "t1", "the plan").await.unwrap();
    let artifact = serde_json::json!({
        "success": true,
        "summary": "summary",
        "iterations": 2,
        "tool_invocations": [],
        "files_changed": [],
    });
    TaskRepository::set_implementation(&h.pool, "t1", &artifact.to_string())
        .await
        .unwrap();
    TaskRepository::update_state(&h.pool, "t1", "reviewing", "in_progress")
        .await
        .unwrap();

    let member = ScriptedModel::unused();
    let machine = h.machine(
        ScriptedModel::new(vec![text("fresh review")]),
        member.handle(),
    );
    let pause = pause_of(machine.resume("t1").await.unwrap());

    assert_eq!(pause.checkpoint, CheckpointName::AfterVerification);
    assert_eq!(pause.payload["review"], "fresh review");
    assert_eq!(member.calls(), 0);
}

#[tokio::test]
async fn test_resume_from_implementing_redoes_the_attempt() {
    let h = Harness::new().await;
    TaskRepository::create(&h.pool, "t1".to_string(), "do a thing".to_string())
        .await
        .unwrap();
    TaskRepository::set_plan(&h.pool, "t1", "the plan").await.unwrap();
    TaskRepository::update_state(&h.pool, "t1", "implementing", "in_progress")
        .await
        .unwrap();

    let machine = h.machine(
        ScriptedModel::new(vec![text("review")]),
        ScriptedModel::new(vec![text("redone summary")]),
    );
    let pause = pause_of(machine.resume("t1").await.unwrap());

    assert_eq!(pause.checkpoint, CheckpointName::AfterVerification);
    assert_eq!(pause.payload["summary"], "redone summary");
}

#[tokio::test]
async fn test_list_resumable_excludes_terminal_tasks() {
    let h = Harness::new().await;
    let machine = h.machine(
        ScriptedModel::new(vec![text("plan a"), text("plan b")]),
        ScriptedModel::unused(),
    );

    let first = pause_of(machine.start("task a").await.unwrap());
    let second = pause_of(machine.start("task b").await.unwrap());
    machine
        .decide(
            &second.task_id,
            CheckpointName::AfterPlanning,
            Decision::Reject {
                reason: "dropped".to_string(),
            },
        )
        .await
        .unwrap();

    let resumable = machine.list_resumable().await.unwrap();
    let ids: Vec<&str> = resumable.iter().map(|t| t.task_id.as_str()).collect();
    assert!(ids.contains(&first.task_id.as_str()));
    assert!(!ids.contains(&second.task_id.as_str()));

    let entry = resumable
        .iter()
        .find(|t| t.task_id == first.task_id)
        .unwrap();
    assert_eq!(entry.state, WorkflowState::PlanAwaitingApproval);
    assert_eq!(entry.latest_checkpoint.as_deref(), Some("after_planning"));
}
