//! Terminal driver for the approval gates.
//!
//! The machine parks at a gate and returns; this driver renders the pause
//! payload, collects a decision from the operator, and feeds it back in a
//! loop until the workflow reaches a terminal state.

use crate::workflow::{
    CheckpointName, Decision, PauseState, WorkflowMachine, WorkflowOutcome,
};
use crate::{OrchestratorError, Result};
use std::io::{BufRead, Write};

/// How the driver talks to the operator. A test double implements this to
/// script decisions.
pub trait Prompter: Send {
    /// Show text to the operator.
    fn show(&mut self, text: &str);

    /// Ask a question and return the operator's answer.
    fn ask(&mut self, question: &str) -> Result<String>;
}

/// Prompter over stdin/stdout.
pub struct StdinPrompter;

impl Prompter for StdinPrompter {
    fn show(&mut self, text: &str) {
        println!("{}", text);
    }

    fn ask(&mut self, question: &str) -> Result<String> {
        print!("{} ", question);
        std::io::stdout().flush()?;
        let mut line = String::new();
        std::io::stdin().lock().read_line(&mut line)?;
        Ok(line.trim().to_string())
    }
}

/// Runs workflows to completion, asking the operator at each gate.
pub struct InteractiveDriver<P: Prompter> {
    machine: WorkflowMachine,
    prompter: P,
}

impl<P: Prompter> InteractiveDriver<P> {
    pub fn new(machine: WorkflowMachine, prompter: P) -> Self {
        Self { machine, prompter }
    }

    /// Start a new workflow and drive it until it finishes.
    pub async fn run(&mut self, request: &str) -> Result<WorkflowOutcome> {
        let outcome = self.machine.start(request).await?;
        self.drive(outcome).await
    }

    /// Resume an existing workflow and drive it until it finishes.
    pub async fn resume(&mut self, task_id: &str) -> Result<WorkflowOutcome> {
        let outcome = self.machine.resume(task_id).await?;
        self.drive(outcome).await
    }

    async fn drive(&mut self, mut outcome: WorkflowOutcome) -> Result<WorkflowOutcome> {
        loop {
            match outcome {
                WorkflowOutcome::Pause(pause) => {
                    let decision = self.collect_decision(&pause)?;
                    outcome = self
                        .machine
                        .decide(&pause.task_id, pause.checkpoint, decision)
                        .await?;
                }
                WorkflowOutcome::Terminal(terminal) => {
                    self.prompter.show(&format!(
                        "Workflow {} finished: {}{}",
                        terminal.task_id,
                        terminal.state,
                        terminal
                            .detail
                            .as_deref()
                            .map(|d| format!(" ({})", d))
                            .unwrap_or_default()
                    ));
                    return Ok(WorkflowOutcome::Terminal(terminal));
                }
            }
        }
    }

    fn collect_decision(&mut self, pause: &PauseState) -> Result<Decision> {
        match pause.checkpoint {
            CheckpointName::AfterPlanning => self.collect_plan_decision(pause),
            CheckpointName::AfterVerification => self.collect_implementation_decision(pause),
            other => Err(OrchestratorError::Validation(format!(
                "no gate is defined at checkpoint {}",
                other
            ))),
        }
    }

    /// The machine rejects empty reasons and feedback at the API boundary,
    /// so collect them here until the operator supplies one.
    fn ask_non_empty(&mut self, question: &str) -> Result<String> {
        loop {
            let answer = self.prompter.ask(question)?;
            let answer = answer.trim();
            if !answer.is_empty() {
                return Ok(answer.to_string());
            }
            self.prompter.show("An answer is required.");
        }
    }

    fn collect_plan_decision(&mut self, pause: &PauseState) -> Result<Decision> {
        let plan = pause.payload["plan"].as_str().unwrap_or("(no plan)");
        self.prompter
            .show(&format!("=== Proposed plan ({}) ===\n{}", pause.task_id, plan));

        loop {
            let answer = self
                .prompter
                .ask("Approve plan? [a]pprove / [r]eject / [e]dit:")?;
            match answer.to_lowercase().as_str() {
                "a" | "approve" => return Ok(Decision::Approve),
                "r" | "reject" => {
                    let reason = self.ask_non_empty("Reason:")?;
                    return Ok(Decision::Reject { reason });
                }
                "e" | "edit" => {
                    let feedback = self.ask_non_empty("Feedback for the planner:")?;
                    return Ok(Decision::Edit { feedback });
                }
                _ => self.prompter.show("Please answer a, r, or e."),
            }
        }
    }

    fn collect_implementation_decision(&mut self, pause: &PauseState) -> Result<Decision> {
        let summary = pause.payload["summary"].as_str().unwrap_or("(no summary)");
        let review = pause.payload["review"].as_str().unwrap_or("(no review)");
        let verification = pause.payload["verification"]["passed"]
            .as_bool()
            .map(|p| if p { "passed" } else { "FAILED" })
            .unwrap_or("unknown");
        self.prompter.show(&format!(
            "=== Implementation ({}) ===\n{}\n\n--- Review ---\n{}\n\nVerification: {}",
            pause.task_id, summary, review, verification
        ));

        loop {
            let answer = self
                .prompter
                .ask("Accept implementation? [a]pprove / [r]eject / retr[y]:")?;
            match answer.to_lowercase().as_str() {
                "a" | "approve" => return Ok(Decision::Approve),
                "r" | "reject" => {
                    let reason = self.ask_non_empty("Reason:")?;
                    return Ok(Decision::Reject { reason });
                }
                "y" | "retry" => return Ok(Decision::Retry),
                _ => self.prompter.show("Please answer a, r, or y."),
            }
        }
    }
}
