//! The workflow state machine, its outcomes, and its drivers.

pub mod interactive;
pub mod machine;
pub mod outcome;
pub mod resume;
pub mod state;

pub use interactive::{InteractiveDriver, Prompter, StdinPrompter};
pub use machine::WorkflowMachine;
pub use outcome::{
    CheckpointName, Decision, ImplementationArtifact, PauseState, TerminalState, ToolInvocation,
    VerificationCheck, VerificationReport, WorkflowOutcome,
};
pub use resume::ResumableTask;
pub use state::WorkflowState;
