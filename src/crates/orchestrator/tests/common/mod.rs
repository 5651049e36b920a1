//! Shared test doubles and setup for the workflow integration tests.

#![allow(dead_code)]

use async_trait::async_trait;
use llm::{ChatModel, ChatRequest, ChatResponse, LlmError, Message, ToolCall};
use orchestrator::config::OrchestratorConfig;
use orchestrator::db::{connect, init_schema, DatabasePool};
use orchestrator::workflow::WorkflowMachine;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tempfile::TempDir;

/// Chat model double that replays a fixed script of responses.
///
/// Clones share the script, so the machine's internal clone of the member
/// model drains the same queue. An exhausted script fails the call, which
/// makes "this model must not be called" assertions implicit.
pub struct ScriptedModel {
    script: Arc<Mutex<VecDeque<Result<Message, LlmError>>>>,
    calls: Arc<AtomicUsize>,
}

impl ScriptedModel {
    pub fn new(script: Vec<Result<Message, LlmError>>) -> Self {
        Self {
            script: Arc::new(Mutex::new(script.into_iter().collect())),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// A model that fails the test if it is called at all.
    pub fn unused() -> Self {
        Self::new(Vec::new())
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// A second handle onto the same script and call counter.
    pub fn handle(&self) -> ScriptedModel {
        ScriptedModel {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
        }
    }
}

#[async_trait]
impl ChatModel for ScriptedModel {
    async fn chat(&self, _request: ChatRequest) -> Result<ChatResponse, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(LlmError::ProviderError("script exhausted".to_string())));
        next.map(ChatResponse::new)
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(ScriptedModel {
            script: Arc::clone(&self.script),
            calls: Arc::clone(&self.calls),
        })
    }
}

/// A plain assistant reply.
pub fn text(content: &str) -> Result<Message, LlmError> {
    Ok(Message::assistant(content))
}

/// An assistant reply carrying a single tool call.
pub fn tool_call(name: &str, arguments: serde_json::Value) -> Result<Message, LlmError> {
    let id = format!("call_{}", uuid::Uuid::new_v4());
    Ok(Message::assistant("").with_tool_calls(vec![ToolCall::new(id, name, arguments)]))
}

/// A capability failure.
pub fn outage() -> Result<Message, LlmError> {
    Err(LlmError::ServiceUnavailable("scripted outage".to_string()))
}

pub struct Harness {
    pub dir: TempDir,
    pub pool: DatabasePool,
}

impl Harness {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let pool = connect("sqlite::memory:").await.unwrap();
        init_schema(&pool).await.unwrap();
        Harness { dir, pool }
    }

    pub fn config(&self) -> OrchestratorConfig {
        OrchestratorConfig::new(self.dir.path())
    }

    pub fn machine(&self, lead: ScriptedModel, member: ScriptedModel) -> WorkflowMachine {
        self.machine_with_config(self.config(), lead, member)
    }

    pub fn machine_with_config(
        &self,
        config: OrchestratorConfig,
        lead: ScriptedModel,
        member: ScriptedModel,
    ) -> WorkflowMachine {
        WorkflowMachine::new(self.pool.clone(), config, Box::new(lead), Box::new(member))
    }
}
