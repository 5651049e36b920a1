//! The member agent: a bounded tool-use loop around the member model.

use crate::workflow::{ImplementationArtifact, ToolInvocation};
use crate::Result;
use llm::{ChatModel, ChatRequest, Message};
use tooling::{coding_tool_schemas, ToolExecutor};

/// Most of a tool result is useful to the model; only a slice of it is
/// worth keeping in the audit trail.
const AUDIT_OUTCOME_LIMIT: usize = 400;

const MEMBER_SYSTEM_PROMPT: &str = "You are a software engineer implementing an approved plan. \
You have tools to read, write, and search files in the workspace, run code snippets, and run \
tests. Work through the plan step by step. Use tools to make the changes; do not just describe \
them. When the implementation is complete, reply without any tool call and summarize what you \
changed and why.";

/// Drives the member model through tool calls until it answers without one
/// or the iteration ceiling is reached.
pub struct MemberAgent {
    model: Box<dyn ChatModel>,
    max_iterations: usize,
}

impl MemberAgent {
    pub fn new(model: Box<dyn ChatModel>, max_iterations: usize) -> Self {
        Self {
            model,
            max_iterations,
        }
    }

    /// Run one implementation attempt against the given executor.
    ///
    /// Tool failures (security rejections included) are not fatal: they are
    /// fed back to the model as tool results so it can adjust. Only a
    /// capability failure propagates as an error.
    pub async fn run(
        &self,
        executor: &mut ToolExecutor,
        request: &str,
        plan: &str,
        context: &str,
    ) -> Result<ImplementationArtifact> {
        let mut messages = vec![
            Message::system(MEMBER_SYSTEM_PROMPT),
            Message::human(format!(
                "Task: {}\n\nApproved plan:\n{}\n\nWorkspace:\n{}",
                request, plan, context
            )),
        ];
        let mut invocations: Vec<ToolInvocation> = Vec::new();
        let tools = coding_tool_schemas();

        for iteration in 1..=self.max_iterations {
            let request = ChatRequest::new(messages.clone()).with_tools(tools.clone());
            let response = self.model.chat(request).await?;
            let assistant = response.message;

            let tool_calls = match &assistant.tool_calls {
                Some(calls) if !calls.is_empty() => calls.clone(),
                _ => {
                    tracing::info!(iterations = iteration, "member agent finished");
                    return Ok(ImplementationArtifact {
                        success: true,
                        summary: assistant.content,
                        iterations: iteration as u32,
                        tool_invocations: invocations,
                        files_changed: executor.changed_files(),
                    });
                }
            };

            messages.push(assistant.clone());
            for call in tool_calls {
                let outcome = match executor.execute(&call.name, &call.arguments).await {
                    Ok(result) => result,
                    Err(e) => {
                        tracing::warn!(tool = %call.name, error = %e, "tool call failed");
                        format!("Error: {}", e)
                    }
                };
                invocations.push(ToolInvocation {
                    tool: call.name.clone(),
                    arguments: call.arguments.clone(),
                    outcome: truncate(&outcome, AUDIT_OUTCOME_LIMIT),
                });
                messages.push(Message::tool(outcome, &call.id));
            }
        }

        tracing::warn!(
            max_iterations = self.max_iterations,
            "member agent hit the iteration ceiling"
        );
        Ok(ImplementationArtifact {
            success: false,
            summary: format!(
                "Stopped after {} iterations without a final answer.",
                self.max_iterations
            ),
            iterations: self.max_iterations as u32,
            tool_invocations: invocations,
            files_changed: executor.changed_files(),
        })
    }
}

fn truncate(text: &str, limit: usize) -> String {
    if text.len() <= limit {
        return text.to_string();
    }
    let mut end = limit;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}…", &text[..end])
}
