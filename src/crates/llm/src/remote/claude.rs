//! Anthropic Claude client implementation.
//!
//! Uses the `/v1/messages` API. Tool calling is expressed with `tool_use`
//! blocks in assistant turns and `tool_result` blocks in user turns; this
//! client converts between those blocks and the crate's message types.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::remote::ClaudeClient;
//! use llm::{ChatModel, ChatRequest, Message, RemoteLlmConfig};
//!
//! let config = RemoteLlmConfig::from_env(
//!     "ANTHROPIC_API_KEY",
//!     "https://api.anthropic.com",
//!     "claude-sonnet-4-5",
//! )?;
//! let client = ClaudeClient::new(config);
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::RemoteLlmConfig;
use crate::error::{LlmError, Result};
use crate::messages::{Message, MessageRole};
use crate::request::{ChatRequest, ChatResponse, UsageMetadata};
use crate::tools::ToolCall;
use crate::traits::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_MAX_TOKENS: usize = 4096;

/// Anthropic Claude API client.
#[derive(Clone)]
pub struct ClaudeClient {
    config: RemoteLlmConfig,
    client: Client,
}

impl ClaudeClient {
    /// Create a new Claude client with the given configuration.
    pub fn new(config: RemoteLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// Convert messages to Claude format. System messages are hoisted into
    /// the top-level system prompt; consecutive tool results are merged into
    /// a single user turn because the API requires alternating roles.
    fn convert_messages(&self, messages: &[Message]) -> (Option<String>, Vec<ClaudeMessage>) {
        let mut system_prompt: Option<String> = None;
        let mut claude_messages: Vec<ClaudeMessage> = Vec::new();

        for msg in messages {
            match msg.role {
                MessageRole::System => {
                    system_prompt = Some(match system_prompt {
                        Some(existing) => format!("{}\n\n{}", existing, msg.content),
                        None => msg.content.clone(),
                    });
                }
                MessageRole::Human => {
                    claude_messages.push(ClaudeMessage {
                        role: "user".to_string(),
                        content: vec![ContentBlock::text(&msg.content)],
                    });
                }
                MessageRole::Assistant => {
                    let mut blocks = Vec::new();
                    if !msg.content.is_empty() {
                        blocks.push(ContentBlock::text(&msg.content));
                    }
                    if let Some(calls) = &msg.tool_calls {
                        for call in calls {
                            blocks.push(ContentBlock::tool_use(call));
                        }
                    }
                    if blocks.is_empty() {
                        blocks.push(ContentBlock::text(""));
                    }
                    claude_messages.push(ClaudeMessage {
                        role: "assistant".to_string(),
                        content: blocks,
                    });
                }
                MessageRole::Tool => {
                    let block = ContentBlock::tool_result(
                        msg.tool_call_id.as_deref().unwrap_or_default(),
                        &msg.content,
                    );
                    match claude_messages.last_mut() {
                        Some(last) if last.role == "user" && last.has_tool_results() => {
                            last.content.push(block);
                        }
                        _ => claude_messages.push(ClaudeMessage {
                            role: "user".to_string(),
                            content: vec![block],
                        }),
                    }
                }
            }
        }

        (system_prompt, claude_messages)
    }

    fn convert_response(&self, resp: ClaudeResponse) -> ChatResponse {
        let mut text = String::new();
        let mut tool_calls = Vec::new();

        for block in resp.content {
            match block.block_type.as_str() {
                "text" => {
                    if let Some(t) = block.text {
                        text.push_str(&t);
                    }
                }
                "tool_use" => {
                    tool_calls.push(ToolCall::new(
                        block.id.unwrap_or_default(),
                        block.name.unwrap_or_default(),
                        block.input.unwrap_or(serde_json::Value::Null),
                    ));
                }
                _ => {}
            }
        }

        let mut message = Message::assistant(text);
        if !tool_calls.is_empty() {
            message = message.with_tool_calls(tool_calls);
        }

        ChatResponse {
            message,
            usage: Some(UsageMetadata::new(
                resp.usage.input_tokens,
                resp.usage.output_tokens,
            )),
        }
    }
}

#[async_trait]
impl ChatModel for ClaudeClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/v1/messages", self.config.base_url);

        let (system, messages) = self.convert_messages(&request.messages);

        let tools: Vec<ClaudeTool> = request
            .config
            .tools
            .iter()
            .map(|t| ClaudeTool {
                name: t.name.clone(),
                description: t.description.clone(),
                input_schema: t
                    .parameters
                    .clone()
                    .unwrap_or_else(|| serde_json::json!({"type": "object"})),
            })
            .collect();

        let req_body = ClaudeRequest {
            model: self.config.model.clone(),
            messages,
            system,
            max_tokens: request.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: request.config.temperature,
            tools: if tools.is_empty() { None } else { Some(tools) },
        };

        tracing::debug!(
            model = %self.config.model,
            messages = req_body.messages.len(),
            "sending claude chat request"
        );
        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.config.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&req_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "claude returned an error status");

            return Err(match status.as_u16() {
                401 => LlmError::AuthenticationError(error_text),
                429 => LlmError::RateLimitExceeded(error_text),
                529 => LlmError::ServiceUnavailable(error_text),
                _ => LlmError::ProviderError(format!(
                    "Claude API error {}: {}",
                    status, error_text
                )),
            });
        }

        let claude_resp: ClaudeResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(self.convert_response(claude_resp))
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

// Claude API types
#[derive(Debug, Serialize)]
struct ClaudeRequest {
    model: String,
    messages: Vec<ClaudeMessage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<String>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<ClaudeTool>>,
}

#[derive(Debug, Serialize)]
struct ClaudeMessage {
    role: String,
    content: Vec<ContentBlock>,
}

impl ClaudeMessage {
    fn has_tool_results(&self) -> bool {
        self.content.iter().any(|b| b.block_type == "tool_result")
    }
}

#[derive(Debug, Serialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    input: Option<serde_json::Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_use_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
}

impl ContentBlock {
    fn text(text: &str) -> Self {
        Self {
            block_type: "text".to_string(),
            text: Some(text.to_string()),
            id: None,
            name: None,
            input: None,
            tool_use_id: None,
            content: None,
        }
    }

    fn tool_use(call: &ToolCall) -> Self {
        Self {
            block_type: "tool_use".to_string(),
            text: None,
            id: Some(call.id.clone()),
            name: Some(call.name.clone()),
            input: Some(call.arguments.clone()),
            tool_use_id: None,
            content: None,
        }
    }

    fn tool_result(tool_use_id: &str, content: &str) -> Self {
        Self {
            block_type: "tool_result".to_string(),
            text: None,
            id: None,
            name: None,
            input: None,
            tool_use_id: Some(tool_use_id.to_string()),
            content: Some(content.to_string()),
        }
    }
}

#[derive(Debug, Serialize)]
struct ClaudeTool {
    name: String,
    description: String,
    input_schema: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponse {
    content: Vec<ClaudeResponseBlock>,
    usage: ClaudeUsage,
}

#[derive(Debug, Deserialize)]
struct ClaudeResponseBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    input: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct ClaudeUsage {
    input_tokens: usize,
    output_tokens: usize,
}
