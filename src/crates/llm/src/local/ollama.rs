//! Ollama client implementation.
//!
//! Talks to a local Ollama server through its `/api/chat` endpoint, including
//! native function calling for models that support it (qwen2.5-coder,
//! llama3.1, mistral-nemo, ...).
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::local::OllamaClient;
//! use llm::{ChatModel, ChatRequest, LocalLlmConfig, Message};
//!
//! let config = LocalLlmConfig::new("http://localhost:11434", "qwen2.5-coder");
//! let client = OllamaClient::new(config);
//!
//! let request = ChatRequest::new(vec![Message::human("Hello!")]);
//! let response = client.chat(request).await?;
//! ```

use crate::config::LocalLlmConfig;
use crate::error::{LlmError, Result};
use crate::messages::{Message, MessageRole};
use crate::request::{ChatRequest, ChatResponse, UsageMetadata};
use crate::tools::ToolCall;
use crate::traits::ChatModel;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// Ollama client for local inference.
#[derive(Clone)]
pub struct OllamaClient {
    config: LocalLlmConfig,
    client: Client,
}

impl OllamaClient {
    /// Create a new Ollama client with the given configuration.
    pub fn new(config: LocalLlmConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .unwrap_or_default();

        Self { config, client }
    }

    /// Check if the Ollama server is running.
    pub async fn check_health(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.config.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    fn convert_message(&self, msg: &Message) -> OllamaMessage {
        OllamaMessage {
            role: match msg.role {
                MessageRole::System => "system".to_string(),
                MessageRole::Human => "user".to_string(),
                MessageRole::Assistant => "assistant".to_string(),
                MessageRole::Tool => "tool".to_string(),
            },
            content: msg.content.clone(),
            tool_calls: msg.tool_calls.as_ref().map(|calls| {
                calls
                    .iter()
                    .map(|c| OllamaToolCall {
                        function: OllamaFunctionCall {
                            name: c.name.clone(),
                            arguments: c.arguments.clone(),
                        },
                    })
                    .collect()
            }),
        }
    }

    fn convert_response(&self, resp: OllamaChatResponse) -> ChatResponse {
        // Ollama does not assign call ids; synthesize them so tool results
        // can be correlated further down the loop.
        let tool_calls: Option<Vec<ToolCall>> = resp.message.tool_calls.map(|calls| {
            calls
                .into_iter()
                .map(|c| {
                    ToolCall::new(
                        format!("call_{}", Uuid::new_v4()),
                        c.function.name,
                        c.function.arguments,
                    )
                })
                .collect()
        });

        let mut message = Message::assistant(resp.message.content);
        if let Some(calls) = tool_calls {
            message = message.with_tool_calls(calls);
        }

        let usage = match (resp.prompt_eval_count, resp.eval_count) {
            (None, None) => None,
            (input, output) => Some(UsageMetadata::new(
                input.unwrap_or(0),
                output.unwrap_or(0),
            )),
        };

        ChatResponse { message, usage }
    }
}

#[async_trait]
impl ChatModel for OllamaClient {
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
        let url = format!("{}/api/chat", self.config.base_url);

        let messages: Vec<OllamaMessage> = request
            .messages
            .iter()
            .map(|m| self.convert_message(m))
            .collect();

        let mut options = HashMap::new();
        if let Some(temp) = request.config.temperature {
            options.insert("temperature", serde_json::Value::from(temp));
        }
        if let Some(max_tokens) = request.config.max_tokens {
            options.insert("num_predict", serde_json::Value::from(max_tokens));
        }

        let tools: Vec<OllamaTool> = request
            .config
            .tools
            .iter()
            .map(|t| OllamaTool {
                tool_type: "function".to_string(),
                function: OllamaFunctionDef {
                    name: t.name.clone(),
                    description: t.description.clone(),
                    parameters: t.parameters.clone(),
                },
            })
            .collect();

        let req_body = OllamaChatRequest {
            model: self.config.model.clone(),
            messages,
            stream: false,
            tools: if tools.is_empty() { None } else { Some(tools) },
            options: if options.is_empty() {
                None
            } else {
                Some(options)
            },
        };

        tracing::debug!(
            model = %self.config.model,
            messages = req_body.messages.len(),
            "sending ollama chat request"
        );
        let response = self.client.post(&url).json(&req_body).send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "ollama returned an error status");
            return Err(LlmError::ProviderError(format!(
                "Ollama API error {}: {}",
                status, error_text
            )));
        }

        let ollama_resp: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(e.to_string()))?;

        Ok(self.convert_response(ollama_resp))
    }

    async fn is_available(&self) -> Result<bool> {
        self.check_health().await
    }

    fn clone_box(&self) -> Box<dyn ChatModel> {
        Box::new(self.clone())
    }
}

// Ollama API types
#[derive(Debug, Serialize)]
struct OllamaChatRequest {
    model: String,
    messages: Vec<OllamaMessage>,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Vec<OllamaTool>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    options: Option<HashMap<&'static str, serde_json::Value>>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaMessage {
    role: String,
    #[serde(default)]
    content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<OllamaToolCall>>,
}

#[derive(Debug, Serialize)]
struct OllamaTool {
    #[serde(rename = "type")]
    tool_type: String,
    function: OllamaFunctionDef,
}

#[derive(Debug, Serialize)]
struct OllamaFunctionDef {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaToolCall {
    function: OllamaFunctionCall,
}

#[derive(Debug, Serialize, Deserialize)]
struct OllamaFunctionCall {
    name: String,
    #[serde(default)]
    arguments: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
    #[serde(default)]
    prompt_eval_count: Option<usize>,
    #[serde(default)]
    eval_count: Option<usize>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> OllamaClient {
        OllamaClient::new(LocalLlmConfig::new(
            "http://localhost:11434",
            "qwen2.5-coder",
        ))
    }

    #[test]
    fn test_message_conversion_roles() {
        let c = client();
        assert_eq!(c.convert_message(&Message::system("s")).role, "system");
        assert_eq!(c.convert_message(&Message::human("h")).role, "user");
        assert_eq!(c.convert_message(&Message::tool("r", "call_1")).role, "tool");
    }

    #[test]
    fn test_response_conversion_synthesizes_call_ids() {
        let c = client();
        let resp = OllamaChatResponse {
            message: OllamaMessage {
                role: "assistant".to_string(),
                content: String::new(),
                tool_calls: Some(vec![OllamaToolCall {
                    function: OllamaFunctionCall {
                        name: "read_file".to_string(),
                        arguments: json!({"path": "src/lib.rs"}),
                    },
                }]),
            },
            prompt_eval_count: Some(12),
            eval_count: Some(3),
        };

        let converted = c.convert_response(resp);
        let calls = converted.message.tool_calls.unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].id.starts_with("call_"));
        assert_eq!(calls[0].name, "read_file");
        assert_eq!(converted.usage.unwrap().total(), 15);
    }

    #[test]
    fn test_tool_definition_serialization() {
        let tool = OllamaTool {
            tool_type: "function".to_string(),
            function: OllamaFunctionDef {
                name: "list_files".to_string(),
                description: "List files".to_string(),
                parameters: Some(json!({"type": "object"})),
            },
        };
        let encoded = serde_json::to_value(&tool).unwrap();
        assert_eq!(encoded["type"], "function");
        assert_eq!(encoded["function"]["name"], "list_files");
    }
}
