//! Request and response types for chat generation.

use crate::messages::Message;
use crate::tools::ToolDefinition;
use serde::{Deserialize, Serialize};

/// A request to a chat model containing messages and configuration.
///
/// # Example
///
/// ```rust,ignore
/// let request = ChatRequest::new(vec![
///     Message::system("You are a planning assistant"),
///     Message::human("Add input validation to the signup form"),
/// ])
/// .with_temperature(0.2)
/// .with_max_tokens(2048);
/// ```
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// The conversation messages to send to the model.
    pub messages: Vec<Message>,

    /// Generation configuration.
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Create a new chat request with default configuration.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set the maximum number of tokens to generate.
    pub fn with_max_tokens(mut self, max_tokens: usize) -> Self {
        self.config.max_tokens = Some(max_tokens);
        self
    }

    /// Bind tools the model may call.
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.config.tools = tools;
        self
    }
}

/// Configuration parameters for chat generation.
#[derive(Debug, Clone, Default)]
pub struct ChatConfig {
    /// Sampling temperature; `None` uses the backend default.
    pub temperature: Option<f32>,

    /// Maximum tokens to generate; `None` uses the backend default.
    pub max_tokens: Option<usize>,

    /// Tools the model may call. Empty means no tool calling.
    pub tools: Vec<ToolDefinition>,
}

/// Token accounting for a completed generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Tokens in the prompt.
    pub input_tokens: usize,

    /// Tokens generated.
    pub output_tokens: usize,
}

impl UsageMetadata {
    /// Create usage metadata from input/output counts.
    pub fn new(input_tokens: usize, output_tokens: usize) -> Self {
        Self {
            input_tokens,
            output_tokens,
        }
    }

    /// Total token count.
    pub fn total(&self) -> usize {
        self.input_tokens + self.output_tokens
    }
}

/// A completed chat generation.
#[derive(Debug, Clone)]
pub struct ChatResponse {
    /// The assistant's message, possibly carrying tool calls.
    pub message: Message,

    /// Token usage, when the backend reports it.
    pub usage: Option<UsageMetadata>,
}

impl ChatResponse {
    /// Create a response wrapping an assistant message.
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
        }
    }

    /// Attach usage metadata.
    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tools::ToolDefinition;

    #[test]
    fn test_request_builder() {
        let request = ChatRequest::new(vec![Message::human("hi")])
            .with_temperature(0.5)
            .with_max_tokens(100)
            .with_tools(vec![ToolDefinition::new("read_file", "Read a file")]);

        assert_eq!(request.config.temperature, Some(0.5));
        assert_eq!(request.config.max_tokens, Some(100));
        assert_eq!(request.config.tools.len(), 1);
    }

    #[test]
    fn test_usage_total() {
        let usage = UsageMetadata::new(120, 30);
        assert_eq!(usage.total(), 150);
    }
}
