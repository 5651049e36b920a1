//! Tool calling types for function-calling models.
//!
//! The flow is the usual one: bind [`ToolDefinition`]s to a request, receive
//! [`ToolCall`]s in the assistant message, execute them, and send the results
//! back as tool messages keyed by call id.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// Definition of a tool/function that a model can call.
///
/// `parameters` is a JSON Schema object (`type: "object"` with `properties`
/// and `required`), which is what every supported backend expects.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Unique name of the tool within the bound set.
    pub name: String,

    /// Human-readable description the model uses to decide when to call it.
    pub description: String,

    /// JSON Schema describing the tool's parameters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parameters: Option<JsonValue>,
}

impl ToolDefinition {
    /// Create a new tool definition with name and description.
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: None,
        }
    }

    /// Add a JSON Schema for the tool's parameters.
    pub fn with_parameters(mut self, parameters: JsonValue) -> Self {
        self.parameters = Some(parameters);
        self
    }
}

/// A request from the model to invoke a specific tool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolCall {
    /// Identifier tying this call to its eventual result message. Backends
    /// that do not issue ids get one synthesized client-side.
    pub id: String,

    /// Name of the tool to call, matching a `ToolDefinition::name`.
    pub name: String,

    /// Arguments as a JSON object matching the tool's schema.
    pub arguments: JsonValue,
}

impl ToolCall {
    /// Create a new tool call.
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: JsonValue) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_tool_definition_builder() {
        let tool = ToolDefinition::new("read_file", "Read a file from the workspace")
            .with_parameters(json!({
                "type": "object",
                "properties": {"path": {"type": "string"}},
                "required": ["path"]
            }));

        assert_eq!(tool.name, "read_file");
        assert!(tool.parameters.is_some());
    }

    #[test]
    fn test_tool_call_arguments() {
        let call = ToolCall::new("call_1", "search_code", json!({"pattern": "fn main"}));
        assert_eq!(call.arguments["pattern"], "fn main");
    }

    #[test]
    fn test_definition_serializes_without_null_parameters() {
        let tool = ToolDefinition::new("list_files", "List files");
        let encoded = serde_json::to_string(&tool).unwrap();
        assert!(!encoded.contains("parameters"));
    }
}
