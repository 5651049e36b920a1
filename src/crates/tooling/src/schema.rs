//! Tool schemas for function-calling models.

use llm::ToolDefinition;
use serde_json::json;

/// The fixed tool menu exposed to the implementing agent, as JSON Schema
/// definitions suitable for binding to a chat request.
pub fn coding_tool_schemas() -> Vec<ToolDefinition> {
    vec![
        ToolDefinition::new("read_file", "Read the content of a file in the workspace")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "path": {"type": "string", "description": "Workspace-relative file path"}
                },
                "required": ["path"]
            })),
        ToolDefinition::new(
            "write_file",
            "Write content to a file. Set review_gate to stage the change for human review instead of writing immediately",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Workspace-relative file path"},
                "content": {"type": "string", "description": "Full new file content"},
                "review_gate": {"type": "boolean", "description": "Stage instead of writing", "default": false}
            },
            "required": ["path", "content"]
        })),
        ToolDefinition::new(
            "edit_file",
            "Replace an exact substring in a file. The search string must occur exactly once",
        )
        .with_parameters(json!({
            "type": "object",
            "properties": {
                "path": {"type": "string", "description": "Workspace-relative file path"},
                "search": {"type": "string", "description": "Exact text to replace"},
                "replacement": {"type": "string", "description": "Replacement text"},
                "review_gate": {"type": "boolean", "description": "Stage instead of writing", "default": false}
            },
            "required": ["path", "search", "replacement"]
        })),
        ToolDefinition::new("list_files", "List files under a workspace directory, recursively")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "directory": {"type": "string", "description": "Directory to list", "default": "."}
                }
            })),
        ToolDefinition::new("search_code", "Search file contents with a regular expression")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "pattern": {"type": "string", "description": "Regular expression to search for"}
                },
                "required": ["pattern"]
            })),
        ToolDefinition::new("execute_code", "Run a code snippet in the sandbox and return its output")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "code": {"type": "string", "description": "Code to execute"}
                },
                "required": ["code"]
            })),
        ToolDefinition::new("run_tests", "Run the project test suite in the sandbox")
            .with_parameters(json!({
                "type": "object",
                "properties": {
                    "target": {"type": "string", "description": "Optional test target filter"}
                }
            })),
    ]
}
