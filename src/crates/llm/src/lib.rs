//! Chat model abstraction and provider clients for codelead.
//!
//! The workflow engine talks to two language models (a lead that plans and
//! reviews, a member that implements with tools) through the [`ChatModel`]
//! trait defined here. Concrete clients exist for local and remote backends:
//!
//! - **Ollama** (`local` feature) - local model server with native tool
//!   calling via its `/api/chat` endpoint.
//! - **Claude** (`remote` feature) - Anthropic's messages API, including
//!   `tool_use` / `tool_result` content blocks.
//!
//! # Example
//!
//! ```rust,ignore
//! use llm::local::OllamaClient;
//! use llm::{ChatModel, ChatRequest, LocalLlmConfig, Message};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = LocalLlmConfig::new("http://localhost:11434", "qwen2.5-coder");
//!     let client = OllamaClient::new(config);
//!
//!     let request = ChatRequest::new(vec![Message::human("Outline a fix for issue #42")]);
//!     let response = client.chat(request).await?;
//!     println!("{}", response.message.content);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod messages;
pub mod request;
pub mod tools;
pub mod traits;

#[cfg(feature = "local")]
pub mod local;

#[cfg(feature = "remote")]
pub mod remote;

pub use config::{LocalLlmConfig, RemoteLlmConfig};
pub use error::{LlmError, Result};
pub use messages::{Message, MessageRole};
pub use request::{ChatConfig, ChatRequest, ChatResponse, UsageMetadata};
pub use tools::{ToolCall, ToolDefinition};
pub use traits::ChatModel;
