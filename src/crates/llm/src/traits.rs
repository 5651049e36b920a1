//! The core chat model trait.

use crate::error::Result;
use crate::request::{ChatRequest, ChatResponse};
use crate::tools::ToolDefinition;
use async_trait::async_trait;

/// Provider-agnostic interface to a chat-based language model.
///
/// Implementations handle message conversion, the API call, and parsing the
/// response for their particular backend. A well-formed completion with empty
/// content is a successful response; errors are reserved for connectivity,
/// authentication, and malformed payloads.
///
/// Implementations must be `Send + Sync`; share them as `Arc<dyn ChatModel>`
/// or clone through [`ChatModel::clone_box`].
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete chat response from messages.
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Check if the backend is reachable and healthy.
    ///
    /// Useful for local servers that may not be running. The default
    /// implementation assumes availability.
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Tools bound to this model, if any.
    fn bound_tools(&self) -> Vec<ToolDefinition> {
        Vec::new()
    }

    /// Clone this model into a boxed trait object.
    fn clone_box(&self) -> Box<dyn ChatModel>;
}

impl Clone for Box<dyn ChatModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::messages::Message;
    use std::sync::Arc;

    #[derive(Clone)]
    struct EchoModel;

    #[async_trait]
    impl ChatModel for EchoModel {
        async fn chat(&self, request: ChatRequest) -> Result<ChatResponse> {
            let text = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(ChatResponse::new(Message::assistant(text)))
        }

        fn clone_box(&self) -> Box<dyn ChatModel> {
            Box::new(self.clone())
        }
    }

    #[tokio::test]
    async fn test_trait_object() {
        let model: Arc<dyn ChatModel> = Arc::new(EchoModel);
        let response = model
            .chat(ChatRequest::new(vec![Message::human("ping")]))
            .await
            .unwrap();
        assert_eq!(response.message.content, "ping");
    }

    #[tokio::test]
    async fn test_default_is_available() {
        assert!(EchoModel.is_available().await.unwrap());
    }

    #[test]
    fn test_boxed_clone() {
        let boxed: Box<dyn ChatModel> = Box::new(EchoModel);
        let _copy = boxed.clone();
    }
}
