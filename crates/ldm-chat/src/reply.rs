//! Free-text replies for `CONVO` turns.

use std::sync::Arc;

use ldm_core::types::ChatTurn;

use crate::backend::{ChatBackend, CompletionRequest, ResponseFormat};
use crate::error::ChatError;
use crate::prompts::{build_messages, CONVO_SYSTEM_PROMPT};

/// Second pipeline stage for conversational turns.
pub struct ReplyGenerator {
    backend: Arc<dyn ChatBackend>,
}

impl ReplyGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    pub async fn reply(&self, history: &[ChatTurn], query: &str) -> Result<String, ChatError> {
        let request = CompletionRequest {
            messages: build_messages(CONVO_SYSTEM_PROMPT, history, query),
            response_format: ResponseFormat::Text,
        };
        let text = self.backend.complete(request).await?;
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(ChatError::EmptyReply);
        }
        Ok(trimmed.to_string())
    }
}
