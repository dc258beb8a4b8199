//! Error types for the conversational core.

use ldm_core::error::LdmError;

/// Errors from the chat engine.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("query cannot be empty")]
    EmptyQuery,
    #[error("query exceeds maximum length of {0} characters")]
    QueryTooLong(usize),
    #[error("LLM error: {0}")]
    Llm(String),
    #[error("LLM backend returned status {status}: {body}")]
    UpstreamStatus { status: u16, body: String },
    #[error("malformed model: {0}")]
    MalformedModel(String),
    #[error("LLM returned an empty reply")]
    EmptyReply,
    #[error("configuration error: {0}")]
    Config(String),
    #[error("storage error: {0}")]
    StorageError(String),
}

impl ChatError {
    /// Whether the failure originated in the external language model.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            ChatError::Llm(_)
                | ChatError::UpstreamStatus { .. }
                | ChatError::MalformedModel(_)
                | ChatError::EmptyReply
        )
    }
}

impl From<ChatError> for LdmError {
    fn from(err: ChatError) -> Self {
        match err {
            ChatError::Config(msg) => LdmError::Config(msg),
            other => LdmError::Chat(other.to_string()),
        }
    }
}
