//! Conversational core of the modeling assistant.
//!
//! Holds per-user chat history, classifies each turn as conversation or
//! model work, calls the language model for the matching reply, and orders
//! history for presentation.

pub mod backend;
pub mod error;
pub mod generator;
pub mod history;
pub mod intent;
pub mod orchestrator;
pub mod ordering;
pub mod prompts;
pub mod reply;

pub use backend::{
    ChatBackend, CompletionRequest, OpenAiCompatBackend, PromptMessage, PromptRole,
    ResponseFormat, ScriptedBackend,
};
pub use error::ChatError;
pub use generator::ModelGenerator;
pub use history::{HistoryStore, UserSession};
pub use intent::IntentClassifier;
pub use orchestrator::{AssistantReply, ChatExchange, ChatOrchestrator};
pub use ordering::order_history;
pub use reply::ReplyGenerator;
