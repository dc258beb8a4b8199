//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use ldm_chat::{ChatBackend, ChatOrchestrator, HistoryStore};
use ldm_core::config::LdmConfig;

/// Shared application state.
///
/// All fields use `Arc` for cheap cloning across handler tasks.
#[derive(Clone)]
pub struct AppState {
    /// Application configuration.
    pub config: Arc<LdmConfig>,
    /// Conversation pipeline and the history it owns.
    pub orchestrator: Arc<ChatOrchestrator>,
    /// Server start time for uptime calculation.
    pub start_time: Instant,
}

impl AppState {
    /// Build state around a language-model backend with a fresh history store.
    pub fn new(config: LdmConfig, backend: Arc<dyn ChatBackend>) -> Self {
        let orchestrator = ChatOrchestrator::new(
            backend,
            Arc::new(HistoryStore::new()),
            config.chat.clone(),
            config.llm.structured_output,
        );
        Self {
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            start_time: Instant::now(),
        }
    }
}
