//! Chat orchestrator: central coordinator wiring history, intent and replies.
//!
//! Each query runs as a two-step pipeline under the user's session lock:
//! classify, then either generate a model or a conversational reply. The
//! user and assistant turns are committed together once the reply exists,
//! so a failed upstream call leaves history untouched.

use std::sync::Arc;
use std::time::Instant;

use ldm_core::config::{ChatConfig, StructuredOutput};
use ldm_core::types::{ChatTurn, Intent, LogicalDataModel};

use crate::backend::ChatBackend;
use crate::error::ChatError;
use crate::generator::ModelGenerator;
use crate::history::{HistoryStore, UserSession};
use crate::intent::IntentClassifier;
use crate::ordering::order_history;
use crate::reply::ReplyGenerator;

/// Typed result of the second pipeline stage.
#[derive(Clone, Debug, PartialEq)]
pub enum AssistantReply {
    Conversational(String),
    ModelUpdate(LogicalDataModel),
}

impl AssistantReply {
    fn into_turn(self) -> ChatTurn {
        match self {
            AssistantReply::Conversational(text) => ChatTurn::assistant_text(text),
            AssistantReply::ModelUpdate(model) => ChatTurn::assistant_model(model),
        }
    }
}

/// Outcome of one handled query.
#[derive(Clone, Debug)]
pub struct ChatExchange {
    pub intent: Intent,
    pub reply: AssistantReply,
    /// Full history after the exchange, in presentation order.
    pub messages: Vec<ChatTurn>,
}

/// Central chat orchestrator.
pub struct ChatOrchestrator {
    history: Arc<HistoryStore>,
    classifier: IntentClassifier,
    generator: ModelGenerator,
    replier: ReplyGenerator,
    config: ChatConfig,
}

impl ChatOrchestrator {
    /// Create an orchestrator whose stages share one backend.
    pub fn new(
        backend: Arc<dyn ChatBackend>,
        history: Arc<HistoryStore>,
        config: ChatConfig,
        structured_output: StructuredOutput,
    ) -> Self {
        Self {
            history,
            classifier: IntentClassifier::new(Arc::clone(&backend)),
            generator: ModelGenerator::new(Arc::clone(&backend), structured_output),
            replier: ReplyGenerator::new(backend),
            config,
        }
    }

    pub fn history_store(&self) -> &Arc<HistoryStore> {
        &self.history
    }

    /// Handle an incoming query for `user_id`.
    pub async fn handle_message(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<ChatExchange, ChatError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(ChatError::EmptyQuery);
        }
        if query.chars().count() > self.config.max_query_chars {
            return Err(ChatError::QueryTooLong(self.config.max_query_chars));
        }

        let started = Instant::now();
        let mut session = self.history.session(user_id).await?;

        let (intent, reply) = match self.respond(&session, query).await {
            Ok(outcome) => outcome,
            Err(e) => {
                drop(session);
                self.history.release_if_empty(user_id)?;
                return Err(e);
            }
        };

        session.commit_exchange(ChatTurn::user(query), reply.clone().into_turn());
        let messages = order_history(session.turns());

        tracing::info!(
            user_id,
            %intent,
            turns = messages.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Query handled"
        );

        Ok(ChatExchange {
            intent,
            reply,
            messages,
        })
    }

    /// Classify `query` and produce the matching reply.
    async fn respond(
        &self,
        session: &UserSession,
        query: &str,
    ) -> Result<(Intent, AssistantReply), ChatError> {
        let intent = self.classifier.classify(session.turns(), query).await?;
        tracing::debug!(user_id = session.user_id(), %intent, "Query classified");

        let reply = match intent {
            Intent::Model => {
                let model = self
                    .generator
                    .generate(session.turns(), query, session.latest_model())
                    .await?;
                AssistantReply::ModelUpdate(model)
            }
            Intent::Convo => {
                AssistantReply::Conversational(self.replier.reply(session.turns(), query).await?)
            }
        };
        Ok((intent, reply))
    }

    /// Ordered history for `user_id`.
    pub async fn history(&self, user_id: &str) -> Result<Vec<ChatTurn>, ChatError> {
        let turns = self.history.get(user_id).await?;
        Ok(order_history(&turns))
    }

    /// Clear history for `user_id`.
    pub async fn reset(&self, user_id: &str) -> Result<(), ChatError> {
        self.history.reset(user_id).await?;
        tracing::info!(user_id, "Conversation reset");
        Ok(())
    }

    /// The most recent model generated for `user_id`.
    pub async fn latest_model(&self, user_id: &str) -> Result<Option<LogicalDataModel>, ChatError> {
        let turns = self.history.get(user_id).await?;
        Ok(turns.iter().rev().find_map(|t| t.content.as_model()).cloned())
    }
}

// =============================================================================
// Tests
// =============================================================================
