//! Intent classification: is the latest turn conversation or model work?
//!
//! The decision is delegated to the language model, which is asked for a
//! bare `CONVO` or `MODEL` label. Labels are parsed leniently; anything
//! unrecognisable is treated as conversation.

use std::sync::{Arc, LazyLock};

use ldm_core::types::{ChatTurn, Intent};
use regex::Regex;

use crate::backend::{ChatBackend, CompletionRequest, ResponseFormat};
use crate::error::ChatError;
use crate::prompts::{build_messages, INTENT_SYSTEM_PROMPT};

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(CONVO|MODEL)\b").expect("Invalid label regex"));

/// Parse a classifier reply into an [`Intent`].
///
/// Accepts surrounding whitespace, quotes, punctuation and any casing.
/// Returns `None` when neither label, or both labels, appear.
pub fn parse_intent_label(raw: &str) -> Option<Intent> {
    let upper = raw.to_uppercase();
    let mut found = LABEL_RE.find_iter(&upper).map(|m| m.as_str());
    let first = found.next()?;
    if found.any(|other| other != first) {
        return None;
    }
    match first {
        "CONVO" => Some(Intent::Convo),
        "MODEL" => Some(Intent::Model),
        _ => None,
    }
}

/// First pipeline stage: classify the pending query.
pub struct IntentClassifier {
    backend: Arc<dyn ChatBackend>,
}

impl IntentClassifier {
    pub fn new(backend: Arc<dyn ChatBackend>) -> Self {
        Self { backend }
    }

    /// Classify `query` in the context of `history`.
    pub async fn classify(&self, history: &[ChatTurn], query: &str) -> Result<Intent, ChatError> {
        let request = CompletionRequest {
            messages: build_messages(INTENT_SYSTEM_PROMPT, history, query),
            response_format: ResponseFormat::Text,
        };
        let raw = self.backend.complete(request).await?;

        Ok(match parse_intent_label(&raw) {
            Some(intent) => intent,
            None => {
                tracing::warn!(
                    backend = self.backend.name(),
                    label = %raw.trim(),
                    "Unrecognised intent label; treating as conversation"
                );
                Intent::Convo
            }
        })
    }
}
