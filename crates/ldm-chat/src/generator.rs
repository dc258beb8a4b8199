//! Model generation: ask the language model for a full logical data model.

use std::sync::{Arc, LazyLock};

use ldm_core::config::StructuredOutput;
use ldm_core::types::{ChatTurn, LogicalDataModel};
use regex::Regex;

use crate::backend::{ChatBackend, CompletionRequest, ResponseFormat};
use crate::error::ChatError;
use crate::prompts::{build_messages, MODEL_SYSTEM_PROMPT};

static FENCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)^\s*```[a-zA-Z]*\s*(.*?)\s*```\s*$").expect("Invalid fence regex")
});

/// Pull the JSON object out of a reply that may be wrapped in a code fence
/// or surrounded by stray prose.
fn extract_json(raw: &str) -> &str {
    if let Some(inner) = FENCE_RE.captures(raw).and_then(|c| c.get(1)) {
        return inner.as_str();
    }
    match (raw.find('{'), raw.rfind('}')) {
        (Some(start), Some(end)) if start < end => &raw[start..=end],
        _ => raw.trim(),
    }
}

/// Parse a generator reply into a model.
pub fn parse_model(raw: &str) -> Result<LogicalDataModel, ChatError> {
    serde_json::from_str(extract_json(raw)).map_err(|e| ChatError::MalformedModel(e.to_string()))
}

/// Second pipeline stage for `MODEL` turns.
pub struct ModelGenerator {
    backend: Arc<dyn ChatBackend>,
    structured_output: StructuredOutput,
}

impl ModelGenerator {
    pub fn new(backend: Arc<dyn ChatBackend>, structured_output: StructuredOutput) -> Self {
        Self {
            backend,
            structured_output,
        }
    }

    fn response_format(&self) -> ResponseFormat {
        match self.structured_output {
            StructuredOutput::JsonObject => ResponseFormat::JsonObject,
            StructuredOutput::JsonSchema => ResponseFormat::JsonSchema {
                name: "logical_data_model".to_string(),
                schema: LogicalDataModel::json_schema(),
            },
        }
    }

    /// Generate the complete model for `query`.
    ///
    /// `previous` is the last model in the conversation; it already appears
    /// in `history` and is only used to fill in a blank id or name.
    pub async fn generate(
        &self,
        history: &[ChatTurn],
        query: &str,
        previous: Option<&LogicalDataModel>,
    ) -> Result<LogicalDataModel, ChatError> {
        let request = CompletionRequest {
            messages: build_messages(MODEL_SYSTEM_PROMPT, history, query),
            response_format: self.response_format(),
        };
        let raw = self.backend.complete(request).await?;

        let mut model = parse_model(&raw).map_err(|e| {
            tracing::warn!(backend = self.backend.name(), error = %e, "Generator returned malformed JSON");
            e
        })?;
        model.inherit_identity(previous);

        for issue in model.validate() {
            tracing::warn!(model_id = %model.id, %issue, "Generated model violates an invariant");
        }

        tracing::info!(
            model_id = %model.id,
            entities = model.entities.len(),
            relationships = model.relationships.len(),
            update = previous.is_some(),
            "Model generated"
        );

        Ok(model)
    }
}
