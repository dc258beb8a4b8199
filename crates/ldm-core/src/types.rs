use std::collections::HashSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Enums
// =============================================================================

/// Author of a chat turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Wire name used by the Chat Completions API.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classification of a user turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Intent {
    /// Plain conversation; answered with free text.
    Convo,
    /// Create or update the logical data model.
    Model,
}

impl Intent {
    /// The literal label the classifier is instructed to emit.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::Convo => "CONVO",
            Intent::Model => "MODEL",
        }
    }
}

impl fmt::Display for Intent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// =============================================================================
// Chat turns
// =============================================================================

/// Body of a chat turn: free text, or a structured model for assistant
/// turns produced by the model generator.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TurnContent {
    Text(String),
    Model(LogicalDataModel),
}

impl TurnContent {
    /// Render the content as the text sent back to the language model.
    ///
    /// Models are serialized as compact JSON so the generator sees exactly
    /// what it produced last time.
    pub fn to_prompt_text(&self) -> String {
        match self {
            TurnContent::Text(text) => text.clone(),
            TurnContent::Model(model) => {
                serde_json::to_string(model).unwrap_or_else(|_| String::from("{}"))
            }
        }
    }

    pub fn as_model(&self) -> Option<&LogicalDataModel> {
        match self {
            TurnContent::Model(model) => Some(model),
            TurnContent::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            TurnContent::Text(text) => Some(text),
            TurnContent::Model(_) => None,
        }
    }
}

/// A single message in a user's conversation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ChatTurn {
    pub role: Role,
    pub content: TurnContent,
    pub timestamp: DateTime<Utc>,
}

impl ChatTurn {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: TurnContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant_text(text: impl Into<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Text(text.into()),
            timestamp: Utc::now(),
        }
    }

    pub fn assistant_model(model: LogicalDataModel) -> Self {
        Self {
            role: Role::Assistant,
            content: TurnContent::Model(model),
            timestamp: Utc::now(),
        }
    }
}

// =============================================================================
// Logical data model
// =============================================================================

/// Entities, attributes and relationships, independent of physical storage.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogicalDataModel {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entity {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub attributes: Vec<Attribute>,
    #[serde(default)]
    pub position: Position,
}

/// Canvas coordinates of an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attribute {
    pub id: String,
    pub name: String,
    #[serde(rename = "type", default)]
    pub data_type: String,
    #[serde(default)]
    pub is_primary_key: bool,
    #[serde(default)]
    pub is_foreign_key: bool,
    /// Data classification label, e.g. `PII` or `Public`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub classification: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Relationship {
    pub id: String,
    pub from_entity: String,
    pub to_entity: String,
    /// Cardinality, e.g. `one-to-many`.
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub name: String,
}

/// A violation of the intended model invariants.
///
/// The generator is instructed to respect these; nothing rejects a model
/// that breaks them.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ModelIssue {
    DuplicateEntityId(String),
    DanglingRelationship { relationship: String, entity: String },
    MultiplePrimaryKeys { entity: String, count: usize },
}

impl fmt::Display for ModelIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelIssue::DuplicateEntityId(id) => write!(f, "duplicate entity id '{}'", id),
            ModelIssue::DanglingRelationship {
                relationship,
                entity,
            } => write!(
                f,
                "relationship '{}' references unknown entity '{}'",
                relationship, entity
            ),
            ModelIssue::MultiplePrimaryKeys { entity, count } => {
                write!(f, "entity '{}' has {} primary keys", entity, count)
            }
        }
    }
}

impl LogicalDataModel {
    /// Find an entity by name, ignoring ASCII case.
    pub fn entity_named(&self, name: &str) -> Option<&Entity> {
        self.entities
            .iter()
            .find(|e| e.name.eq_ignore_ascii_case(name))
    }

    /// Check the intended invariants and report every violation found.
    pub fn validate(&self) -> Vec<ModelIssue> {
        let mut issues = Vec::new();
        let mut seen = HashSet::new();

        for entity in &self.entities {
            if !seen.insert(entity.id.as_str()) {
                issues.push(ModelIssue::DuplicateEntityId(entity.id.clone()));
            }
            let pk_count = entity.primary_keys().count();
            if pk_count > 1 {
                issues.push(ModelIssue::MultiplePrimaryKeys {
                    entity: entity.id.clone(),
                    count: pk_count,
                });
            }
        }

        for rel in &self.relationships {
            for endpoint in [&rel.from_entity, &rel.to_entity] {
                if !seen.contains(endpoint.as_str()) {
                    issues.push(ModelIssue::DanglingRelationship {
                        relationship: rel.id.clone(),
                        entity: endpoint.clone(),
                    });
                }
            }
        }

        issues
    }

    /// Carry `id` and `name` over from the previous model when the
    /// replacement leaves them blank. A first model without an id gets a
    /// fresh one.
    pub fn inherit_identity(&mut self, previous: Option<&LogicalDataModel>) {
        if self.id.trim().is_empty() {
            self.id = match previous {
                Some(prev) if !prev.id.is_empty() => prev.id.clone(),
                _ => Uuid::new_v4().to_string(),
            };
        }
        if self.name.trim().is_empty() {
            if let Some(prev) = previous {
                self.name = prev.name.clone();
            }
        }
    }

    /// JSON Schema describing the model, used for schema-constrained output.
    pub fn json_schema() -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "id": { "type": "string" },
                "name": { "type": "string" },
                "entities": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "attributes": {
                                "type": "array",
                                "items": {
                                    "type": "object",
                                    "properties": {
                                        "id": { "type": "string" },
                                        "name": { "type": "string" },
                                        "type": { "type": "string" },
                                        "isPrimaryKey": { "type": "boolean" },
                                        "isForeignKey": { "type": "boolean" },
                                        "classification": { "type": "string" }
                                    },
                                    "required": ["id", "name", "type", "isPrimaryKey", "isForeignKey"]
                                }
                            },
                            "position": {
                                "type": "object",
                                "properties": {
                                    "x": { "type": "number" },
                                    "y": { "type": "number" }
                                },
                                "required": ["x", "y"]
                            }
                        },
                        "required": ["id", "name", "attributes", "position"]
                    }
                },
                "relationships": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "fromEntity": { "type": "string" },
                            "toEntity": { "type": "string" },
                            "type": {
                                "type": "string",
                                "enum": ["one-to-one", "one-to-many", "many-to-one", "many-to-many"]
                            },
                            "name": { "type": "string" }
                        },
                        "required": ["id", "fromEntity", "toEntity", "type", "name"]
                    }
                }
            },
            "required": ["id", "name", "entities", "relationships"]
        })
    }
}

impl Entity {
    pub fn primary_keys(&self) -> impl Iterator<Item = &Attribute> {
        self.attributes.iter().filter(|a| a.is_primary_key)
    }
}

// =============================================================================
// Tests
// =============================================================================
