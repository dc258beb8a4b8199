use thiserror::Error;

/// Top-level error type for the modeling assistant.
///
/// Subsystem crates define their own error types and implement
/// `From<SubsystemError> for LdmError` where they cross into the binary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LdmError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Chat error: {0}")]
    Chat(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for LdmError {
    fn from(err: toml::de::Error) -> Self {
        LdmError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for LdmError {
    fn from(err: toml::ser::Error) -> Self {
        LdmError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for LdmError {
    fn from(err: serde_json::Error) -> Self {
        LdmError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for assistant operations.
pub type Result<T> = std::result::Result<T, LdmError>;
