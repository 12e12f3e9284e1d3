use thiserror::Error;

#[derive(Error, Debug)]
pub enum DocRagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("TOML parsing error: {0}")]
    TomlParsing(#[from] toml::de::Error),

    #[error("Invalid configuration: {0}")]
    ConfigError(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(String),

    #[error("Storage error: {0}")]
    StorageError(String),

    #[error("HTTP error: {0}")]
    HttpError(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Generation timed out after {0}s")]
    GenerationTimeout(u64),
}

impl DocRagError {
    /// Errors raised by the generation capability itself.
    ///
    /// These are the failures the chat pipeline recovers from by retrying
    /// once without document context.
    pub const fn is_generation_failure(&self) -> bool {
        matches!(
            self,
            Self::HttpError(_) | Self::LlmError(_) | Self::GenerationTimeout(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, DocRagError>;
