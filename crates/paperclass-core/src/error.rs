//! Error types for PaperClass

/// Result type alias using PaperClass's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for PaperClass operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Model, tokenizer or adapter artifacts could not be located or loaded
    #[error("model load error: {0}")]
    ModelLoad(String),

    /// Failures while running a forward pass
    #[error("inference error: {0}")]
    Inference(String),

    /// Tokenization failures
    #[error("tokenizer error: {0}")]
    Tokenizer(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Illegal service state transition or request in the wrong state
    #[error("invalid state: {0}")]
    State(String),

    /// Dataset loading or analysis errors
    #[error("dataset error: {0}")]
    Dataset(String),

    /// Network/IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new model load error
    pub fn model_load(msg: impl Into<String>) -> Self {
        Self::ModelLoad(msg.into())
    }

    /// Create a new inference error
    pub fn inference(msg: impl Into<String>) -> Self {
        Self::Inference(msg.into())
    }

    /// Create a new tokenizer error
    pub fn tokenizer(msg: impl Into<String>) -> Self {
        Self::Tokenizer(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new state error
    pub fn state(msg: impl Into<String>) -> Self {
        Self::State(msg.into())
    }

    /// Create a new dataset error
    pub fn dataset(msg: impl Into<String>) -> Self {
        Self::Dataset(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}
