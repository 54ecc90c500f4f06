//! Error types for clipscope-core

use thiserror::Error;

/// Main error type for the clipscope-core library
///
/// Normalization and aggregation never produce these; they degrade to
/// defaults instead. Errors come from the layers around them.
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Project document not found in the document source
    #[error("project document not found: {0}")]
    DocumentNotFound(String),

    /// Chat completion error
    #[error("chat error: {0}")]
    Chat(String),
}

/// Result type alias for clipscope-core
pub type Result<T> = std::result::Result<T, Error>;
