//! Error types for alertsbot.
//!
//! This module defines a unified error enum covering configuration, I/O,
//! embedding, index loading, query validation, LLM and prompt failures.
//! [`ErrorKind`] gives boundaries (CLI, servers) a stable classification so
//! each kind can be mapped to its own user-facing response.

use thiserror::Error;

/// Unified error type for alertsbot.
///
/// All fallible functions in the workspace return `Result<T, AppError>`.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O and filesystem errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The embedding function could not process the given text.
    #[error("Embedding failure: {0}")]
    Embedding(String),

    /// The persisted corpus (article store, index or manifest) is missing,
    /// unreadable, or does not match its pair.
    #[error("Index unavailable: {0}")]
    IndexUnavailable(String),

    /// Empty query string or non-positive `top_k`.
    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    /// Retrieval succeeded but produced no articles.
    #[error("No relevant context found for the query")]
    NoRelevantContext,

    /// Article store or corpus build errors
    #[error("Corpus error: {0}")]
    Corpus(String),

    /// LLM provider errors
    #[error("LLM error: {0}")]
    Llm(String),

    /// Prompt system errors
    #[error("Prompt error: {0}")]
    Prompt(String),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

/// Coarse classification of an [`AppError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Config,
    Io,
    EmbeddingFailure,
    IndexUnavailable,
    InvalidQuery,
    NoRelevantContext,
    Corpus,
    Llm,
    Prompt,
    Serialization,
    Other,
}

impl ErrorKind {
    /// Whether a serving process must refuse to start on this kind of error.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ErrorKind::IndexUnavailable)
    }

    /// Stable identifier used in JSON output.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Config => "config",
            ErrorKind::Io => "io",
            ErrorKind::EmbeddingFailure => "embedding_failure",
            ErrorKind::IndexUnavailable => "index_unavailable",
            ErrorKind::InvalidQuery => "invalid_query",
            ErrorKind::NoRelevantContext => "no_relevant_context",
            ErrorKind::Corpus => "corpus",
            ErrorKind::Llm => "llm",
            ErrorKind::Prompt => "prompt",
            ErrorKind::Serialization => "serialization",
            ErrorKind::Other => "other",
        }
    }
}

impl AppError {
    /// Classify this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Config,
            AppError::Io(_) => ErrorKind::Io,
            AppError::Embedding(_) => ErrorKind::EmbeddingFailure,
            AppError::IndexUnavailable(_) => ErrorKind::IndexUnavailable,
            AppError::InvalidQuery(_) => ErrorKind::InvalidQuery,
            AppError::NoRelevantContext => ErrorKind::NoRelevantContext,
            AppError::Corpus(_) => ErrorKind::Corpus,
            AppError::Llm(_) => ErrorKind::Llm,
            AppError::Prompt(_) => ErrorKind::Prompt,
            AppError::Serialization(_) => ErrorKind::Serialization,
            AppError::Other(_) => ErrorKind::Other,
        }
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

impl From<serde_yaml::Error> for AppError {
    fn from(err: serde_yaml::Error) -> Self {
        AppError::Serialization(err.to_string())
    }
}

/// Convenience type alias for Results with AppError.
pub type AppResult<T> = Result<T, AppError>;
