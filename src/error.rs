//! Error types for promptmaster operations.
//!
//! Defines error types for the major subsystems:
//! - LLM API interactions
//! - Request validation at the pipeline boundary
//! - Configuration loading
//! - Knowledge corpus loading
//! - Prompt evaluation
//! - History persistence

use thiserror::Error;

/// Errors that can occur during LLM operations.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("HTTP request failed: {0}")]
    RequestFailed(String),

    #[error("Failed to parse LLM response: {0}")]
    ParseError(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Invalid model: {0}")]
    InvalidModel(String),

    #[error("API error ({code}): {message}")]
    ApiError { code: u16, message: String },
}

/// Errors raised when validating an optimization request.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Prompt must not be empty")]
    EmptyPrompt,

    #[error("Prompt is too long: {len} chars exceeds the {max} char limit")]
    PromptTooLong { len: usize, max: usize },

    #[error("Goal must not be empty")]
    EmptyGoal,

    #[error("Goal is too long: {len} chars exceeds the {max} char limit")]
    GoalTooLong { len: usize, max: usize },
}

/// Errors that can occur during configuration operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Configuration validation failed: {0}")]
    ValidationFailed(String),
}

/// Errors that can occur while loading the knowledge corpus.
#[derive(Debug, Error)]
pub enum CorpusError {
    #[error("Failed to read corpus document '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Errors that can occur during prompt evaluation.
///
/// These never escape the pipeline: the orchestrator converts them into a
/// terminal zero-score result with the `error` field populated.
#[derive(Debug, Error)]
pub enum EvaluationError {
    #[error("Failed to parse evaluation response: {0}")]
    ParseFailure(String),

    #[error("Evaluation call failed: {0}")]
    Llm(#[from] LlmError),
}

/// Errors that can occur during history persistence.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Corrupt history record: {0}")]
    Corrupt(String),
}
