//! promptmaster: Multi-stage prompt optimization pipeline for LLMs.
//!
//! This library classifies a draft prompt into a specialist domain, enriches
//! it with retrieved prompt-engineering context, and delegates to a
//! domain-specialized evaluator that scores the prompt and produces an
//! optimized rewrite.

// Core modules
pub mod cli;
pub mod config;
pub mod corpus;
pub mod error;
pub mod history;
pub mod llm;
pub mod pipeline;
pub mod specialists;

// Re-export commonly used error types
pub use error::{
    ConfigError, CorpusError, EvaluationError, HistoryError, LlmError, RequestError,
};
