//! LLM integration for promptmaster.
//!
//! This module provides the chat-completions client used by the pipeline
//! stages, plus the extraction helpers that recover structured JSON from
//! free-form model output.
//!
//! ```ignore
//! use promptmaster::llm::{ChatClient, GenerationRequest, LlmProvider, Message};
//!
//! let client = ChatClient::new("https://api.groq.com/openai/v1", Some(key), timeout);
//! let request = GenerationRequest::new(
//!     "llama-3.3-70b-versatile",
//!     vec![Message::system("You are helpful"), Message::user("Hello")],
//! );
//! let response = client.generate(request).await?;
//! ```

pub mod client;
pub mod extract;

pub use client::{
    ChatClient, Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
pub use extract::{extract_object, parse_structured};
