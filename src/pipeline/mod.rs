//! The multi-stage prompt optimization pipeline.
//!
//! A run flows through three stages in order, carrying one mutable
//! request-scoped [`PipelineState`]:
//!
//! ```text
//! Start -> Classifier -> Retrieval -> Evaluator(selected) -> terminal
//! ```
//!
//! Classification and retrieval failures are recovered internally and
//! never surface; only an evaluator failure is user-visible, as a
//! populated `error` field on an otherwise fully-formed report.

pub mod classifier;
pub mod evaluator;
pub mod orchestrator;
pub mod retrieval;

pub use classifier::{Classifier, RoutingDecision};
pub use evaluator::{EvaluationVerdict, Evaluator, EvaluatorBank};
pub use orchestrator::{AnalysisReport, OptimizeReport, Pipeline, PipelineState, RoutingInfo};
pub use retrieval::Retriever;

use serde::{Deserialize, Serialize};

use crate::error::RequestError;

/// Maximum accepted prompt length, in characters.
pub const MAX_PROMPT_CHARS: usize = 10_000;

/// Maximum accepted goal length, in characters.
pub const MAX_GOAL_CHARS: usize = 1_000;

/// Immutable input to one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeRequest {
    /// The draft prompt to optimize.
    pub prompt: String,
    /// What the caller wants the prompt to achieve.
    pub goal: String,
    /// Force a specific specialist instead of auto-routing. Unknown
    /// identifiers are ignored, not rejected.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub force_specialist: Option<String>,
    /// Opaque caller identity; absent for anonymous callers. Required for
    /// history recording.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<String>,
    /// Free-text context from an external project-scoped knowledge source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prior_context: Option<String>,
}

impl OptimizeRequest {
    /// Build a validated request.
    ///
    /// # Errors
    ///
    /// Returns a [`RequestError`] when the prompt or goal is empty or
    /// exceeds its length bound.
    pub fn new(prompt: impl Into<String>, goal: impl Into<String>) -> Result<Self, RequestError> {
        let prompt = prompt.into();
        let goal = goal.into();

        if prompt.trim().is_empty() {
            return Err(RequestError::EmptyPrompt);
        }
        let prompt_len = prompt.chars().count();
        if prompt_len > MAX_PROMPT_CHARS {
            return Err(RequestError::PromptTooLong {
                len: prompt_len,
                max: MAX_PROMPT_CHARS,
            });
        }

        if goal.trim().is_empty() {
            return Err(RequestError::EmptyGoal);
        }
        let goal_len = goal.chars().count();
        if goal_len > MAX_GOAL_CHARS {
            return Err(RequestError::GoalTooLong {
                len: goal_len,
                max: MAX_GOAL_CHARS,
            });
        }

        Ok(Self {
            prompt,
            goal,
            force_specialist: None,
            caller_id: None,
            prior_context: None,
        })
    }

    /// Force a specific specialist, bypassing classification when the
    /// identifier names a catalog member.
    pub fn with_forced_specialist(mut self, specialist: impl Into<String>) -> Self {
        self.force_specialist = Some(specialist.into());
        self
    }

    /// Attach a caller identity for history recording.
    pub fn with_caller(mut self, caller_id: impl Into<String>) -> Self {
        self.caller_id = Some(caller_id.into());
        self
    }

    /// Attach project-scoped prior context.
    pub fn with_prior_context(mut self, context: impl Into<String>) -> Self {
        self.prior_context = Some(context.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_validation() {
        assert!(OptimizeRequest::new("write a poem", "poetry").is_ok());

        assert!(matches!(
            OptimizeRequest::new("", "goal"),
            Err(RequestError::EmptyPrompt)
        ));
        assert!(matches!(
            OptimizeRequest::new("   ", "goal"),
            Err(RequestError::EmptyPrompt)
        ));
        assert!(matches!(
            OptimizeRequest::new("prompt", ""),
            Err(RequestError::EmptyGoal)
        ));
    }

    #[test]
    fn test_request_length_bounds() {
        let long_prompt = "x".repeat(MAX_PROMPT_CHARS + 1);
        assert!(matches!(
            OptimizeRequest::new(long_prompt, "goal"),
            Err(RequestError::PromptTooLong { .. })
        ));

        let long_goal = "x".repeat(MAX_GOAL_CHARS + 1);
        assert!(matches!(
            OptimizeRequest::new("prompt", long_goal),
            Err(RequestError::GoalTooLong { .. })
        ));

        // Bounds are inclusive
        assert!(OptimizeRequest::new("x".repeat(MAX_PROMPT_CHARS), "goal").is_ok());
    }

    #[test]
    fn test_request_builder_options() {
        let request = OptimizeRequest::new("prompt", "goal")
            .expect("valid")
            .with_forced_specialist("creative")
            .with_caller("user-1")
            .with_prior_context("project notes");

        assert_eq!(request.force_specialist.as_deref(), Some("creative"));
        assert_eq!(request.caller_id.as_deref(), Some("user-1"));
        assert_eq!(request.prior_context.as_deref(), Some("project notes"));
    }
}
