//! Classifier stage: routes a request to a catalog specialist.
//!
//! One fast-model call decides which specialist should evaluate the
//! prompt. The stage is infallible by design: a failed call, an
//! undecodable response, or an unknown identifier all fall back to the
//! general specialist with confidence 0.5 rather than aborting the run.

use serde::Deserialize;
use std::sync::Arc;

use crate::llm::{extract::parse_structured, GenerationRequest, LlmProvider, Message};
use crate::specialists::{catalog, SpecialistKind};

/// Confidence reported on every fallback path.
const FALLBACK_CONFIDENCE: f64 = 0.5;

/// Rationale recorded when the caller forces a specialist.
const FORCED_RATIONALE: &str = "Specialist manually selected by caller";

/// System prompt template; `{specialists}` is replaced with the catalog's
/// routing descriptions.
const SYSTEM_TEMPLATE: &str = r#"You are a prompt classification system. Your job is to analyze a user's prompt and determine which specialized evaluator should handle it.

Available specialists:
{specialists}

Analyze the prompt and the user's goal, then select the most appropriate specialist.

Respond with ONLY a JSON object in this format:
{"agent": "<specialist_identifier>", "confidence": <0.0-1.0>, "reasoning": "<brief explanation>"}

Rules:
1. Choose "coding" for any programming, debugging, or software-related tasks
2. Choose "creative" for writing, marketing, storytelling, or artistic content
3. Choose "analyst" for data analysis, research, reports, or analytical tasks
4. Choose "general" for prompts that don't clearly fit the above categories
5. Confidence should reflect how certain you are about the classification"#;

/// The routing decision produced by this stage.
#[derive(Debug, Clone, PartialEq)]
pub struct RoutingDecision {
    /// Selected specialist.
    pub kind: SpecialistKind,
    /// Confidence in [0.0, 1.0].
    pub confidence: f64,
    /// Short rationale for the selection.
    pub rationale: String,
}

/// Wire format of the classifier model response.
#[derive(Debug, Deserialize)]
struct RoutingWire {
    agent: String,
    confidence: f64,
    reasoning: String,
}

/// Classifier stage over an injected LLM provider.
pub struct Classifier {
    provider: Arc<dyn LlmProvider>,
    /// Fast secondary model used for routing decisions.
    model: String,
    system_prompt: String,
}

impl Classifier {
    /// Build a classifier using the given provider and routing model.
    pub fn new(provider: Arc<dyn LlmProvider>, model: impl Into<String>) -> Self {
        let descriptions = catalog()
            .map(|def| format!("- {}: {}", def.kind.identifier(), def.routing_description))
            .collect::<Vec<_>>()
            .join("\n");

        Self {
            provider,
            model: model.into(),
            system_prompt: SYSTEM_TEMPLATE.replace("{specialists}", &descriptions),
        }
    }

    /// Route a request, honoring a caller-forced specialist.
    ///
    /// A forced identifier naming a catalog member skips classification
    /// entirely with confidence fixed at 1.0. An unrecognized forced value
    /// is treated as absent.
    pub async fn route(&self, prompt: &str, goal: &str, forced: Option<&str>) -> RoutingDecision {
        if let Some(forced) = forced {
            if let Some(kind) = SpecialistKind::from_identifier(forced) {
                return RoutingDecision {
                    kind,
                    confidence: 1.0,
                    rationale: FORCED_RATIONALE.to_string(),
                };
            }
            tracing::debug!(forced, "ignoring unrecognized forced specialist");
        }

        self.classify(prompt, goal).await
    }

    /// Classify a prompt with one model call.
    ///
    /// Never fails: every error path degrades to the general specialist.
    pub async fn classify(&self, prompt: &str, goal: &str) -> RoutingDecision {
        let user = format!(
            "PROMPT TO CLASSIFY:\n\"{}\"\n\nUSER'S GOAL:\n\"{}\"\n\nSelect the appropriate specialist and explain your reasoning.",
            prompt, goal
        );

        let request = GenerationRequest::new(
            self.model.as_str(),
            vec![
                Message::system(self.system_prompt.as_str()),
                Message::user(user),
            ],
        )
        .with_temperature(0.0);

        match self.provider.generate(request).await {
            Ok(response) => match response.first_content() {
                Some(content) => self.parse_decision(content),
                None => fallback("model returned no choices"),
            },
            Err(e) => fallback(&format!("classification call failed: {}", e)),
        }
    }

    /// Decode the model response into a decision, falling back on any
    /// decode failure or unknown identifier.
    fn parse_decision(&self, content: &str) -> RoutingDecision {
        let wire: RoutingWire = match parse_structured(content) {
            Ok(wire) => wire,
            Err(e) => return fallback(&e.to_string()),
        };

        match SpecialistKind::from_identifier(&wire.agent) {
            Some(kind) => RoutingDecision {
                kind,
                confidence: wire.confidence.clamp(0.0, 1.0),
                rationale: wire.reasoning,
            },
            None => fallback(&format!("unknown specialist '{}'", wire.agent)),
        }
    }
}

/// The fallback decision: general specialist at half confidence.
fn fallback(reason: &str) -> RoutingDecision {
    tracing::warn!(reason, "classification fell back to general specialist");
    RoutingDecision {
        kind: SpecialistKind::General,
        confidence: FALLBACK_CONFIDENCE,
        rationale: format!("Fallback due to classification error: {}", reason),
    }
}
