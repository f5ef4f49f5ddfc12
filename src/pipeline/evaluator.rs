//! Evaluator stage: scores a prompt and produces an optimized rewrite.
//!
//! One evaluator exists per catalog specialist, sharing an implementation
//! parameterized by the specialist's static definition. The model is asked
//! for a four-field JSON verdict; responses are decoded through the shared
//! recovery pipeline in [`crate::llm::extract`].

use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::EvaluationError;
use crate::llm::{extract::parse_structured, GenerationRequest, LlmProvider, Message};
use crate::specialists::{definition, SpecialistDefinition, SpecialistKind};

/// Structured verdict produced by a successful evaluation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationVerdict {
    /// Total score, clamped to [0, 100].
    pub score: u32,
    /// Per-criterion scores, clamped to [0, 100] each.
    pub rubric_breakdown: BTreeMap<String, u32>,
    /// Feedback explaining the scores.
    pub feedback: String,
    /// The rewritten prompt.
    pub optimized_prompt: String,
}

/// Wire format of the evaluator model response.
#[derive(Debug, Deserialize)]
struct VerdictWire {
    score: i64,
    #[serde(default)]
    rubric_breakdown: BTreeMap<String, i64>,
    feedback: String,
    optimized_prompt: String,
}

/// Clamp a model-returned point value into the documented [0, 100] range.
fn clamp_points(raw: i64) -> u32 {
    raw.clamp(0, 100) as u32
}

/// Evaluator for one specialist.
pub struct Evaluator {
    provider: Arc<dyn LlmProvider>,
    /// Primary model used for evaluation.
    model: String,
    temperature: f64,
    definition: &'static SpecialistDefinition,
}

impl Evaluator {
    /// Build an evaluator for the given specialist.
    pub fn new(
        provider: Arc<dyn LlmProvider>,
        model: impl Into<String>,
        temperature: f64,
        kind: SpecialistKind,
    ) -> Self {
        Self {
            provider,
            model: model.into(),
            temperature,
            definition: definition(kind),
        }
    }

    /// Which specialist this evaluator serves.
    pub fn kind(&self) -> SpecialistKind {
        self.definition.kind
    }

    /// Evaluate a prompt against this specialist's rubric.
    ///
    /// # Errors
    ///
    /// Returns [`EvaluationError::Llm`] when the model call fails and
    /// [`EvaluationError::ParseFailure`] when the response survives none of
    /// the recovery steps. The orchestrator converts either into a terminal
    /// zero-score result.
    pub async fn evaluate(
        &self,
        prompt: &str,
        goal: &str,
        context: &str,
        prior_context: Option<&str>,
    ) -> Result<EvaluationVerdict, EvaluationError> {
        let user = self.build_evaluation_prompt(prompt, goal, context, prior_context);

        let request = GenerationRequest::new(
            self.model.as_str(),
            vec![
                Message::system(self.definition.evaluation_framing),
                Message::user(user),
            ],
        )
        .with_temperature(self.temperature);

        let response = self.provider.generate(request).await?;
        let content = response
            .first_content()
            .ok_or_else(|| EvaluationError::ParseFailure("model returned no choices".to_string()))?;

        let wire: VerdictWire =
            parse_structured(content).map_err(|e| EvaluationError::ParseFailure(e.to_string()))?;

        Ok(EvaluationVerdict {
            score: clamp_points(wire.score),
            rubric_breakdown: wire
                .rubric_breakdown
                .into_iter()
                .map(|(criterion, points)| (criterion, clamp_points(points)))
                .collect(),
            feedback: wire.feedback,
            optimized_prompt: wire.optimized_prompt,
        })
    }

    /// Render the user-side evaluation prompt: goal, prompt, optional
    /// knowledge/project context, the rubric, and the exact JSON shape the
    /// model must return.
    fn build_evaluation_prompt(
        &self,
        prompt: &str,
        goal: &str,
        context: &str,
        prior_context: Option<&str>,
    ) -> String {
        let mut out = format!(
            "You are evaluating a prompt for: {}\n\nPROMPT TO EVALUATE:\n\"\"\"\n{}\n\"\"\"\n",
            goal, prompt
        );

        if !context.is_empty() {
            out.push_str(&format!(
                "\nKNOWLEDGE BASE REFERENCE:\nUse the following prompt engineering best practices \
                 to inform your evaluation and optimization:\n---\n{}\n---\nApply these techniques \
                 when optimizing the prompt. Reference specific techniques in your feedback.\n",
                context
            ));
        }

        if let Some(prior) = prior_context.filter(|p| !p.is_empty()) {
            out.push_str(&format!(
                "\nPROJECT CONTEXT:\nThe caller supplied the following project context. Use it to \
                 better understand their domain and provide more relevant optimization:\n---\n{}\n---\n",
                prior
            ));
        }

        let breakdown_fields = self
            .definition
            .rubric
            .criteria
            .iter()
            .map(|c| format!("        \"{}\": <score>", c.name))
            .collect::<Vec<_>>()
            .join(",\n");

        out.push_str(&format!(
            "\nSCORING RUBRIC (Total: 100 points):\n{}\n\n\
             Provide your response in this exact JSON format:\n\
             {{\n\
             \x20   \"score\": <total_score_0_to_100>,\n\
             \x20   \"rubric_breakdown\": {{\n{}\n\x20   }},\n\
             \x20   \"feedback\": \"<detailed feedback explaining the scores>\",\n\
             \x20   \"optimized_prompt\": \"<your improved version of the prompt>\"\n\
             }}\n\n\
             Be thorough and constructive in your feedback. The optimized prompt should be \
             significantly better.",
            self.definition.rubric.render(),
            breakdown_fields
        ));

        out
    }
}

/// One evaluator per catalog specialist.
///
/// Dispatch is an exhaustive match over [`SpecialistKind`], so a specialist
/// without an evaluator cannot compile.
pub struct EvaluatorBank {
    coding: Evaluator,
    creative: Evaluator,
    analyst: Evaluator,
    general: Evaluator,
}

impl EvaluatorBank {
    /// Build the full bank over one shared provider.
    pub fn new(provider: Arc<dyn LlmProvider>, model: &str, temperature: f64) -> Self {
        let build = |kind| Evaluator::new(Arc::clone(&provider), model, temperature, kind);
        Self {
            coding: build(SpecialistKind::Coding),
            creative: build(SpecialistKind::Creative),
            analyst: build(SpecialistKind::Analyst),
            general: build(SpecialistKind::General),
        }
    }

    /// The evaluator serving the given specialist.
    pub fn get(&self, kind: SpecialistKind) -> &Evaluator {
        match kind {
            SpecialistKind::Coding => &self.coding,
            SpecialistKind::Creative => &self.creative,
            SpecialistKind::Analyst => &self.analyst,
            SpecialistKind::General => &self.general,
        }
    }
}
