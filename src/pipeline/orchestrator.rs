//! Pipeline orchestrator: drives one request through every stage.
//!
//! The orchestrator owns the request-scoped [`PipelineState`] for the
//! lifetime of a run and carries it through
//! `Start -> Classified -> ContextEnriched -> Evaluated`. Earlier stages
//! cannot halt the pipeline (they recover internally); only the evaluator
//! can produce a user-visible error, and even then the run completes with
//! a fully-formed report.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::corpus::Corpus;
use crate::history::{HistoryEntry, HistoryRecorder};
use crate::llm::LlmProvider;
use crate::specialists::SpecialistKind;

use super::classifier::{Classifier, RoutingDecision};
use super::evaluator::EvaluatorBank;
use super::retrieval::Retriever;
use super::OptimizeRequest;

/// Mutable request-scoped state accumulated across stages.
///
/// Fields are set monotonically as stages complete and never cleared
/// within a run.
#[derive(Debug)]
pub struct PipelineState {
    /// The validated input request.
    pub request: OptimizeRequest,
    /// Selected specialist, set by the classifier stage.
    pub specialist: Option<SpecialistKind>,
    /// Routing confidence in [0.0, 1.0].
    pub routing_confidence: Option<f64>,
    /// Routing rationale.
    pub routing_rationale: Option<String>,
    /// Context assembled by the retrieval stage.
    pub retrieved_context: Option<String>,
    /// Total score from the evaluator.
    pub score: Option<u32>,
    /// Per-criterion scores from the evaluator.
    pub rubric_breakdown: Option<BTreeMap<String, u32>>,
    /// Evaluator feedback.
    pub feedback: Option<String>,
    /// The rewritten prompt.
    pub optimized_prompt: Option<String>,
    /// Present only when the evaluator stage failed.
    pub error: Option<String>,
}

impl PipelineState {
    fn new(request: OptimizeRequest) -> Self {
        Self {
            request,
            specialist: None,
            routing_confidence: None,
            routing_rationale: None,
            retrieved_context: None,
            score: None,
            rubric_breakdown: None,
            feedback: None,
            optimized_prompt: None,
            error: None,
        }
    }
}

/// Routing portion of the report.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingInfo {
    /// Classifier confidence in [0.0, 1.0].
    pub confidence: f64,
    /// Short rationale for the selection.
    pub rationale: String,
}

/// Terminal report produced by one pipeline run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizeReport {
    /// The original prompt.
    pub prompt: String,
    /// The stated goal.
    pub goal: String,
    /// Identifier of the specialist that handled the request.
    pub specialist: String,
    /// Routing decision details.
    pub routing: RoutingInfo,
    /// Total score in [0, 100].
    pub score: u32,
    /// Per-criterion breakdown. Empty when the evaluator failed.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub rubric_breakdown: BTreeMap<String, u32>,
    /// Evaluator feedback, or an error summary on failure.
    pub feedback: String,
    /// The rewritten prompt; on failure, the original prompt.
    pub optimized_prompt: String,
    /// Present only when the evaluator stage failed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Report produced by the analysis-only entry point.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisReport {
    /// The original prompt.
    pub prompt: String,
    /// The stated goal.
    pub goal: String,
    /// Identifier of the recommended specialist.
    pub recommended_specialist: String,
    /// Classifier confidence in [0.0, 1.0].
    pub confidence: f64,
    /// Short rationale for the selection.
    pub rationale: String,
}

/// The directed pipeline over injected stage handles.
///
/// Construct once at process start; runs share the immutable stage
/// handles and never share per-run state.
pub struct Pipeline {
    classifier: Classifier,
    retriever: Retriever,
    evaluators: EvaluatorBank,
    history: Option<HistoryRecorder>,
}

impl Pipeline {
    /// Wire the pipeline from its stage components.
    pub fn new(classifier: Classifier, retriever: Retriever, evaluators: EvaluatorBank) -> Self {
        Self {
            classifier,
            retriever,
            evaluators,
            history: None,
        }
    }

    /// Convenience constructor over one shared provider and the standard
    /// model assignment: secondary model for routing, primary for
    /// evaluation.
    pub fn with_provider(
        provider: Arc<dyn LlmProvider>,
        corpus: Arc<Corpus>,
        secondary_model: &str,
        primary_model: &str,
        evaluation_temperature: f64,
    ) -> Self {
        Self::new(
            Classifier::new(Arc::clone(&provider), secondary_model),
            Retriever::new(corpus),
            EvaluatorBank::new(provider, primary_model, evaluation_temperature),
        )
    }

    /// Enable history recording for identified callers.
    pub fn with_history(mut self, recorder: HistoryRecorder) -> Self {
        self.history = Some(recorder);
        self
    }

    /// Run the full optimization pipeline.
    ///
    /// Infallible by contract: every stage failure is converted into a
    /// structured result, so the caller always receives a usable report.
    pub async fn optimize(&self, request: OptimizeRequest) -> OptimizeReport {
        let mut state = PipelineState::new(request);

        // Start -> Classified
        let routing = self
            .classifier
            .route(
                &state.request.prompt,
                &state.request.goal,
                state.request.force_specialist.as_deref(),
            )
            .await;
        tracing::info!(
            specialist = %routing.kind,
            confidence = routing.confidence,
            "classified request"
        );
        let kind = routing.kind;
        self.apply_routing(&mut state, routing);

        // Classified -> ContextEnriched
        let context = self
            .retriever
            .retrieve(&state.request.prompt, &state.request.goal, kind);
        state.retrieved_context = Some(context);

        // ContextEnriched -> Evaluated. Dispatch is total over the catalog:
        // the classifier only returns catalog members.
        let evaluator = self.evaluators.get(kind);
        let context = state.retrieved_context.as_deref().unwrap_or_default();
        match evaluator
            .evaluate(
                &state.request.prompt,
                &state.request.goal,
                context,
                state.request.prior_context.as_deref(),
            )
            .await
        {
            Ok(verdict) => {
                state.score = Some(verdict.score);
                state.rubric_breakdown = Some(verdict.rubric_breakdown);
                state.feedback = Some(verdict.feedback);
                state.optimized_prompt = Some(verdict.optimized_prompt);
            }
            Err(e) => {
                tracing::warn!(error = %e, specialist = %kind, "evaluation failed");
                state.score = Some(0);
                state.feedback = Some(format!("Error during evaluation: {}", e));
                state.optimized_prompt = Some(state.request.prompt.clone());
                state.error = Some(e.to_string());
            }
        }

        self.record_history(&state).await;
        self.into_report(state)
    }

    /// Analysis-only entry point: run just the classifier and return the
    /// routing decision.
    pub async fn analyze(&self, prompt: &str, goal: &str, forced: Option<&str>) -> AnalysisReport {
        let decision = self.classifier.route(prompt, goal, forced).await;
        AnalysisReport {
            prompt: prompt.to_string(),
            goal: goal.to_string(),
            recommended_specialist: decision.kind.identifier().to_string(),
            confidence: decision.confidence,
            rationale: decision.rationale,
        }
    }

    fn apply_routing(&self, state: &mut PipelineState, routing: RoutingDecision) {
        state.specialist = Some(routing.kind);
        state.routing_confidence = Some(routing.confidence);
        state.routing_rationale = Some(routing.rationale);
    }

    /// Append a history entry for identified callers after a successful,
    /// non-errored run. Best-effort: storage failures never alter the
    /// report.
    async fn record_history(&self, state: &PipelineState) {
        if state.error.is_some() {
            return;
        }
        let (Some(recorder), Some(caller)) = (&self.history, state.request.caller_id.as_deref())
        else {
            return;
        };

        let entry = HistoryEntry::new(
            caller,
            &state.request.prompt,
            state
                .specialist
                .map(|kind| kind.identifier())
                .unwrap_or("general"),
            state.score.unwrap_or(0),
            state.optimized_prompt.as_deref().unwrap_or_default(),
        );

        if let Err(e) = recorder.record(entry).await {
            tracing::warn!(error = %e, caller, "failed to record optimization history");
        }
    }

    fn into_report(&self, state: PipelineState) -> OptimizeReport {
        OptimizeReport {
            prompt: state.request.prompt,
            goal: state.request.goal,
            specialist: state
                .specialist
                .map(|kind| kind.identifier())
                .unwrap_or("general")
                .to_string(),
            routing: RoutingInfo {
                confidence: state.routing_confidence.unwrap_or(0.0),
                rationale: state.routing_rationale.unwrap_or_default(),
            },
            score: state.score.unwrap_or(0),
            rubric_breakdown: state.rubric_breakdown.unwrap_or_default(),
            feedback: state.feedback.unwrap_or_default(),
            optimized_prompt: state.optimized_prompt.unwrap_or_default(),
            error: state.error,
        }
    }
}
