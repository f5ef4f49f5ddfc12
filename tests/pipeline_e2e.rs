//! End-to-end pipeline tests over a scripted LLM provider.
//!
//! Each scenario wires the full pipeline (classifier, retriever, evaluator
//! bank, history recorder) against a mock provider that replays canned
//! responses in call order.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use promptmaster::corpus::Corpus;
use promptmaster::error::LlmError;
use promptmaster::history::{HistoryRecorder, HistoryStore, MemoryHistoryStore};
use promptmaster::llm::{
    Choice, GenerationRequest, GenerationResponse, LlmProvider, Message, Usage,
};
use promptmaster::pipeline::{OptimizeRequest, Pipeline};

/// Mock LLM provider replaying responses in call order. When exhausted, the
/// last response repeats.
struct ScriptedProvider {
    responses: Mutex<Vec<String>>,
    call_count: AtomicUsize,
}

impl ScriptedProvider {
    fn new(responses: Vec<String>) -> Self {
        Self {
            responses: Mutex::new(responses),
            call_count: AtomicUsize::new(0),
        }
    }

    fn calls(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LlmProvider for ScriptedProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        let idx = self.call_count.fetch_add(1, Ordering::SeqCst);
        let responses = self.responses.lock().expect("lock not poisoned");
        let content = responses
            .get(idx)
            .cloned()
            .unwrap_or_else(|| responses.last().cloned().unwrap_or_default());

        Ok(GenerationResponse {
            id: format!("mock-{}", idx),
            model: "mock-model".to_string(),
            choices: vec![Choice {
                index: 0,
                message: Message::assistant(content),
                finish_reason: "stop".to_string(),
            }],
            usage: Usage {
                prompt_tokens: 100,
                completion_tokens: 200,
                total_tokens: 300,
            },
        })
    }
}

/// Provider whose every call fails.
struct FailingProvider;

#[async_trait]
impl LlmProvider for FailingProvider {
    async fn generate(&self, _request: GenerationRequest) -> Result<GenerationResponse, LlmError> {
        Err(LlmError::RequestFailed("connection reset".to_string()))
    }
}

fn verdict_response(score: u32, optimized: &str) -> String {
    format!(
        r#"{{"score": {}, "rubric_breakdown": {{"clarity": 18}}, "feedback": "Solid prompt.", "optimized_prompt": "{}"}}"#,
        score, optimized
    )
}

fn pipeline_over(provider: Arc<dyn LlmProvider>) -> Pipeline {
    Pipeline::with_provider(
        provider,
        Arc::new(Corpus::builtin()),
        "mock-secondary",
        "mock-primary",
        0.3,
    )
}

#[tokio::test]
async fn test_optimize_routes_coding_prompt() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        r#"{"agent": "coding", "confidence": 0.93, "reasoning": "software engineering task"}"#
            .to_string(),
        verdict_response(82, "Write a Python function that sorts an integer array."),
    ]));
    let pipeline = pipeline_over(provider.clone());

    let request = OptimizeRequest::new(
        "write a function to sort an array",
        "create a sorting function",
    )
    .expect("valid request");
    let report = pipeline.optimize(request).await;

    assert_eq!(report.specialist, "coding");
    assert!(report.routing.confidence > 0.5);
    assert_eq!(report.score, 82);
    assert_eq!(
        report.optimized_prompt,
        "Write a Python function that sorts an integer array."
    );
    assert!(report.error.is_none());
    // Classifier call plus evaluator call
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_optimize_forced_specialist_skips_classifier() {
    // Only the evaluator response is scripted: forcing a specialist must
    // not consume a classifier call.
    let provider = Arc::new(ScriptedProvider::new(vec![verdict_response(
        70,
        "Write a short story about a lighthouse keeper.",
    )]));
    let pipeline = pipeline_over(provider.clone());

    let request = OptimizeRequest::new("write a story", "generate creative content")
        .expect("valid request")
        .with_forced_specialist("creative");
    let report = pipeline.optimize(request).await;

    assert_eq!(report.specialist, "creative");
    assert!((report.routing.confidence - 1.0).abs() < f64::EPSILON);
    assert!(report.routing.rationale.contains("manually selected"));
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_optimize_unknown_forced_specialist_classifies_normally() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        r#"{"agent": "analyst", "confidence": 0.75, "reasoning": "research task"}"#.to_string(),
        verdict_response(64, "Summarize the findings."),
    ]));
    let pipeline = pipeline_over(provider.clone());

    let request = OptimizeRequest::new("summarize this paper", "research summary")
        .expect("valid request")
        .with_forced_specialist("wizard");
    let report = pipeline.optimize(request).await;

    assert_eq!(report.specialist, "analyst");
    assert!((report.routing.confidence - 0.75).abs() < f64::EPSILON);
    assert_eq!(provider.calls(), 2);
}

#[tokio::test]
async fn test_optimize_repairable_evaluator_response() {
    let damaged = r#"```json
{
    "score": 55,
    "rubric_breakdown": {"clarity": 12,},
    "feedback": "Needs work.",
    "optimized_prompt": "A better prompt.",
}
```"#;
    let provider = Arc::new(ScriptedProvider::new(vec![damaged.to_string()]));
    let pipeline = pipeline_over(provider);

    let request = OptimizeRequest::new("a vague prompt", "improve it")
        .expect("valid request")
        .with_forced_specialist("general");
    let report = pipeline.optimize(request).await;

    assert!(report.error.is_none());
    assert_eq!(report.score, 55);
    assert_eq!(report.optimized_prompt, "A better prompt.");
}

#[tokio::test]
async fn test_optimize_unrecoverable_evaluation_completes_with_error() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        "Sorry, I can only answer in prose.".to_string(),
    ]));
    let pipeline = pipeline_over(provider);

    let request = OptimizeRequest::new("a vague prompt", "improve it")
        .expect("valid request")
        .with_forced_specialist("general");
    let report = pipeline.optimize(request).await;

    assert_eq!(report.score, 0);
    assert_eq!(report.optimized_prompt, "a vague prompt");
    assert!(report.error.as_deref().is_some_and(|e| !e.is_empty()));
    assert!(report.feedback.contains("Error during evaluation"));
}

#[tokio::test]
async fn test_optimize_total_call_failure_still_completes() {
    let pipeline = pipeline_over(Arc::new(FailingProvider));

    let request =
        OptimizeRequest::new("a prompt", "a goal").expect("valid request");
    let report = pipeline.optimize(request).await;

    // Classification fell back silently; only the evaluator failure is
    // user-visible.
    assert_eq!(report.specialist, "general");
    assert!((report.routing.confidence - 0.5).abs() < f64::EPSILON);
    assert_eq!(report.score, 0);
    assert_eq!(report.optimized_prompt, "a prompt");
    assert!(report.error.is_some());
}

#[tokio::test]
async fn test_analyze_only_runs_classifier() {
    let provider = Arc::new(ScriptedProvider::new(vec![
        r#"{"agent": "coding", "confidence": 0.88, "reasoning": "debugging request"}"#
            .to_string(),
    ]));
    let pipeline = pipeline_over(provider.clone());

    let report = pipeline
        .analyze("fix this null pointer crash", "debug my program", None)
        .await;

    assert_eq!(report.recommended_specialist, "coding");
    assert!((report.confidence - 0.88).abs() < f64::EPSILON);
    assert_eq!(report.rationale, "debugging request");
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_history_capped_at_ten_entries() {
    let store = Arc::new(MemoryHistoryStore::new());
    let provider = Arc::new(ScriptedProvider::new(vec![verdict_response(
        77,
        "Improved.",
    )]));
    let pipeline = pipeline_over(provider).with_history(HistoryRecorder::new(
        Arc::clone(&store) as Arc<dyn HistoryStore>,
        10,
    ));

    for i in 0..11 {
        let request = OptimizeRequest::new(format!("prompt number {}", i), "a goal")
            .expect("valid request")
            .with_forced_specialist("general")
            .with_caller("user-42");
        let report = pipeline.optimize(request).await;
        assert!(report.error.is_none());
    }

    let recent = store.recent("user-42", 20).await.expect("recent");
    assert_eq!(recent.len(), 10);
    assert_eq!(recent[0].prompt_text, "prompt number 10");
    assert!(recent.iter().all(|e| e.prompt_text != "prompt number 0"));
}

#[tokio::test]
async fn test_history_skipped_for_anonymous_and_errored_runs() {
    let store = Arc::new(MemoryHistoryStore::new());
    let provider = Arc::new(ScriptedProvider::new(vec![
        // First run: anonymous, succeeds
        verdict_response(70, "Improved."),
        // Second run: identified, evaluator output unrecoverable
        "not json at all".to_string(),
    ]));
    let pipeline = pipeline_over(provider).with_history(HistoryRecorder::new(
        Arc::clone(&store) as Arc<dyn HistoryStore>,
        10,
    ));

    let anonymous = OptimizeRequest::new("first prompt", "a goal")
        .expect("valid request")
        .with_forced_specialist("general");
    pipeline.optimize(anonymous).await;

    let errored = OptimizeRequest::new("second prompt", "a goal")
        .expect("valid request")
        .with_forced_specialist("general")
        .with_caller("user-7");
    let report = pipeline.optimize(errored).await;
    assert!(report.error.is_some());

    assert!(store.recent("user-7", 10).await.expect("recent").is_empty());
}
