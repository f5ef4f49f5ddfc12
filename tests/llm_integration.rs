//! Integration tests for the LLM client.
//!
//! These tests make real API calls to the configured endpoint.
//! Run with: GROQ_API_KEY=your_key cargo test --test llm_integration -- --ignored

use std::time::Duration;

use promptmaster::llm::{ChatClient, GenerationRequest, LlmProvider, Message};

fn get_test_api_key() -> String {
    std::env::var("GROQ_API_KEY")
        .expect("GROQ_API_KEY environment variable must be set for integration tests")
}

fn create_test_client() -> ChatClient {
    ChatClient::new(
        "https://api.groq.com/openai/v1",
        Some(get_test_api_key()),
        Duration::from_secs(120),
    )
}

#[tokio::test]
#[ignore] // Run with: cargo test --test llm_integration -- --ignored
async fn test_simple_generation() {
    let client = create_test_client();

    let request = GenerationRequest::new(
        "llama-3.1-8b-instant",
        vec![
            Message::system("You are a helpful assistant. Reply concisely."),
            Message::user("What is 2 + 2? Reply with just the number."),
        ],
    )
    .with_max_tokens(10)
    .with_temperature(0.0);

    let response = client.generate(request).await;
    assert!(response.is_ok(), "Generation failed: {:?}", response.err());

    let response = response.expect("Should have response");
    assert!(
        !response.choices.is_empty(),
        "Should have at least one choice"
    );

    let content = response.first_content().expect("Should have content");
    assert!(
        content.contains('4'),
        "Response should contain '4', got: {}",
        content
    );

    assert!(response.usage.total_tokens > 0, "Should have token usage");
}

#[tokio::test]
#[ignore]
async fn test_classifier_live_routing() {
    use promptmaster::pipeline::Classifier;
    use promptmaster::specialists::SpecialistKind;
    use std::sync::Arc;

    let classifier = Classifier::new(Arc::new(create_test_client()), "llama-3.1-8b-instant");

    let decision = classifier
        .classify(
            "write a function to sort an array",
            "create a sorting function",
        )
        .await;

    assert_eq!(decision.kind, SpecialistKind::Coding);
    assert!(decision.confidence > 0.5);
}
