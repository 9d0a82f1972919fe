//! Provider client wire format tests
//!
//! Each client is called directly with a catalog model and checked for what
//! it sends, how it reads usage, and how it classifies failures.

use std::time::Duration;

use callmate::{
    providers::{
        AnalysisRequest, AnthropicProvider, FailureReason, GoogleProvider, LlmProvider,
        OpenAiProvider,
    },
    tiers::{ModelCatalog, ModelRef, ModelSpec, Provider},
};
use pretty_assertions::assert_eq;

use crate::mocks::{
    MockAnthropic, MockGoogle, MockOpenAi, TEST_ANTHROPIC_API_KEY, TEST_GOOGLE_API_KEY,
    TEST_OPENAI_API_KEY,
};

fn spec(provider: Provider, model: &str) -> ModelSpec {
    ModelCatalog::builtin()
        .lookup(&ModelRef::new(provider, model))
        .cloned()
        .unwrap()
}

fn http() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(5))
        .build()
        .unwrap()
}

#[tokio::test]
async fn test_openai_sends_system_and_json_format() {
    let mock = MockOpenAi::start().await;
    mock.mock_success(r#"{"ok": true}"#).await;
    let client = OpenAiProvider::new(http(), &mock.uri(), TEST_OPENAI_API_KEY);

    let request = AnalysisRequest::new("요약해 주세요")
        .with_system_prompt("JSON only")
        .json();
    let completion = client
        .complete(&spec(Provider::OpenAi, "gpt-4o"), &request)
        .await
        .unwrap();

    assert_eq!(completion.content, r#"{"ok": true}"#);
    assert_eq!(completion.input_tokens, 1200);
    assert_eq!(completion.output_tokens, 300);

    let bodies = mock.request_bodies().await;
    assert_eq!(bodies.len(), 1);
    let body = &bodies[0];
    assert_eq!(body["model"], "gpt-4o");
    assert_eq!(body["messages"][0]["role"], "system");
    assert_eq!(body["messages"][0]["content"], "JSON only");
    assert_eq!(body["messages"][1]["role"], "user");
    assert_eq!(body["response_format"]["type"], "json_object");
}

#[tokio::test]
async fn test_openai_plain_request_has_no_response_format() {
    let mock = MockOpenAi::start().await;
    mock.mock_success("plain text").await;
    let client = OpenAiProvider::new(http(), &mock.uri(), TEST_OPENAI_API_KEY);

    client
        .complete(
            &spec(Provider::OpenAi, "gpt-4o-mini"),
            &AnalysisRequest::new("hi"),
        )
        .await
        .unwrap();

    let body = &mock.request_bodies().await[0];
    assert!(body.get("response_format").is_none());
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_openai_status_classification() {
    for (status, reason) in [
        (429, FailureReason::RateLimited),
        (401, FailureReason::AuthError),
        (403, FailureReason::AuthError),
        (504, FailureReason::Timeout),
        (500, FailureReason::Unknown),
    ] {
        let mock = MockOpenAi::start().await;
        mock.mock_status(status).await;
        let client = OpenAiProvider::new(http(), &mock.uri(), TEST_OPENAI_API_KEY);

        let failure = client
            .complete(&spec(Provider::OpenAi, "gpt-4o"), &AnalysisRequest::new("hi"))
            .await
            .unwrap_err();
        assert_eq!(failure.reason, reason, "status {}", status);
    }
}

#[tokio::test]
async fn test_openai_malformed_body_is_invalid_response() {
    let mock = MockOpenAi::start().await;
    mock.mock_malformed().await;
    let client = OpenAiProvider::new(http(), &mock.uri(), TEST_OPENAI_API_KEY);

    let failure = client
        .complete(&spec(Provider::OpenAi, "gpt-4o"), &AnalysisRequest::new("hi"))
        .await
        .unwrap_err();
    assert_eq!(failure.reason, FailureReason::InvalidResponse);
}

#[tokio::test]
async fn test_anthropic_sends_versioned_request() {
    let mock = MockAnthropic::start().await;
    mock.mock_success("안녕하세요").await;
    let client = AnthropicProvider::new(http(), &mock.uri(), TEST_ANTHROPIC_API_KEY);

    let request = AnalysisRequest::new("질문").with_system_prompt("시스템");
    let completion = client
        .complete(&spec(Provider::Anthropic, "claude-sonnet-4"), &request)
        .await
        .unwrap();

    assert_eq!(completion.content, "안녕하세요");
    assert_eq!(completion.input_tokens, 1500);
    assert_eq!(completion.output_tokens, 400);

    let body = &mock.request_bodies().await[0];
    assert_eq!(body["model"], "claude-sonnet-4-20250514");
    assert_eq!(body["system"], "시스템");
    assert_eq!(body["max_tokens"], 4096);
    assert_eq!(body["messages"][0]["content"], "질문");
}

#[tokio::test]
async fn test_anthropic_rate_limit() {
    let mock = MockAnthropic::start().await;
    mock.mock_status(429).await;
    let client = AnthropicProvider::new(http(), &mock.uri(), TEST_ANTHROPIC_API_KEY);

    let failure = client
        .complete(
            &spec(Provider::Anthropic, "claude-3-5-haiku"),
            &AnalysisRequest::new("hi"),
        )
        .await
        .unwrap_err();
    assert_eq!(failure.reason, FailureReason::RateLimited);
    assert!(failure.detail.contains("429"));
}

#[tokio::test]
async fn test_google_sends_key_as_query_and_json_mime_type() {
    let mock = MockGoogle::start().await;
    mock.mock_success("gemini-2.5-flash", r#"{"summary": "ok"}"#)
        .await;
    let client = GoogleProvider::new(http(), &mock.uri(), TEST_GOOGLE_API_KEY);

    let request = AnalysisRequest::new("요약").with_system_prompt("규칙").json();
    let completion = client
        .complete(&spec(Provider::Google, "gemini-2.5-flash"), &request)
        .await
        .unwrap();

    assert_eq!(completion.content, r#"{"summary": "ok"}"#);
    assert_eq!(completion.input_tokens, 800);
    assert_eq!(completion.output_tokens, 150);

    let body = &mock.request_bodies().await[0];
    assert_eq!(body["contents"][0]["parts"][0]["text"], "규칙\n\n요약");
    assert_eq!(
        body["generationConfig"]["responseMimeType"],
        "application/json"
    );
    assert_eq!(body["generationConfig"]["maxOutputTokens"], 8192);
}

#[tokio::test]
async fn test_google_blocked_prompt_is_invalid_response() {
    let mock = MockGoogle::start().await;
    mock.mock_empty_candidates("gemini-2.5-pro").await;
    let client = GoogleProvider::new(http(), &mock.uri(), TEST_GOOGLE_API_KEY);

    let failure = client
        .complete(
            &spec(Provider::Google, "gemini-2.5-pro"),
            &AnalysisRequest::new("hi"),
        )
        .await
        .unwrap_err();
    assert_eq!(failure.reason, FailureReason::InvalidResponse);
}

#[tokio::test]
async fn test_google_failure_detail_does_not_leak_key() {
    let client = GoogleProvider::new(http(), "http://127.0.0.1:9", TEST_GOOGLE_API_KEY);

    let failure = client
        .complete(
            &spec(Provider::Google, "gemini-2.5-flash"),
            &AnalysisRequest::new("hi"),
        )
        .await
        .unwrap_err();
    assert!(!failure.detail.contains(TEST_GOOGLE_API_KEY));
    assert!(!failure.to_string().contains(TEST_GOOGLE_API_KEY));
}
