//! Mock Anthropic API
//!
//! - POST /messages

use std::time::Duration;

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, header, method, path},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_ANTHROPIC_API_KEY: &str = "test-anthropic-api-key";

pub struct MockAnthropic {
    server: MockServer,
}

impl MockAnthropic {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn message_body(text: &str, input_tokens: u32, output_tokens: u32) -> Value {
        json!({
            "id": "msg_test",
            "type": "message",
            "role": "assistant",
            "model": "claude-sonnet-4-20250514",
            "content": [{"type": "text", "text": text}],
            "stop_reason": "end_turn",
            "usage": {"input_tokens": input_tokens, "output_tokens": output_tokens}
        })
    }

    fn messages() -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path("/messages"))
            .and(header("x-api-key", TEST_ANTHROPIC_API_KEY))
            .and(header("anthropic-version", "2023-06-01"))
    }

    pub async fn mock_success(&self, text: &str) {
        Self::messages()
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::message_body(text, 1500, 400)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_success_for(&self, marker: &str, text: &str) {
        Self::messages()
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::message_body(text, 1500, 400)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_status(&self, status: u16) {
        Self::messages()
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "type": "error",
                "error": {"type": "rate_limit_error", "message": "mock failure"}
            })))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_slow(&self, text: &str, delay: Duration) {
        Self::messages()
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(Self::message_body(text, 10, 10))
                    .set_delay(delay),
            )
            .mount(&self.server)
            .await;
    }

    pub async fn request_bodies(&self) -> Vec<Value> {
        self.server
            .received_requests()
            .await
            .unwrap_or_default()
            .iter()
            .filter_map(|r| serde_json::from_slice(&r.body).ok())
            .collect()
    }

    pub async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|r| r.len())
            .unwrap_or_default()
    }
}
