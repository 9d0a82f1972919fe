//! Mock Google Generative Language API
//!
//! - POST /models/{model}:generateContent?key=...

use serde_json::{json, Value};
use wiremock::{
    matchers::{body_string_contains, method, path, query_param},
    Mock, MockServer, ResponseTemplate,
};

pub const TEST_GOOGLE_API_KEY: &str = "test-google-api-key";

pub struct MockGoogle {
    server: MockServer,
}

impl MockGoogle {
    pub async fn start() -> Self {
        Self {
            server: MockServer::start().await,
        }
    }

    pub fn uri(&self) -> String {
        self.server.uri()
    }

    pub fn generate_body(text: &str, prompt_tokens: u32, candidate_tokens: u32) -> Value {
        json!({
            "candidates": [{
                "content": {"role": "model", "parts": [{"text": text}]},
                "finishReason": "STOP"
            }],
            "usageMetadata": {
                "promptTokenCount": prompt_tokens,
                "candidatesTokenCount": candidate_tokens,
                "totalTokenCount": prompt_tokens + candidate_tokens
            }
        })
    }

    fn generate(model: &str) -> wiremock::MockBuilder {
        Mock::given(method("POST"))
            .and(path(format!("/models/{}:generateContent", model)))
            .and(query_param("key", TEST_GOOGLE_API_KEY))
    }

    pub async fn mock_success(&self, model: &str, text: &str) {
        Self::generate(model)
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::generate_body(text, 800, 150)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_success_for(&self, model: &str, marker: &str, text: &str) {
        Self::generate(model)
            .and(body_string_contains(marker))
            .respond_with(ResponseTemplate::new(200).set_body_json(Self::generate_body(text, 800, 150)))
            .mount(&self.server)
            .await;
    }

    pub async fn mock_status(&self, model: &str, status: u16) {
        Self::generate(model)
            .respond_with(ResponseTemplate::new(status).set_body_json(json!({
                "error": {"code": status, "message": "mock failure", "status": "UNAVAILABLE"}
            })))
            .mount(&self.server)
            .await;
    }

    /// 200 response with no candidates, as returned for blocked prompts
    pub async fn mock_empty_candidates(&self, model: &str) {
        Self::generate(model)
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "promptFeedback": {"blockReason": "SAFETY"}
            })))
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
