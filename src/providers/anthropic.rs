//! Anthropic messages API client
//!
//! Anthropic takes the system prompt as a top-level field rather than a
//! message, and requires `max_tokens` on every request.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::tiers::catalog::ModelSpec;
use crate::tiers::types::Provider;

use super::provider::{send_json, AnalysisRequest, Completion, LlmProvider, ProviderFailure};

const ANTHROPIC_API_VERSION: &str = "2023-06-01";

/// Anthropic client (Claude models)
pub struct AnthropicProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Usage {
    input_tokens: u32,
    output_tokens: u32,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
    fn provider(&self) -> Provider {
        Provider::Anthropic
    }

    #[instrument(skip(self, request), fields(model = %model.api_model_id))]
    async fn complete(
        &self,
        model: &ModelSpec,
        request: &AnalysisRequest,
    ) -> Result<Completion, ProviderFailure> {
        let body = MessagesRequest {
            model: &model.api_model_id,
            max_tokens: model.max_tokens,
            temperature: model.temperature,
            system: request.system_prompt.as_deref(),
            messages: vec![Message {
                role: "user",
                content: &request.prompt,
            }],
        };

        let url = format!("{}/messages", self.base_url);
        debug!(url = %url, "Calling Anthropic messages API");

        let response: MessagesResponse = send_json(
            Provider::Anthropic,
            self.client
                .post(&url)
                .header("x-api-key", &self.api_key)
                .header("anthropic-version", ANTHROPIC_API_VERSION)
                .json(&body),
        )
        .await?;

        let content: String = response
            .content
            .into_iter()
            .filter(|b| b.block_type == "text")
            .filter_map(|b| b.text)
            .collect::<Vec<_>>()
            .join("");

        if content.trim().is_empty() {
            return Err(ProviderFailure::invalid_response(
                "Anthropic returned no text blocks",
            ));
        }

        let (input_tokens, output_tokens) = response
            .usage
            .map(|u| (u.input_tokens, u.output_tokens))
            .unwrap_or_default();

        Ok(Completion {
            content,
            input_tokens,
            output_tokens,
        })
    }
}
