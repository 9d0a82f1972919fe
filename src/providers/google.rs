//! Google Gemini generateContent client

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::tiers::catalog::ModelSpec;
use crate::tiers::types::Provider;

use super::provider::{send_json, AnalysisRequest, Completion, LlmProvider, ProviderFailure};

/// Google client (Gemini models)
pub struct GoogleProvider {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    role: &'static str,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_mime_type: Option<&'static str>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
struct ResponseContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

impl GoogleProvider {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: &str) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    /// "gemini-2.5-pro" and "models/gemini-2.5-pro" both resolve to the latter
    fn model_path(model_id: &str) -> String {
        if model_id.starts_with("models/") {
            model_id.to_string()
        } else {
            format!("models/{}", model_id)
        }
    }
}

#[async_trait]
impl LlmProvider for GoogleProvider {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    #[instrument(skip(self, request), fields(model = %model.api_model_id))]
    async fn complete(
        &self,
        model: &ModelSpec,
        request: &AnalysisRequest,
    ) -> Result<Completion, ProviderFailure> {
        // Gemini has no separate system role here; prepend it to the prompt
        let text = match &request.system_prompt {
            Some(system) => format!("{}\n\n{}", system, request.prompt),
            None => request.prompt.clone(),
        };

        let body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text }],
            }],
            generation_config: GenerationConfig {
                temperature: model.temperature,
                max_output_tokens: model.max_tokens,
                response_mime_type: (request.json_mode && model.supports_json_mode)
                    .then_some("application/json"),
            },
        };

        let url = format!(
            "{}/{}:generateContent",
            self.base_url,
            Self::model_path(&model.api_model_id)
        );
        debug!(url = %url, "Calling Google generateContent");

        let response: GenerateContentResponse = send_json(
            Provider::Google,
            self.client
                .post(&url)
                .query(&[("key", &self.api_key)])
                .json(&body),
        )
        .await?;

        let content: String = response
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|c| {
                c.parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if content.trim().is_empty() {
            return Err(ProviderFailure::invalid_response(
                "Google returned no candidates",
            ));
        }

        let (input_tokens, output_tokens) = response
            .usage_metadata
            .map(|u| (u.prompt_token_count, u.candidates_token_count))
            .unwrap_or_default();

        Ok(Completion {
            content,
            input_tokens,
            output_tokens,
        })
    }
}
