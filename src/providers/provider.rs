//! LLM provider abstraction layer
//!
//! Defines the trait every model API client implements, the request and
//! completion types passed through it, and the failure taxonomy the router
//! uses to decide whether to advance along a fallback chain.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use reqwest::RequestBuilder;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::Config;
use crate::output::OutputSchema;
use crate::tiers::catalog::ModelSpec;
use crate::tiers::types::Provider;

use super::{AnthropicProvider, GoogleProvider, OpenAiProvider};

/// Longest provider error text kept in a failure detail
const MAX_DETAIL_CHARS: usize = 200;

/// Why a single provider call failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureReason {
    RateLimited,
    Timeout,
    InvalidResponse,
    AuthError,
    Unknown,
}

impl FailureReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureReason::RateLimited => "rate_limited",
            FailureReason::Timeout => "timeout",
            FailureReason::InvalidResponse => "invalid_response",
            FailureReason::AuthError => "auth_error",
            FailureReason::Unknown => "unknown",
        }
    }

    /// Map an upstream HTTP status to a failure reason
    pub fn from_status(status: u16) -> Self {
        match status {
            429 => FailureReason::RateLimited,
            401 | 403 => FailureReason::AuthError,
            408 | 504 => FailureReason::Timeout,
            _ => FailureReason::Unknown,
        }
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failure of one provider call
///
/// `detail` is for logs only. It carries the status code and a truncated
/// provider message, never credentials or request content.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{reason}: {detail}")]
pub struct ProviderFailure {
    pub reason: FailureReason,
    pub detail: String,
}

impl ProviderFailure {
    pub fn new(reason: FailureReason, detail: impl Into<String>) -> Self {
        Self {
            reason,
            detail: truncate(&detail.into()),
        }
    }

    pub fn timeout(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::Timeout, detail)
    }

    pub fn invalid_response(detail: impl Into<String>) -> Self {
        Self::new(FailureReason::InvalidResponse, detail)
    }

    /// Failure from a non-success HTTP response
    pub fn from_status(status: u16, body: &str) -> Self {
        Self::new(
            FailureReason::from_status(status),
            format!("HTTP {}: {}", status, body.trim()),
        )
    }

    /// Failure from a transport-level reqwest error
    pub fn from_transport(err: reqwest::Error) -> Self {
        // The URL may carry a query-string API key
        let err = err.without_url();
        let reason = if err.is_timeout() {
            FailureReason::Timeout
        } else if err.is_decode() {
            FailureReason::InvalidResponse
        } else if let Some(status) = err.status() {
            FailureReason::from_status(status.as_u16())
        } else {
            FailureReason::Unknown
        };
        Self::new(reason, err.to_string())
    }
}

fn truncate(s: &str) -> String {
    if s.chars().count() <= MAX_DETAIL_CHARS {
        s.to_string()
    } else {
        let mut out: String = s.chars().take(MAX_DETAIL_CHARS).collect();
        out.push('…');
        out
    }
}

/// Optional company/industry context travelling with a request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub industry: Option<String>,
}

/// Payload handed to whichever model the router selects
///
/// The router never looks at the prompt or context; it only applies the
/// optional output schema to whatever comes back.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub prompt: String,
    pub system_prompt: Option<String>,
    /// Ask the provider for a JSON object response
    pub json_mode: bool,
    pub context: Option<RequestContext>,
    pub output_schema: Option<OutputSchema>,
}

impl AnalysisRequest {
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            system_prompt: None,
            json_mode: false,
            context: None,
            output_schema: None,
        }
    }

    pub fn with_system_prompt(mut self, system_prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(system_prompt.into());
        self
    }

    pub fn json(mut self) -> Self {
        self.json_mode = true;
        self
    }

    pub fn with_context(mut self, context: RequestContext) -> Self {
        self.context = Some(context);
        self
    }

    /// Declare the shape the output must have; implies JSON mode
    pub fn with_output_schema(mut self, schema: OutputSchema) -> Self {
        self.json_mode = true;
        self.output_schema = Some(schema);
        self
    }
}

/// Successful provider response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Completion {
    pub content: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
}

/// Trait implemented by every model API client
///
/// Implementations own the transport only. Selection, fallback and timeouts
/// belong to the router.
///
/// # Security
///
/// Implementations MUST NOT put API keys or request content into a
/// `ProviderFailure`.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Which vendor this client talks to
    fn provider(&self) -> Provider;

    /// Run one completion against `model`
    async fn complete(
        &self,
        model: &ModelSpec,
        request: &AnalysisRequest,
    ) -> Result<Completion, ProviderFailure>;
}

/// Send a request and decode a JSON body, classifying every failure
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: Provider,
    request: RequestBuilder,
) -> Result<T, ProviderFailure> {
    let response = request
        .send()
        .await
        .map_err(ProviderFailure::from_transport)?;

    let status = response.status();
    debug!(provider = %provider, status = %status, "Provider responded");

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let failure = ProviderFailure::from_status(status.as_u16(), &body);
        warn!(
            provider = %provider,
            status = %status,
            reason = %failure.reason,
            "Provider request failed"
        );
        return Err(failure);
    }

    let bytes = response
        .bytes()
        .await
        .map_err(ProviderFailure::from_transport)?;
    serde_json::from_slice(&bytes).map_err(|e| {
        ProviderFailure::invalid_response(format!("Undecodable {} response: {}", provider, e))
    })
}

/// Provider → client lookup used by the router
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    clients: HashMap<Provider, Arc<dyn LlmProvider>>,
}

impl ProviderRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a client, replacing any previous one for the same provider
    pub fn register(mut self, client: Arc<dyn LlmProvider>) -> Self {
        self.clients.insert(client.provider(), client);
        self
    }

    /// Register a client for every provider that has credentials configured
    pub fn from_config(config: &Config, http_client: reqwest::Client) -> Self {
        let mut registry = Self::new();

        if let Some(key) = &config.openai_api_key {
            registry = registry.register(Arc::new(OpenAiProvider::new(
                http_client.clone(),
                &config.openai_api_url,
                key,
            )));
        }
        if let Some(key) = &config.anthropic_api_key {
            registry = registry.register(Arc::new(AnthropicProvider::new(
                http_client.clone(),
                &config.anthropic_api_url,
                key,
            )));
        }
        if let Some(key) = &config.google_api_key {
            registry = registry.register(Arc::new(GoogleProvider::new(
                http_client,
                &config.google_api_url,
                key,
            )));
        }

        registry
    }

    pub fn get(&self, provider: Provider) -> Option<Arc<dyn LlmProvider>> {
        self.clients.get(&provider).cloned()
    }

    pub fn contains(&self, provider: Provider) -> bool {
        self.clients.contains_key(&provider)
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut providers: Vec<&Provider> = self.clients.keys().collect();
        providers.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &providers)
            .finish()
    }
}
