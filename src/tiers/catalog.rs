//! Model catalog
//!
//! Static per-model metadata: the provider-side model id, display name,
//! generation defaults and token pricing used for cost reporting.

use serde::Serialize;

use crate::error::ConfigurationError;

use super::config::RoutingTable;
use super::types::{ModelRef, Provider};

/// Metadata for one routable model
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelSpec {
    /// Routing name used in the tier table (e.g., "claude-sonnet-4")
    pub model: String,
    pub provider: Provider,
    /// Identifier sent to the provider API
    pub api_model_id: String,
    pub display_name: String,
    /// USD per 1M input tokens
    pub input_cost_per_1m: f64,
    /// USD per 1M output tokens
    pub output_cost_per_1m: f64,
    pub max_tokens: u32,
    pub temperature: f32,
    pub supports_json_mode: bool,
}

impl ModelSpec {
    #[allow(clippy::too_many_arguments)]
    fn new(
        provider: Provider,
        model: &str,
        api_model_id: &str,
        display_name: &str,
        input_cost_per_1m: f64,
        output_cost_per_1m: f64,
        max_tokens: u32,
    ) -> Self {
        Self {
            model: model.to_string(),
            provider,
            api_model_id: api_model_id.to_string(),
            display_name: display_name.to_string(),
            input_cost_per_1m,
            output_cost_per_1m,
            max_tokens,
            temperature: 0.3,
            supports_json_mode: true,
        }
    }

    /// Estimated cost in USD for a call
    pub fn cost(&self, input_tokens: u32, output_tokens: u32) -> f64 {
        (input_tokens as f64 / 1_000_000.0) * self.input_cost_per_1m
            + (output_tokens as f64 / 1_000_000.0) * self.output_cost_per_1m
    }
}

/// Catalog of known models
#[derive(Debug, Clone)]
pub struct ModelCatalog {
    models: Vec<ModelSpec>,
}

impl ModelCatalog {
    pub fn new(models: Vec<ModelSpec>) -> Self {
        Self { models }
    }

    /// Models offered by the supported providers
    pub fn builtin() -> Self {
        Self::new(vec![
            ModelSpec::new(
                Provider::Google,
                "gemini-2.5-flash",
                "gemini-2.5-flash",
                "Gemini 2.5 Flash",
                0.30,
                2.50,
                8192,
            ),
            ModelSpec::new(
                Provider::Google,
                "gemini-2.5-pro",
                "gemini-2.5-pro",
                "Gemini 2.5 Pro",
                1.25,
                10.00,
                8192,
            ),
            ModelSpec::new(
                Provider::OpenAi,
                "gpt-4o-mini",
                "gpt-4o-mini",
                "GPT-4o Mini",
                0.15,
                0.60,
                4096,
            ),
            ModelSpec::new(
                Provider::OpenAi,
                "gpt-4o",
                "gpt-4o",
                "GPT-4o",
                5.00,
                15.00,
                4096,
            ),
            ModelSpec::new(
                Provider::Anthropic,
                "claude-3-5-haiku",
                "claude-3-5-haiku-latest",
                "Claude 3.5 Haiku",
                1.00,
                5.00,
                4096,
            ),
            ModelSpec::new(
                Provider::Anthropic,
                "claude-sonnet-4",
                "claude-sonnet-4-20250514",
                "Claude Sonnet 4",
                3.00,
                15.00,
                4096,
            ),
        ])
    }

    pub fn lookup(&self, target: &ModelRef) -> Option<&ModelSpec> {
        self.models
            .iter()
            .find(|m| m.provider == target.provider && m.model == target.model)
    }

    /// Estimated cost in USD, `None` for models outside the catalog
    pub fn estimate_cost(
        &self,
        target: &ModelRef,
        input_tokens: u32,
        output_tokens: u32,
    ) -> Option<f64> {
        self.lookup(target)
            .map(|spec| spec.cost(input_tokens, output_tokens))
    }

    /// Ensure every pair the routing table references is known
    pub fn check_table(&self, table: &RoutingTable) -> Result<(), ConfigurationError> {
        match table.targets().find(|t| self.lookup(t).is_none()) {
            Some(unknown) => Err(ConfigurationError::UnknownModel(unknown.clone())),
            None => Ok(()),
        }
    }
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
