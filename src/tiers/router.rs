//! Tier-based model routing
//!
//! Selects the configured model for a tier and walks its fallback chain
//! until one provider succeeds.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use crate::{
    error::{ConfigurationError, RouteError},
    metrics,
    providers::{AnalysisRequest, Completion, FailureReason, ProviderFailure, ProviderRegistry},
};

use super::{
    catalog::{ModelCatalog, ModelSpec},
    config::RoutingTable,
    types::{ModelRef, Provider, Tier},
};

/// One failed provider attempt, kept for diagnostics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    pub provider: Provider,
    pub model: String,
    pub reason: FailureReason,
}

/// Result of a successful route
#[derive(Debug, Clone, Serialize)]
pub struct RoutedCompletion {
    pub tier: Tier,
    /// Model that produced the response
    pub target: ModelRef,
    pub display_name: String,
    pub content: String,
    /// Parsed output when the request declared an output schema
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parsed: Option<Value>,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub estimated_cost_usd: f64,
    /// Whether a fallback entry served the request
    pub was_fallback: bool,
    /// Failures that preceded the success, in order
    pub failed_attempts: Vec<AttemptRecord>,
}

/// Tier-based model router
///
/// Stateless per call: holds only the immutable routing table, catalog and
/// provider registry, so one instance can be shared behind `Arc` and called
/// concurrently. Within a call, candidates are tried strictly in sequence.
pub struct ModelRouter {
    table: RoutingTable,
    catalog: ModelCatalog,
    registry: ProviderRegistry,
    call_timeout: Duration,
}

impl ModelRouter {
    /// Create a router, validating that every referenced model is in the
    /// catalog and every referenced provider has a client.
    pub fn new(
        table: RoutingTable,
        catalog: ModelCatalog,
        registry: ProviderRegistry,
        call_timeout: Duration,
    ) -> Result<Self, ConfigurationError> {
        catalog.check_table(&table)?;

        if let Some(missing) = table.providers().into_iter().find(|p| !registry.contains(*p)) {
            return Err(ConfigurationError::ProviderNotRegistered(missing));
        }

        info!(
            providers = registry.len(),
            timeout_secs = call_timeout.as_secs_f64(),
            "Model router initialized"
        );

        Ok(Self {
            table,
            catalog,
            registry,
            call_timeout,
        })
    }

    pub fn table(&self) -> &RoutingTable {
        &self.table
    }

    /// Route a request for a tier given by name
    ///
    /// Unknown names fail with a configuration error before any provider is
    /// touched.
    pub async fn route_named(
        &self,
        tier: &str,
        request: &AnalysisRequest,
    ) -> Result<RoutedCompletion, RouteError> {
        let tier: Tier = tier.parse()?;
        self.route(tier, request).await
    }

    /// Route a request for `tier`
    ///
    /// Tries the tier's primary model, then each fallback in declared order,
    /// returning the first success. Fails with `AllProvidersExhausted`
    /// carrying every attempt once the chain runs out.
    #[instrument(skip(self, request), fields(tier = %tier))]
    pub async fn route(
        &self,
        tier: Tier,
        request: &AnalysisRequest,
    ) -> Result<RoutedCompletion, RouteError> {
        let config = self
            .table
            .get(tier)
            .ok_or(ConfigurationError::TierNotRegistered(tier))?;

        let mut failures: Vec<AttemptRecord> = Vec::new();

        for (index, target) in config.candidates().enumerate() {
            let spec = self
                .catalog
                .lookup(target)
                .ok_or_else(|| ConfigurationError::UnknownModel(target.clone()))?;

            debug!(
                provider = %target.provider,
                model = %target.model,
                attempt = index + 1,
                "Invoking provider"
            );

            match self.attempt(spec, request).await {
                Ok((completion, parsed)) => {
                    metrics::record_attempt(target, "success");
                    let was_fallback = index > 0;
                    if was_fallback {
                        metrics::record_fallback(tier);
                    }

                    info!(
                        provider = %target.provider,
                        model = %target.model,
                        was_fallback,
                        failed_attempts = failures.len(),
                        "Request routed"
                    );

                    return Ok(RoutedCompletion {
                        tier,
                        target: target.clone(),
                        display_name: spec.display_name.clone(),
                        estimated_cost_usd: spec
                            .cost(completion.input_tokens, completion.output_tokens),
                        content: completion.content,
                        parsed,
                        input_tokens: completion.input_tokens,
                        output_tokens: completion.output_tokens,
                        was_fallback,
                        failed_attempts: failures,
                    });
                }
                Err(failure) => {
                    metrics::record_attempt(target, failure.reason.as_str());
                    warn!(
                        provider = %target.provider,
                        model = %target.model,
                        reason = %failure.reason,
                        detail = %failure.detail,
                        "Provider attempt failed, advancing fallback chain"
                    );
                    failures.push(AttemptRecord {
                        provider: target.provider,
                        model: target.model.clone(),
                        reason: failure.reason,
                    });
                }
            }
        }

        metrics::record_exhausted(tier);
        warn!(attempts = failures.len(), "All providers exhausted for tier");

        Err(RouteError::AllProvidersExhausted {
            tier,
            attempts: failures,
        })
    }

    /// One bounded provider call plus the output schema check
    async fn attempt(
        &self,
        spec: &ModelSpec,
        request: &AnalysisRequest,
    ) -> Result<(Completion, Option<Value>), ProviderFailure> {
        let client = self
            .registry
            .get(spec.provider)
            .ok_or_else(|| ProviderFailure::new(FailureReason::Unknown, "no client registered"))?;

        let started = Instant::now();
        let outcome = tokio::time::timeout(self.call_timeout, client.complete(spec, request)).await;
        metrics::record_call_duration(spec.provider, started.elapsed());

        let completion = match outcome {
            Ok(result) => result?,
            Err(_) => {
                return Err(ProviderFailure::timeout(format!(
                    "No response within {:?}",
                    self.call_timeout
                )))
            }
        };

        let parsed = match &request.output_schema {
            Some(schema) => Some(schema.check(&completion.content)?),
            None => None,
        };

        Ok((completion, parsed))
    }
}
