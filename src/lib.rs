//! CallMate - tier-routed LLM gateway for call transcript analysis
//!
//! This library maps service tiers to provider/model pairs, routes requests
//! along each tier's fallback chain, and runs the multi-stage call analysis
//! pipeline on top of that router.

pub mod analysis;
pub mod config;
pub mod error;
pub mod metrics;
pub mod output;
pub mod prompts;
pub mod providers;
pub mod tiers;

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::info;

pub use crate::analysis::{CallAnalysis, CallAnalyzer, CallTranscript};
pub use crate::config::Config;
pub use crate::error::{AppError, AppResult, ConfigurationError, RouteError};
pub use crate::prompts::PromptCache;
pub use crate::providers::{AnalysisRequest, LlmProvider, ProviderRegistry};
pub use crate::tiers::{ModelCatalog, ModelRouter, RoutedCompletion, RoutingTable, Tier};

/// Application state shared by every command
pub struct AppState {
    pub config: Config,
    pub router: Arc<ModelRouter>,
    pub prompts: Arc<PromptCache>,
    pub analyzer: Arc<CallAnalyzer>,
}

impl AppState {
    /// Create application state with provider clients built from `config`
    pub fn new(config: Config) -> Result<Self> {
        // Per-call deadlines are enforced by the router, not the HTTP client
        let http_client = reqwest::Client::builder()
            .pool_max_idle_per_host(16)
            .build()
            .context("Failed to build HTTP client")?;

        let registry = ProviderRegistry::from_config(&config, http_client);
        Self::with_registry(config, registry)
    }

    /// Create application state around an existing provider registry
    ///
    /// Fails if the routing table is malformed, names a model outside the
    /// catalog, or needs a provider the registry does not have.
    pub fn with_registry(config: Config, registry: ProviderRegistry) -> Result<Self> {
        let table = match &config.routing_config_path {
            Some(path) => RoutingTable::from_file(path)
                .with_context(|| format!("Failed to load routing table {}", path.display()))?,
            None => RoutingTable::builtin(),
        };

        let router = Arc::new(
            ModelRouter::new(
                table,
                ModelCatalog::builtin(),
                registry,
                config.provider_timeout,
            )
            .context("Routing configuration rejected")?,
        );

        let prompts = Arc::new(PromptCache::from_dir(&config.prompts_dir));
        let analyzer = Arc::new(
            CallAnalyzer::new(router.clone(), prompts.clone())
                .context("Failed to build analysis pipeline")?,
        );

        info!(
            prompts_dir = %config.prompts_dir.display(),
            custom_routing = config.routing_config_path.is_some(),
            "Application state initialized"
        );

        Ok(Self {
            config,
            router,
            prompts,
            analyzer,
        })
    }
}
