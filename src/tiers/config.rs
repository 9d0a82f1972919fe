//! Tier routing configuration
//!
//! The routing table maps every subscription tier to one primary
//! (provider, model) pair plus an optional ordered fallback chain. It is
//! loaded once at startup, validated, and never mutated afterwards.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ConfigurationError;

use super::types::{ModelRef, Provider, Tier};

/// Routing policy for one tier
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TierConfig {
    pub tier: Tier,
    /// Model tried first
    pub primary: ModelRef,
    /// Alternates tried in declared order after the primary fails
    #[serde(default)]
    pub fallback_chain: Vec<ModelRef>,
}

impl TierConfig {
    pub fn new(tier: Tier, primary: ModelRef) -> Self {
        Self {
            tier,
            primary,
            fallback_chain: Vec::new(),
        }
    }

    pub fn with_fallback(mut self, target: ModelRef) -> Self {
        self.fallback_chain.push(target);
        self
    }

    /// Primary followed by the fallback chain, in invocation order
    pub fn candidates(&self) -> impl Iterator<Item = &ModelRef> {
        std::iter::once(&self.primary).chain(self.fallback_chain.iter())
    }

    fn validate(&self) -> Result<(), ConfigurationError> {
        if self.candidates().any(|m| m.model.trim().is_empty()) {
            return Err(ConfigurationError::EmptyModel { tier: self.tier });
        }

        let mut seen = HashSet::new();
        for target in &self.fallback_chain {
            if *target == self.primary {
                return Err(ConfigurationError::PrimaryInFallback {
                    tier: self.tier,
                    target: target.clone(),
                });
            }
            if !seen.insert(target) {
                return Err(ConfigurationError::DuplicateFallback {
                    tier: self.tier,
                    target: target.clone(),
                });
            }
        }

        Ok(())
    }
}

/// On-disk representation of the routing table
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RoutingFile {
    tiers: Vec<TierConfig>,
}

/// Validated, immutable tier → model routing table
///
/// Only obtainable through the validating constructors, so holding one
/// guarantees that every tier is registered exactly once and that no
/// fallback chain repeats a pair or contains its own primary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingTable {
    entries: HashMap<Tier, TierConfig>,
}

impl RoutingTable {
    /// Build and validate a routing table from its entries
    pub fn new(entries: Vec<TierConfig>) -> Result<Self, ConfigurationError> {
        let mut map = HashMap::with_capacity(entries.len());

        for entry in entries {
            entry.validate()?;
            let tier = entry.tier;
            if map.insert(tier, entry).is_some() {
                return Err(ConfigurationError::DuplicateTier(tier));
            }
        }

        for tier in Tier::ALL {
            if !map.contains_key(&tier) {
                return Err(ConfigurationError::TierNotRegistered(tier));
            }
        }

        Ok(Self { entries: map })
    }

    /// The default policy: cheapest model for free, premium provider for
    /// paid tiers, cross-provider fallback for enterprise.
    pub fn builtin() -> Self {
        let entries = vec![
            TierConfig::new(Tier::Free, ModelRef::new(Provider::Google, "gemini-2.5-flash")),
            TierConfig::new(Tier::Basic, ModelRef::new(Provider::Google, "gemini-2.5-pro")),
            TierConfig::new(Tier::Pro, ModelRef::new(Provider::Anthropic, "claude-sonnet-4")),
            TierConfig::new(
                Tier::Enterprise,
                ModelRef::new(Provider::Anthropic, "claude-sonnet-4"),
            )
            .with_fallback(ModelRef::new(Provider::OpenAi, "gpt-4o")),
        ];

        Self {
            entries: entries.into_iter().map(|e| (e.tier, e)).collect(),
        }
    }

    /// Parse and validate a JSON routing table
    ///
    /// ```json
    /// { "tiers": [ { "tier": "free",
    ///                "primary": { "provider": "google", "model": "gemini-2.5-flash" },
    ///                "fallback_chain": [] } ] }
    /// ```
    pub fn from_json_str(json: &str) -> Result<Self, ConfigurationError> {
        let file: RoutingFile = serde_json::from_str(json)
            .map_err(|e| ConfigurationError::InvalidConfig(e.to_string()))?;
        Self::new(file.tiers)
    }

    /// Load and validate a JSON routing table from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading routing table");

        let contents = std::fs::read_to_string(path).map_err(|e| {
            ConfigurationError::InvalidConfig(format!("{}: {}", path.display(), e))
        })?;
        let table = Self::from_json_str(&contents)?;

        info!(path = %path.display(), "Routing table loaded from file");
        Ok(table)
    }

    /// Routing policy for a tier
    pub fn get(&self, tier: Tier) -> Option<&TierConfig> {
        self.entries.get(&tier)
    }

    /// Entries ordered by tier
    pub fn entries(&self) -> Vec<&TierConfig> {
        let mut entries: Vec<&TierConfig> = self.entries.values().collect();
        entries.sort_by_key(|e| e.tier);
        entries
    }

    /// Every provider referenced anywhere in the table
    pub fn providers(&self) -> BTreeSet<Provider> {
        self.entries
            .values()
            .flat_map(|e| e.candidates().map(|m| m.provider))
            .collect()
    }

    /// Every (provider, model) pair referenced anywhere in the table
    pub fn targets(&self) -> impl Iterator<Item = &ModelRef> {
        self.entries.values().flat_map(|e| e.candidates())
    }
}

impl Serialize for RoutingTable {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        #[derive(Serialize)]
        struct View<'a> {
            tiers: Vec<&'a TierConfig>,
        }
        View {
            tiers: self.entries(),
        }
        .serialize(serializer)
    }
}
