//! Error types for CallMate
//!
//! This module defines the error taxonomy used throughout the crate:
//! configuration defects, routing exhaustion and the application-level
//! wrapper used by the analysis pipeline and the CLI.

use serde::Serialize;
use thiserror::Error;

use crate::prompts::TemplateError;
use crate::tiers::router::AttemptRecord;
use crate::tiers::types::{ModelRef, Provider, Tier};

/// Deployment or startup defects.
///
/// Raised while validating the routing table at startup. If one of these
/// reaches request time it indicates a broken deployment and is reported as
/// a server-side failure, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("No routing configuration registered for tier {0}")]
    TierNotRegistered(Tier),

    #[error("Duplicate routing entry for tier {0}")]
    DuplicateTier(Tier),

    #[error("Tier {tier} has an empty model identifier")]
    EmptyModel { tier: Tier },

    #[error("Tier {tier} lists {target} more than once in its fallback chain")]
    DuplicateFallback { tier: Tier, target: ModelRef },

    #[error("Tier {tier} lists its primary {target} in its fallback chain")]
    PrimaryInFallback { tier: Tier, target: ModelRef },

    #[error("Provider {0} is referenced by the routing table but has no client registered")]
    ProviderNotRegistered(Provider),

    #[error("Model {0} is not in the model catalog")]
    UnknownModel(ModelRef),

    #[error("Invalid routing configuration: {0}")]
    InvalidConfig(String),

    #[error("Invalid output schema: {0}")]
    InvalidOutputSchema(String),
}

/// Errors surfaced by `ModelRouter::route`.
///
/// Individual provider failures are recovered inside the router; only a
/// configuration defect or total exhaustion leaves it.
#[derive(Debug, Clone, Error)]
pub enum RouteError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("All providers exhausted for tier {tier} after {} attempts", .attempts.len())]
    AllProvidersExhausted {
        tier: Tier,
        attempts: Vec<AttemptRecord>,
    },
}

/// Application-level errors
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("All providers exhausted for tier {tier} after {} attempts", .attempts.len())]
    AllProvidersExhausted {
        tier: Tier,
        attempts: Vec<AttemptRecord>,
    },

    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Internal error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl From<RouteError> for AppError {
    fn from(err: RouteError) -> Self {
        match err {
            RouteError::Configuration(e) => AppError::Configuration(e),
            RouteError::AllProvidersExhausted { tier, attempts } => {
                AppError::AllProvidersExhausted { tier, attempts }
            }
        }
    }
}

/// Error response body
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: ErrorBody,
}

/// Error details
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ErrorDetails>,
}

/// Attempt history attached to exhaustion errors
#[derive(Debug, Serialize)]
pub struct ErrorDetails {
    pub tier: Tier,
    pub attempts: Vec<AttemptRecord>,
}

impl AppError {
    /// Stable machine-readable error code
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Configuration(_) => "CONFIGURATION_ERROR",
            AppError::AllProvidersExhausted { .. } => "ALL_PROVIDERS_EXHAUSTED",
            AppError::Template(_) => "TEMPLATE_ERROR",
            AppError::InvalidInput(_) => "INVALID_INPUT",
            AppError::Io(_) => "IO_ERROR",
            AppError::Json(_) => "INVALID_JSON",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Whether the failure is on our side rather than the caller's
    pub fn is_server_fault(&self) -> bool {
        !matches!(self, AppError::InvalidInput(_) | AppError::Json(_))
    }

    /// Build the diagnostic body for this error.
    ///
    /// Messages are generic for internal failures so that nothing from the
    /// request or the provider credentials ends up in the output.
    pub fn to_response(&self) -> ErrorResponse {
        let (message, details) = match self {
            AppError::AllProvidersExhausted { tier, attempts } => (
                self.to_string(),
                Some(ErrorDetails {
                    tier: *tier,
                    attempts: attempts.clone(),
                }),
            ),
            AppError::Io(_) => ("I/O failure".to_string(), None),
            AppError::Internal(_) => ("Internal error".to_string(), None),
            _ => (self.to_string(), None),
        };

        ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message,
                details,
            },
        }
    }
}

/// Result type alias for convenience
pub type AppResult<T> = Result<T, AppError>;
