//! LLM provider clients
//!
//! One client per vendor behind the `LlmProvider` trait, plus the registry
//! the router resolves providers through.

pub mod anthropic;
pub mod google;
#[cfg(any(test, feature = "test-utils"))]
pub mod mock;
pub mod openai;
pub mod provider;

pub use anthropic::AnthropicProvider;
pub use google::GoogleProvider;
pub use openai::OpenAiProvider;
pub use provider::{
    AnalysisRequest, Completion, FailureReason, LlmProvider, ProviderFailure, ProviderRegistry,
    RequestContext,
};
