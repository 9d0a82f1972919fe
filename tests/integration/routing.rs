//! Tier routing over real HTTP clients
//!
//! Builds the application state against the provider mocks and checks
//! primary selection, ordered fallback and exhaustion reporting.

use std::sync::Arc;
use std::time::Duration;

use callmate::{
    error::ConfigurationError,
    providers::{mock::ScriptedProvider, FailureReason, ProviderRegistry},
    tiers::{AttemptRecord, Provider},
    AnalysisRequest, AppError, AppState, RouteError, Tier,
};
use pretty_assertions::assert_eq;

use crate::common::{test_config, ProviderUrls};
use crate::mocks::{MockAnthropic, MockGoogle, MockOpenAi};

struct Providers {
    openai: MockOpenAi,
    anthropic: MockAnthropic,
    google: MockGoogle,
}

impl Providers {
    async fn start() -> Self {
        Self {
            openai: MockOpenAi::start().await,
            anthropic: MockAnthropic::start().await,
            google: MockGoogle::start().await,
        }
    }

    fn urls(&self) -> ProviderUrls {
        ProviderUrls {
            openai: self.openai.uri(),
            anthropic: self.anthropic.uri(),
            google: self.google.uri(),
        }
    }

    fn state(&self) -> AppState {
        let dir = std::env::temp_dir();
        AppState::new(test_config(&self.urls(), &dir)).unwrap()
    }

    async fn total_requests(&self) -> usize {
        self.openai.request_count().await
            + self.anthropic.request_count().await
            + self.google.request_count().await
    }
}

#[tokio::test]
async fn test_each_tier_selects_documented_primary() {
    let providers = Providers::start().await;
    providers.google.mock_success("gemini-2.5-flash", "flash").await;
    providers.google.mock_success("gemini-2.5-pro", "pro").await;
    providers.anthropic.mock_success("sonnet").await;
    providers.openai.mock_success("gpt").await;
    let state = providers.state();

    let expected = [
        (Tier::Free, Provider::Google, "gemini-2.5-flash", "flash"),
        (Tier::Basic, Provider::Google, "gemini-2.5-pro", "pro"),
        (Tier::Pro, Provider::Anthropic, "claude-sonnet-4", "sonnet"),
        (Tier::Enterprise, Provider::Anthropic, "claude-sonnet-4", "sonnet"),
    ];

    for (tier, provider, model, content) in expected {
        let routed = state
            .router
            .route(tier, &AnalysisRequest::new("hello"))
            .await
            .unwrap();
        assert_eq!(routed.target.provider, provider, "{}", tier);
        assert_eq!(routed.target.model, model, "{}", tier);
        assert_eq!(routed.content, content);
        assert!(!routed.was_fallback);
    }

    // The enterprise fallback was never needed
    assert_eq!(providers.openai.request_count().await, 0);
}

#[tokio::test]
async fn test_enterprise_rate_limited_falls_back_to_gpt4o() {
    let providers = Providers::start().await;
    providers.anthropic.mock_status(429).await;
    providers.openai.mock_success("fallback answer").await;
    let state = providers.state();

    let routed = state
        .router
        .route(Tier::Enterprise, &AnalysisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(routed.content, "fallback answer");
    assert_eq!(routed.target.model, "gpt-4o");
    assert!(routed.was_fallback);
    assert_eq!(
        routed.failed_attempts,
        vec![AttemptRecord {
            provider: Provider::Anthropic,
            model: "claude-sonnet-4".to_string(),
            reason: FailureReason::RateLimited,
        }]
    );
    assert_eq!(providers.anthropic.request_count().await, 1);
    assert_eq!(providers.openai.request_count().await, 1);
}

#[tokio::test]
async fn test_enterprise_exhaustion_keeps_attempt_order() {
    let providers = Providers::start().await;
    providers.anthropic.mock_status(529).await;
    providers.openai.mock_status(401).await;
    let state = providers.state();

    let err = state
        .router
        .route(Tier::Enterprise, &AnalysisRequest::new("hello"))
        .await
        .unwrap_err();

    match err {
        RouteError::AllProvidersExhausted { tier, attempts } => {
            assert_eq!(tier, Tier::Enterprise);
            let summary: Vec<_> = attempts
                .iter()
                .map(|a| (a.provider, a.model.as_str(), a.reason))
                .collect();
            assert_eq!(
                summary,
                vec![
                    (Provider::Anthropic, "claude-sonnet-4", FailureReason::Unknown),
                    (Provider::OpenAi, "gpt-4o", FailureReason::AuthError),
                ]
            );
        }
        other => panic!("expected exhaustion, got {:?}", other),
    }
}

#[tokio::test]
async fn test_free_tier_gateway_timeout_exhausts_immediately() {
    let providers = Providers::start().await;
    providers.google.mock_status("gemini-2.5-flash", 504).await;
    let state = providers.state();

    let err = state
        .router
        .route(Tier::Free, &AnalysisRequest::new("hello"))
        .await
        .unwrap_err();

    let app_error = AppError::from(err);
    let response = serde_json::to_value(app_error.to_response()).unwrap();
    assert_eq!(response["error"]["code"], "ALL_PROVIDERS_EXHAUSTED");
    assert_eq!(response["error"]["details"]["tier"], "free");
    assert_eq!(
        response["error"]["details"]["attempts"],
        serde_json::json!([
            {"provider": "google", "model": "gemini-2.5-flash", "reason": "timeout"}
        ])
    );
    assert_eq!(providers.total_requests().await, 1);
}

#[tokio::test]
async fn test_slow_primary_hits_router_timeout() {
    let providers = Providers::start().await;
    providers
        .anthropic
        .mock_slow("too late", Duration::from_secs(3))
        .await;
    providers.openai.mock_success("in time").await;

    let mut config = test_config(&providers.urls(), &std::env::temp_dir());
    config.provider_timeout = Duration::from_millis(300);
    let state = AppState::new(config).unwrap();

    let routed = state
        .router
        .route(Tier::Enterprise, &AnalysisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(routed.content, "in time");
    assert_eq!(routed.failed_attempts[0].reason, FailureReason::Timeout);
}

#[tokio::test]
async fn test_unknown_tier_reaches_no_provider() {
    let providers = Providers::start().await;
    providers.google.mock_success("gemini-2.5-flash", "x").await;
    providers.anthropic.mock_success("x").await;
    providers.openai.mock_success("x").await;
    let state = providers.state();

    let err = state
        .router
        .route_named("premium", &AnalysisRequest::new("hello"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RouteError::Configuration(ConfigurationError::UnknownTier(ref name)) if name == "premium"
    ));
    assert_eq!(providers.total_requests().await, 0);
}

#[tokio::test]
async fn test_routing_file_overrides_builtin_table() {
    let providers = Providers::start().await;
    providers.google.mock_status("gemini-2.5-flash", 429).await;
    providers.openai.mock_success("mini answer").await;

    let dir = tempfile::tempdir().unwrap();
    let routing_path = dir.path().join("routing.json");
    std::fs::write(
        &routing_path,
        r#"{
            "tiers": [
                {"tier": "free",
                 "primary": {"provider": "google", "model": "gemini-2.5-flash"},
                 "fallback_chain": [{"provider": "openai", "model": "gpt-4o-mini"}]},
                {"tier": "basic", "primary": {"provider": "google", "model": "gemini-2.5-pro"}},
                {"tier": "pro", "primary": {"provider": "anthropic", "model": "claude-sonnet-4"}},
                {"tier": "enterprise",
                 "primary": {"provider": "anthropic", "model": "claude-sonnet-4"},
                 "fallback_chain": [{"provider": "openai", "model": "gpt-4o"}]}
            ]
        }"#,
    )
    .unwrap();

    let mut config = test_config(&providers.urls(), dir.path());
    config.routing_config_path = Some(routing_path);
    let state = AppState::new(config).unwrap();

    let routed = state
        .router
        .route(Tier::Free, &AnalysisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(routed.target.model, "gpt-4o-mini");
    assert_eq!(routed.display_name, "GPT-4o Mini");
    assert_eq!(routed.failed_attempts[0].reason, FailureReason::RateLimited);
    let sent = providers.openai.request_bodies().await;
    assert_eq!(sent[0]["model"], "gpt-4o-mini");
}

#[tokio::test]
async fn test_startup_rejects_missing_provider_credentials() {
    let providers = Providers::start().await;
    let mut config = test_config(&providers.urls(), &std::env::temp_dir());
    config.openai_api_key = None;

    let err = AppState::new(config).err().expect("enterprise fallback needs openai");
    assert_eq!(
        err.downcast_ref::<ConfigurationError>(),
        Some(&ConfigurationError::ProviderNotRegistered(Provider::OpenAi))
    );
}

#[tokio::test]
async fn test_startup_rejects_fallback_duplicating_primary() {
    let dir = tempfile::tempdir().unwrap();
    let routing_path = dir.path().join("routing.json");
    std::fs::write(
        &routing_path,
        r#"{"tiers": [
            {"tier": "free", "primary": {"provider": "google", "model": "gemini-2.5-flash"},
             "fallback_chain": [{"provider": "google", "model": "gemini-2.5-flash"}]},
            {"tier": "basic", "primary": {"provider": "google", "model": "gemini-2.5-pro"}},
            {"tier": "pro", "primary": {"provider": "anthropic", "model": "claude-sonnet-4"}},
            {"tier": "enterprise", "primary": {"provider": "anthropic", "model": "claude-sonnet-4"}}
        ]}"#,
    )
    .unwrap();

    let providers = Providers::start().await;
    let mut config = test_config(&providers.urls(), dir.path());
    config.routing_config_path = Some(routing_path);

    let err = AppState::new(config).err().expect("invalid chain must be rejected");
    assert!(matches!(
        err.downcast_ref::<ConfigurationError>(),
        Some(ConfigurationError::PrimaryInFallback { tier: Tier::Free, .. })
    ));
}

#[tokio::test]
async fn test_state_with_scripted_registry() {
    let anthropic = Arc::new(
        ScriptedProvider::new(Provider::Anthropic)
            .fail("claude-sonnet-4", FailureReason::InvalidResponse)
            .reply("claude-sonnet-4", "second try"),
    );
    let registry = ProviderRegistry::new()
        .register(Arc::new(ScriptedProvider::new(Provider::Google)))
        .register(anthropic.clone())
        .register(Arc::new(
            ScriptedProvider::new(Provider::OpenAi).reply("gpt-4o", "fallback"),
        ));

    let providers = Providers::start().await;
    let state =
        AppState::with_registry(test_config(&providers.urls(), &std::env::temp_dir()), registry)
            .unwrap();

    // Each route starts again from the primary; there is no sticky failover
    let first = state
        .router
        .route(Tier::Enterprise, &AnalysisRequest::new("hello"))
        .await
        .unwrap();
    let second = state
        .router
        .route(Tier::Enterprise, &AnalysisRequest::new("hello"))
        .await
        .unwrap();

    assert_eq!(first.content, "fallback");
    assert_eq!(second.content, "second try");
    assert_eq!(anthropic.calls_for("claude-sonnet-4"), 2);
}
