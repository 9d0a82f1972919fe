//! Common test utilities for CallMate
//!
//! Shared fixtures for the integration tests: configuration pointing at the
//! mock provider servers, prompt template files and sample transcripts.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::time::Duration;

use callmate::{
    analysis::{CallTranscript, Utterance},
    config::LogFormat,
    prompts::TemplateId,
    Config,
};

use crate::mocks::{TEST_ANTHROPIC_API_KEY, TEST_GOOGLE_API_KEY, TEST_OPENAI_API_KEY};

/// Base URLs of the provider mocks
pub struct ProviderUrls {
    pub openai: String,
    pub anthropic: String,
    pub google: String,
}

/// Configuration with every provider pointed at a mock server
pub fn test_config(urls: &ProviderUrls, prompts_dir: &Path) -> Config {
    Config {
        openai_api_url: urls.openai.clone(),
        openai_api_key: Some(TEST_OPENAI_API_KEY.to_string()),
        anthropic_api_url: urls.anthropic.clone(),
        anthropic_api_key: Some(TEST_ANTHROPIC_API_KEY.to_string()),
        google_api_url: urls.google.clone(),
        google_api_key: Some(TEST_GOOGLE_API_KEY.to_string()),
        provider_timeout: Duration::from_secs(5),
        routing_config_path: None,
        prompts_dir: prompts_dir.to_path_buf(),
        log_format: LogFormat::Pretty,
    }
}

/// Templates tagged with a `STAGE <id>` marker so mocks can tell stages apart
pub fn stage_template(template: TemplateId) -> &'static str {
    match template {
        TemplateId::System => "당신은 통화 분석 전문가입니다. JSON으로만 답하세요.",
        TemplateId::QuickSummary => "STAGE quick_summary\n\n대화:\n{{conversation}}",
        TemplateId::SentimentAnalysis => {
            "STAGE sentiment_analysis\n\n고객({{customer_speaker}}): {{customer_text}}\n상담사({{agent_speaker}}): {{agent_text}}"
        }
        TemplateId::CustomerNeeds => {
            "STAGE customer_needs\n\n고객 발화:\n{{customer_text}}\n\n전체 대화:\n{{conversation}}"
        }
        TemplateId::CallFlow => {
            "STAGE call_flow\n\n고객={{ customer_speaker }}, 상담사={{ agent_speaker }}\n{{utterances}}"
        }
        TemplateId::RecommendedReplies => {
            "STAGE recommended_replies\n\n상태: {{customer_state}}\n니즈: {{primary_need}}\n고민: {{pain_points}}\n긴급도: {{urgency_level}}\n스크립트: {{script_context}}\n\n{{conversation}}"
        }
    }
}

/// Write every template under `dir` in the on-disk layout
pub fn write_templates(dir: &Path) {
    for template in TemplateId::ALL {
        write_template(dir, template, stage_template(template));
    }
}

pub fn write_template(dir: &Path, template: TemplateId, text: &str) -> PathBuf {
    let path = dir.join(template.path());
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(&path, text).unwrap();
    path
}

/// Short insurance inquiry; speaker B is the customer
pub fn sample_transcript() -> CallTranscript {
    CallTranscript {
        transcript_id: "tr_test_001".to_string(),
        utterances: vec![
            Utterance::new("A", "안녕하세요 고객님, 한빛보험 상담원 이수진입니다."),
            Utterance::new("B", "네, 자동차 보험 갱신 때문에 전화했는데요. 보험료가 얼마나 오르나요?"),
            Utterance::new("A", "조회해 보니 작년보다 약 5% 인상되었습니다."),
            Utterance::new("B", "왜 그렇게 많이 올랐죠? 할인 받을 방법은 없나요?"),
            Utterance::new("A", "블랙박스 특약에 가입하시면 3% 할인이 가능합니다."),
        ],
        context: None,
        script_context: None,
    }
}

/// Stage replies in the shape the pipeline expects
pub mod stage_replies {
    pub const SUMMARY: &str = r#"{"summary": "자동차 보험 갱신 보험료 인상 문의", "main_topics": ["보험료", "할인"], "outcome": "특약 안내"}"#;

    pub const SENTIMENT: &str = r#"{
        "customer_state": "고민 중",
        "customer": {"overall_sentiment": "부정", "sentiment_score": -0.3, "tone": "불만스러움", "engagement_level": "높음", "key_emotions": ["걱정"]},
        "agent": {"overall_sentiment": "긍정", "sentiment_score": 0.6, "tone": "차분함"}
    }"#;

    pub const NEEDS: &str = r#"{"primary_reason": "보험료 인상 확인", "specific_needs": ["할인 방법"], "pain_points": ["보험료 부담"], "urgency_level": "높음"}"#;

    pub const FLOW: &str = r#"{
        "conversation_turns": [
            {"turn_number": 1, "speaker": "A", "message": "인사 및 본인 소개"},
            {"turn_number": 2, "speaker": "B", "message": "보험료 문의", "customer_reaction": "걱정", "key_point": null}
        ],
        "customer_journey": ["문의", "불만", "관심"],
        "critical_moments": ["할인 특약 안내"]
    }"#;

    pub const REPLIES: &str = r#"{"next_action": "블랙박스 특약 가입 안내 문자 발송", "recommended_replies": ["특약 가입 시 연간 약 2만원을 절약하실 수 있습니다."]}"#;
}
