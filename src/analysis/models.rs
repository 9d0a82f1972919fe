//! Call analysis data models
//!
//! Input transcripts, the per-stage model outputs (lenient, with defaults
//! for anything the model leaves out) and the assembled result.

use serde::{Deserialize, Serialize};

use crate::providers::RequestContext;
use crate::tiers::types::{Provider, Tier};

/// Default customer state when the sentiment stage omits it
pub const DEFAULT_CUSTOMER_STATE: &str = "고민 중";
pub const DEFAULT_PRIMARY_REASON: &str = "문의";
pub const DEFAULT_URGENCY: &str = "보통";
/// Substituted for an empty pain point list
pub const NO_PAIN_POINTS: &str = "없음";
pub const DEFAULT_SCRIPT_CONTEXT: &str = "업종별 기본 스크립트 사용";
pub const DEFAULT_NEXT_ACTION: &str = "후속 연락 필요";

/// Role labels used in the conversation views
pub const CUSTOMER_LABEL: &str = "고객";
pub const AGENT_LABEL: &str = "상담사";

/// One diarized utterance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub speaker: String,
    pub text: String,
}

impl Utterance {
    pub fn new(speaker: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            speaker: speaker.into(),
            text: text.into(),
        }
    }
}

/// Transcript to analyze
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallTranscript {
    pub transcript_id: String,
    pub utterances: Vec<Utterance>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<RequestContext>,
    /// Company or industry script text for reply suggestions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub script_context: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Sentiment {
    Positive,
    Negative,
    #[default]
    Neutral,
}

impl Sentiment {
    /// Map a model label (긍정/부정/중립); anything else is neutral
    pub fn from_label(label: &str) -> Self {
        match label.trim() {
            "긍정" => Sentiment::Positive,
            "부정" => Sentiment::Negative,
            _ => Sentiment::Neutral,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SpeakerSentiment {
    pub speaker: String,
    pub overall_sentiment: Sentiment,
    /// -1.0 (negative) to 1.0 (positive)
    pub sentiment_score: f64,
    pub tone_analysis: String,
    pub engagement_level: String,
    pub key_emotions: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConversationSummary {
    pub overview: String,
    pub main_topics: Vec<String>,
    pub key_questions: Vec<String>,
    pub key_answers: Vec<String>,
    pub outcome: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CustomerNeed {
    pub primary_reason: String,
    pub specific_needs: Vec<String>,
    pub pain_points: Vec<String>,
    pub urgency_level: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConversationTurn {
    pub turn_number: u32,
    pub speaker: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_reaction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key_point: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CallFlowAnalysis {
    pub conversation_turns: Vec<ConversationTurn>,
    pub customer_journey: Vec<String>,
    pub critical_moments: Vec<String>,
}

/// Which model served one pipeline stage
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ModelUsage {
    pub task: String,
    pub provider: Provider,
    pub model: String,
    pub display_name: String,
    pub was_fallback: bool,
}

/// Full analysis of one call
#[derive(Debug, Clone, Serialize)]
pub struct CallAnalysis {
    pub transcript_id: String,
    pub tier: Tier,
    pub speaker_sentiments: Vec<SpeakerSentiment>,
    pub customer_state: String,
    pub conversation_summary: ConversationSummary,
    pub customer_need: CustomerNeed,
    pub call_flow: CallFlowAnalysis,
    pub next_action: String,
    pub recommended_replies: Vec<String>,
    pub models_used: Vec<ModelUsage>,
    pub total_estimated_cost_usd: f64,
    /// RFC 3339, UTC
    pub analysis_timestamp: String,
}

// Stage outputs as returned by the models

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct SummaryOutput {
    pub summary: String,
    pub main_topics: Vec<String>,
    pub key_questions: Vec<String>,
    pub key_answers: Vec<String>,
    pub outcome: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct SpeakerSentimentOutput {
    pub overall_sentiment: String,
    pub sentiment_score: f64,
    pub tone: String,
    pub engagement_level: String,
    pub key_emotions: Vec<String>,
}

impl Default for SpeakerSentimentOutput {
    fn default() -> Self {
        Self {
            overall_sentiment: "중립".to_string(),
            sentiment_score: 0.5,
            tone: String::new(),
            engagement_level: "보통".to_string(),
            key_emotions: Vec::new(),
        }
    }
}

impl SpeakerSentimentOutput {
    pub fn into_sentiment(self, speaker: &str) -> SpeakerSentiment {
        SpeakerSentiment {
            speaker: speaker.to_string(),
            overall_sentiment: Sentiment::from_label(&self.overall_sentiment),
            sentiment_score: self.sentiment_score.clamp(-1.0, 1.0),
            tone_analysis: self.tone,
            engagement_level: self.engagement_level,
            key_emotions: self.key_emotions,
        }
    }
}

/// Replace a blank model value with its default
fn fill_blank(value: &mut String, default: &str) {
    if value.trim().is_empty() {
        *value = default.to_string();
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct SentimentOutput {
    pub customer_state: String,
    pub customer: Option<SpeakerSentimentOutput>,
    pub agent: Option<SpeakerSentimentOutput>,
}

impl Default for SentimentOutput {
    fn default() -> Self {
        Self {
            customer_state: DEFAULT_CUSTOMER_STATE.to_string(),
            customer: None,
            agent: None,
        }
    }
}

impl SentimentOutput {
    /// Serde defaults cover missing keys; this covers `""`
    pub fn fill_blanks(&mut self) {
        fill_blank(&mut self.customer_state, DEFAULT_CUSTOMER_STATE);
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct NeedsOutput {
    pub primary_reason: String,
    pub specific_needs: Vec<String>,
    pub pain_points: Vec<String>,
    pub urgency_level: String,
}

impl Default for NeedsOutput {
    fn default() -> Self {
        Self {
            primary_reason: DEFAULT_PRIMARY_REASON.to_string(),
            specific_needs: Vec::new(),
            pain_points: Vec::new(),
            urgency_level: DEFAULT_URGENCY.to_string(),
        }
    }
}

impl NeedsOutput {
    pub fn fill_blanks(&mut self) {
        fill_blank(&mut self.primary_reason, DEFAULT_PRIMARY_REASON);
        fill_blank(&mut self.urgency_level, DEFAULT_URGENCY);
        self.pain_points.retain(|p| !p.trim().is_empty());
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub(crate) struct FlowOutput {
    pub conversation_turns: Vec<ConversationTurn>,
    pub customer_journey: Vec<String>,
    pub critical_moments: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub(crate) struct RepliesOutput {
    pub next_action: String,
    pub recommended_replies: Vec<String>,
}

impl Default for RepliesOutput {
    fn default() -> Self {
        Self {
            next_action: DEFAULT_NEXT_ACTION.to_string(),
            recommended_replies: Vec::new(),
        }
    }
}

impl RepliesOutput {
    pub fn fill_blanks(&mut self) {
        fill_blank(&mut self.next_action, DEFAULT_NEXT_ACTION);
    }
}
