//! Typed prompt templates
//!
//! Every template declares the fields it accepts. Values are checked against
//! that declaration, and the template text is checked for placeholders the
//! declaration does not know about, before anything is substituted.

use std::collections::HashMap;
use std::fmt;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use serde::Serialize;

use super::TemplateError;

/// `{{ name }}` placeholders, inner whitespace allowed
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([a-zA-Z0-9_]+)\s*\}\}").expect("placeholder pattern is valid")
});

/// Known prompt templates
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TemplateId {
    System,
    QuickSummary,
    SentimentAnalysis,
    CustomerNeeds,
    CallFlow,
    RecommendedReplies,
}

impl TemplateId {
    pub const ALL: [TemplateId; 6] = [
        TemplateId::System,
        TemplateId::QuickSummary,
        TemplateId::SentimentAnalysis,
        TemplateId::CustomerNeeds,
        TemplateId::CallFlow,
        TemplateId::RecommendedReplies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TemplateId::System => "system",
            TemplateId::QuickSummary => "quick_summary",
            TemplateId::SentimentAnalysis => "sentiment_analysis",
            TemplateId::CustomerNeeds => "customer_needs",
            TemplateId::CallFlow => "call_flow",
            TemplateId::RecommendedReplies => "recommended_replies",
        }
    }

    /// Path relative to the prompts directory
    pub fn path(&self) -> &'static str {
        match self {
            TemplateId::System => "common/system.md",
            TemplateId::QuickSummary => "call_analysis/quick_summary.md",
            TemplateId::SentimentAnalysis => "call_analysis/sentiment_analysis.md",
            TemplateId::CustomerNeeds => "call_analysis/customer_needs.md",
            TemplateId::CallFlow => "call_analysis/call_flow.md",
            TemplateId::RecommendedReplies => "call_analysis/recommended_replies.md",
        }
    }

    /// Declared fields for this template
    pub fn fields(&self) -> &'static [FieldSpec] {
        match self {
            TemplateId::System => &[],
            TemplateId::QuickSummary => QUICK_SUMMARY_FIELDS,
            TemplateId::SentimentAnalysis => SENTIMENT_FIELDS,
            TemplateId::CustomerNeeds => CUSTOMER_NEEDS_FIELDS,
            TemplateId::CallFlow => CALL_FLOW_FIELDS,
            TemplateId::RecommendedReplies => RECOMMENDED_REPLIES_FIELDS,
        }
    }

    fn field(&self, name: &str) -> Option<&'static FieldSpec> {
        self.fields().iter().find(|f| f.name == name)
    }
}

impl fmt::Display for TemplateId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    List,
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldKind::Text => f.write_str("text"),
            FieldKind::List => f.write_str("list"),
        }
    }
}

/// One declared template field
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    /// Required text fields must be non-blank
    pub required: bool,
}

impl FieldSpec {
    const fn text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: true,
        }
    }

    const fn optional_text(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::Text,
            required: false,
        }
    }

    const fn list(name: &'static str) -> Self {
        Self {
            name,
            kind: FieldKind::List,
            required: false,
        }
    }
}

const QUICK_SUMMARY_FIELDS: &[FieldSpec] = &[FieldSpec::text("conversation")];

const SENTIMENT_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("customer_text"),
    FieldSpec::optional_text("agent_text"),
    FieldSpec::text("customer_speaker"),
    FieldSpec::text("agent_speaker"),
];

const CUSTOMER_NEEDS_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("customer_text"),
    FieldSpec::text("conversation"),
];

const CALL_FLOW_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("utterances"),
    FieldSpec::text("customer_speaker"),
    FieldSpec::text("agent_speaker"),
];

const RECOMMENDED_REPLIES_FIELDS: &[FieldSpec] = &[
    FieldSpec::text("conversation"),
    FieldSpec::text("customer_state"),
    FieldSpec::text("primary_need"),
    FieldSpec::list("pain_points"),
    FieldSpec::text("urgency_level"),
    FieldSpec::text("script_context"),
];

/// A value supplied for a template field
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

impl FieldValue {
    pub fn kind(&self) -> FieldKind {
        match self {
            FieldValue::Text(_) => FieldKind::Text,
            FieldValue::List(_) => FieldKind::List,
        }
    }

    fn is_blank(&self) -> bool {
        match self {
            FieldValue::Text(s) => s.trim().is_empty(),
            FieldValue::List(items) => items.is_empty(),
        }
    }

    fn rendered(&self) -> String {
        match self {
            FieldValue::Text(s) => s.clone(),
            FieldValue::List(items) => items.join(", "),
        }
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        FieldValue::Text(s)
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        FieldValue::Text(s.to_string())
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        FieldValue::List(items)
    }
}

/// Variables for one template, as a typed struct
pub trait TemplateVars {
    const TEMPLATE: TemplateId;

    fn values(&self) -> Vec<(&'static str, FieldValue)>;
}

#[derive(Debug, Clone)]
pub struct QuickSummaryVars {
    pub conversation: String,
}

impl TemplateVars for QuickSummaryVars {
    const TEMPLATE: TemplateId = TemplateId::QuickSummary;

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![("conversation", self.conversation.as_str().into())]
    }
}

#[derive(Debug, Clone)]
pub struct SentimentVars {
    pub customer_text: String,
    pub agent_text: String,
    pub customer_speaker: String,
    pub agent_speaker: String,
}

impl TemplateVars for SentimentVars {
    const TEMPLATE: TemplateId = TemplateId::SentimentAnalysis;

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("customer_text", self.customer_text.as_str().into()),
            ("agent_text", self.agent_text.as_str().into()),
            ("customer_speaker", self.customer_speaker.as_str().into()),
            ("agent_speaker", self.agent_speaker.as_str().into()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CustomerNeedsVars {
    pub customer_text: String,
    pub conversation: String,
}

impl TemplateVars for CustomerNeedsVars {
    const TEMPLATE: TemplateId = TemplateId::CustomerNeeds;

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("customer_text", self.customer_text.as_str().into()),
            ("conversation", self.conversation.as_str().into()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct CallFlowVars {
    pub utterances: String,
    pub customer_speaker: String,
    pub agent_speaker: String,
}

impl TemplateVars for CallFlowVars {
    const TEMPLATE: TemplateId = TemplateId::CallFlow;

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("utterances", self.utterances.as_str().into()),
            ("customer_speaker", self.customer_speaker.as_str().into()),
            ("agent_speaker", self.agent_speaker.as_str().into()),
        ]
    }
}

#[derive(Debug, Clone)]
pub struct RecommendedRepliesVars {
    pub conversation: String,
    pub customer_state: String,
    pub primary_need: String,
    pub pain_points: Vec<String>,
    pub urgency_level: String,
    pub script_context: String,
}

impl TemplateVars for RecommendedRepliesVars {
    const TEMPLATE: TemplateId = TemplateId::RecommendedReplies;

    fn values(&self) -> Vec<(&'static str, FieldValue)> {
        vec![
            ("conversation", self.conversation.as_str().into()),
            ("customer_state", self.customer_state.as_str().into()),
            ("primary_need", self.primary_need.as_str().into()),
            ("pain_points", self.pain_points.clone().into()),
            ("urgency_level", self.urgency_level.as_str().into()),
            ("script_context", self.script_context.as_str().into()),
        ]
    }
}

/// Validate `values` against the template's declared fields and substitute
/// them into `text`.
pub fn render_template(
    template: TemplateId,
    text: &str,
    values: &[(&'static str, FieldValue)],
) -> Result<String, TemplateError> {
    let mut supplied: HashMap<&str, &FieldValue> = HashMap::with_capacity(values.len());

    for (name, value) in values {
        let spec = template
            .field(name)
            .ok_or_else(|| TemplateError::UndeclaredVariable {
                template,
                field: name.to_string(),
            })?;
        if spec.kind != value.kind() {
            return Err(TemplateError::TypeMismatch {
                template,
                field: spec.name,
                expected: spec.kind,
            });
        }
        supplied.insert(spec.name, value);
    }

    for spec in template.fields() {
        let missing = match supplied.get(spec.name) {
            None => true,
            Some(value) => spec.required && value.is_blank(),
        };
        if missing {
            return Err(TemplateError::MissingVariable {
                template,
                field: spec.name,
            });
        }
    }

    if let Some(unknown) = PLACEHOLDER
        .captures_iter(text)
        .map(|c| c[1].to_string())
        .find(|name| template.field(name).is_none())
    {
        return Err(TemplateError::UnknownPlaceholder {
            template,
            placeholder: unknown,
        });
    }

    let rendered = PLACEHOLDER.replace_all(text, |caps: &Captures| {
        supplied
            .get(&caps[1])
            .map(|v| v.rendered())
            .unwrap_or_default()
    });

    Ok(rendered.into_owned())
}
