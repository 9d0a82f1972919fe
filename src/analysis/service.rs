//! Multi-stage call analysis
//!
//! Four independent stages (summary, sentiment, needs, call flow) run
//! concurrently through the tier router; the reply suggestions stage runs
//! last because it builds on the sentiment and needs results.

use std::sync::Arc;

use anyhow::anyhow;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, info, instrument};

use crate::{
    error::{AppError, AppResult, ConfigurationError},
    output::OutputSchema,
    prompts::{
        render_template,
        scripts::{industry_context, DEFAULT_INDUSTRY},
        CallFlowVars, CustomerNeedsVars, PromptCache, QuickSummaryVars,
        RecommendedRepliesVars, SentimentVars, TemplateError, TemplateId, TemplateVars,
    },
    providers::{AnalysisRequest, RequestContext},
    tiers::{router::ModelRouter, types::Tier},
};

use super::{
    models::{
        CallAnalysis, CallFlowAnalysis, CallTranscript, ConversationSummary, CustomerNeed,
        FlowOutput, ModelUsage, NeedsOutput, RepliesOutput, SentimentOutput, SummaryOutput,
        DEFAULT_SCRIPT_CONTEXT, NO_PAIN_POINTS,
    },
    speakers::{speaker_text, SpeakerRoles},
};

/// Output shape each stage's model response must have
struct StageSchemas {
    summary: OutputSchema,
    sentiment: OutputSchema,
    needs: OutputSchema,
    flow: OutputSchema,
    replies: OutputSchema,
}

impl StageSchemas {
    fn build() -> Result<Self, ConfigurationError> {
        let strings = json!({"type": "array", "items": {"type": "string"}});
        let nullable_string = json!({"type": ["string", "null"]});
        let speaker = json!({
            "type": "object",
            "properties": {
                "overall_sentiment": {"type": "string"},
                "sentiment_score": {"type": "number"},
                "tone": {"type": "string"},
                "engagement_level": {"type": "string"},
                "key_emotions": strings,
            }
        });

        Ok(Self {
            summary: OutputSchema::new(json!({
                "type": "object",
                "required": ["summary"],
                "properties": {
                    "summary": {"type": "string"},
                    "main_topics": strings,
                    "key_questions": strings,
                    "key_answers": strings,
                    "outcome": {"type": "string"},
                }
            }))?,
            sentiment: OutputSchema::new(json!({
                "type": "object",
                "required": ["customer"],
                "properties": {
                    "customer_state": {"type": "string"},
                    "customer": speaker,
                    "agent": speaker,
                }
            }))?,
            needs: OutputSchema::new(json!({
                "type": "object",
                "required": ["primary_reason"],
                "properties": {
                    "primary_reason": {"type": "string"},
                    "specific_needs": strings,
                    "pain_points": strings,
                    "urgency_level": {"type": "string"},
                }
            }))?,
            flow: OutputSchema::new(json!({
                "type": "object",
                "required": ["conversation_turns"],
                "properties": {
                    "conversation_turns": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "turn_number": {"type": "integer", "minimum": 0},
                                "speaker": {"type": "string"},
                                "message": {"type": "string"},
                                "customer_reaction": nullable_string,
                                "key_point": nullable_string,
                            }
                        }
                    },
                    "customer_journey": strings,
                    "critical_moments": strings,
                }
            }))?,
            replies: OutputSchema::new(json!({
                "type": "object",
                "required": ["recommended_replies"],
                "properties": {
                    "next_action": {"type": "string"},
                    "recommended_replies": strings,
                }
            }))?,
        })
    }
}

/// One finished stage
struct StageResult<T> {
    output: T,
    usage: ModelUsage,
    cost_usd: f64,
}

/// Call analysis pipeline
pub struct CallAnalyzer {
    router: Arc<ModelRouter>,
    prompts: Arc<PromptCache>,
    schemas: StageSchemas,
}

impl CallAnalyzer {
    pub fn new(
        router: Arc<ModelRouter>,
        prompts: Arc<PromptCache>,
    ) -> Result<Self, ConfigurationError> {
        Ok(Self {
            router,
            prompts,
            schemas: StageSchemas::build()?,
        })
    }

    /// Analyze a transcript using the models configured for `tier`
    #[instrument(skip(self, transcript), fields(transcript_id = %transcript.transcript_id))]
    pub async fn analyze(&self, tier: Tier, transcript: &CallTranscript) -> AppResult<CallAnalysis> {
        let utterances = &transcript.utterances;
        if utterances.is_empty() {
            return Err(AppError::InvalidInput(
                "Transcript has no utterances".to_string(),
            ));
        }

        let roles = SpeakerRoles::detect(utterances);
        debug!(customer = %roles.customer, agent = %roles.agent, "Speaker roles detected");

        let conversation = roles.conversation(utterances);
        let customer_text = speaker_text(utterances, &roles.customer);
        let agent_text = speaker_text(utterances, &roles.agent);

        let system = self.system_prompt().await?;
        let script_context = self.script_context(transcript).await?;
        let ctx = StageContext {
            tier,
            system: system.as_deref(),
            request_context: transcript.context.as_ref(),
        };

        let summary_vars = QuickSummaryVars {
            conversation: conversation.clone(),
        };
        let sentiment_vars = SentimentVars {
            customer_text: customer_text.clone(),
            agent_text,
            customer_speaker: roles.customer.clone(),
            agent_speaker: roles.agent.clone(),
        };
        let needs_vars = CustomerNeedsVars {
            customer_text,
            conversation: conversation.clone(),
        };
        let flow_vars = CallFlowVars {
            utterances: roles.utterance_lines(utterances),
            customer_speaker: roles.customer.clone(),
            agent_speaker: roles.agent.clone(),
        };

        let (summary, mut sentiment, mut needs, flow) = tokio::try_join!(
            self.run_stage::<_, SummaryOutput>(&ctx, &summary_vars, &self.schemas.summary),
            self.run_stage::<_, SentimentOutput>(&ctx, &sentiment_vars, &self.schemas.sentiment),
            self.run_stage::<_, NeedsOutput>(&ctx, &needs_vars, &self.schemas.needs),
            self.run_stage::<_, FlowOutput>(&ctx, &flow_vars, &self.schemas.flow),
        )?;
        sentiment.output.fill_blanks();
        needs.output.fill_blanks();

        let pain_points = if needs.output.pain_points.is_empty() {
            vec![NO_PAIN_POINTS.to_string()]
        } else {
            needs.output.pain_points.clone()
        };
        let replies_vars = RecommendedRepliesVars {
            conversation,
            customer_state: sentiment.output.customer_state.clone(),
            primary_need: needs.output.primary_reason.clone(),
            pain_points,
            urgency_level: needs.output.urgency_level.clone(),
            script_context,
        };
        let mut replies = self
            .run_stage::<_, RepliesOutput>(&ctx, &replies_vars, &self.schemas.replies)
            .await?;
        replies.output.fill_blanks();

        let total_estimated_cost_usd = summary.cost_usd
            + sentiment.cost_usd
            + needs.cost_usd
            + flow.cost_usd
            + replies.cost_usd;
        let models_used = vec![
            summary.usage,
            sentiment.usage,
            needs.usage,
            flow.usage,
            replies.usage,
        ];

        let SentimentOutput {
            customer_state,
            customer,
            agent,
        } = sentiment.output;
        let mut speaker_sentiments = Vec::new();
        if let Some(c) = customer {
            speaker_sentiments.push(c.into_sentiment(&roles.customer));
        }
        if let Some(a) = agent {
            speaker_sentiments.push(a.into_sentiment(&roles.agent));
        }

        info!(
            tier = %tier,
            total_cost_usd = total_estimated_cost_usd,
            fallbacks = models_used.iter().filter(|m| m.was_fallback).count(),
            "Call analysis complete"
        );

        Ok(CallAnalysis {
            transcript_id: transcript.transcript_id.clone(),
            tier,
            speaker_sentiments,
            customer_state,
            conversation_summary: ConversationSummary {
                overview: summary.output.summary,
                main_topics: summary.output.main_topics,
                key_questions: summary.output.key_questions,
                key_answers: summary.output.key_answers,
                outcome: summary.output.outcome,
            },
            customer_need: CustomerNeed {
                primary_reason: needs.output.primary_reason,
                specific_needs: needs.output.specific_needs,
                pain_points: needs.output.pain_points,
                urgency_level: needs.output.urgency_level,
            },
            call_flow: CallFlowAnalysis {
                conversation_turns: flow.output.conversation_turns,
                customer_journey: flow.output.customer_journey,
                critical_moments: flow.output.critical_moments,
            },
            next_action: replies.output.next_action,
            recommended_replies: replies.output.recommended_replies,
            models_used,
            total_estimated_cost_usd,
            analysis_timestamp: chrono::Utc::now().to_rfc3339(),
        })
    }

    /// Shared system prompt; optional, so a missing template is not an error
    async fn system_prompt(&self) -> AppResult<Option<String>> {
        match self.prompts.get(TemplateId::System).await {
            Ok(text) => Ok(Some(render_template(TemplateId::System, &text, &[])?)),
            Err(TemplateError::NotFound { .. }) => {
                debug!("No system prompt template, sending stage prompts alone");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Caller's script if given, else the industry script, else a fixed note
    async fn script_context(&self, transcript: &CallTranscript) -> AppResult<String> {
        if let Some(script) = transcript
            .script_context
            .as_deref()
            .filter(|s| !s.trim().is_empty())
        {
            return Ok(script.to_string());
        }

        let industry = transcript
            .context
            .as_ref()
            .and_then(|c| c.industry.as_deref())
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .unwrap_or(DEFAULT_INDUSTRY);
        Ok(match self.prompts.industry_script(industry).await? {
            Some(script) => industry_context(industry, &script),
            None => {
                debug!(industry, "No industry script available");
                DEFAULT_SCRIPT_CONTEXT.to_string()
            }
        })
    }

    async fn run_stage<V, T>(
        &self,
        ctx: &StageContext<'_>,
        vars: &V,
        schema: &OutputSchema,
    ) -> AppResult<StageResult<T>>
    where
        V: TemplateVars,
        T: DeserializeOwned,
    {
        let task = V::TEMPLATE;
        let prompt = self.prompts.render(vars).await?;

        let mut request = AnalysisRequest::new(prompt).with_output_schema(schema.clone());
        if let Some(system) = ctx.system {
            request = request.with_system_prompt(system);
        }
        if let Some(context) = ctx.request_context {
            request = request.with_context(context.clone());
        }

        let routed = self.router.route(ctx.tier, &request).await?;
        debug!(
            task = %task,
            model = %routed.target,
            was_fallback = routed.was_fallback,
            "Stage complete"
        );

        let parsed: Value = routed
            .parsed
            .ok_or_else(|| AppError::Internal(anyhow!("{} returned no parsed output", task)))?;
        let output = serde_json::from_value(parsed).map_err(|e| {
            AppError::Internal(anyhow::Error::new(e).context(format!("Decoding {} output", task)))
        })?;

        Ok(StageResult {
            output,
            usage: ModelUsage {
                task: task.as_str().to_string(),
                provider: routed.target.provider,
                model: routed.target.model,
                display_name: routed.display_name,
                was_fallback: routed.was_fallback,
            },
            cost_usd: routed.estimated_cost_usd,
        })
    }
}

/// Per-call settings shared by every stage
struct StageContext<'a> {
    tier: Tier,
    system: Option<&'a str>,
    request_context: Option<&'a RequestContext>,
}
