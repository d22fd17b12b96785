//! Per-turn AI response value object.

use serde::{Deserialize, Serialize};

use crate::domain::analysis::{AnalysisTask, Emotion, Entity, Intent, Sentiment};

/// Sentinel `fallback_level` marking the provider-independent template
/// response used when the whole generation chain was exhausted.
pub const FALLBACK_LEVEL_TEMPLATE: u8 = u8::MAX;

/// A knowledge source consulted while answering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    /// Human-readable title.
    pub title: String,
    /// Citation or link into the knowledge base.
    pub citation: String,
    /// Retrieval relevance in `[0.0, 1.0]`.
    pub relevance: f64,
}

impl KnowledgeSource {
    /// Creates a knowledge source.
    pub fn new(title: impl Into<String>, citation: impl Into<String>, relevance: f64) -> Self {
        Self {
            title: title.into(),
            citation: citation.into(),
            relevance: relevance.clamp(0.0, 1.0),
        }
    }
}

/// Follow-up action suggested alongside the response.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum FollowUpAction {
    /// Ask the user for a specific missing detail; puts the conversation in
    /// the waiting sub-state.
    RequestInformation { prompt: String },
    /// Offer the user a knowledge article.
    ShareArticle { citation: String },
    /// Ask the user to confirm the issue is resolved.
    ConfirmResolution,
}

/// Escalation recommendation computed by the orchestrator.
///
/// Advisory only - the rules engine makes the final escalation decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EscalationRecommendation {
    pub recommended: bool,
    pub reason: Option<String>,
}

impl EscalationRecommendation {
    /// No escalation recommended.
    pub fn none() -> Self {
        Self::default()
    }

    /// Escalation recommended for the given reason.
    pub fn because(reason: impl Into<String>) -> Self {
        Self {
            recommended: true,
            reason: Some(reason.into()),
        }
    }
}

/// Token usage for one generated response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct TokenUsage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
}

impl TokenUsage {
    /// Creates token usage.
    pub fn new(prompt_tokens: u32, completion_tokens: u32) -> Self {
        Self {
            prompt_tokens,
            completion_tokens,
        }
    }

    /// Total tokens (prompt + completion).
    pub fn total(&self) -> u32 {
        self.prompt_tokens + self.completion_tokens
    }
}

/// Result of one orchestrated turn.
///
/// Never mutated after construction; consumed once by the rules engine and
/// then persisted with the agent message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AiResponse {
    /// Generated (or template) response text.
    pub text: String,
    /// Overall confidence: the minimum of intent and generation confidence,
    /// so one weak signal cannot be masked by a strong one.
    pub confidence: f64,
    /// Primary intent with secondary candidates.
    pub intent: Intent,
    /// Entities extracted this turn.
    pub entities: Vec<Entity>,
    /// Sentiment of the inbound message.
    pub sentiment: Sentiment,
    /// Detected emotion with intensity.
    pub emotion: Emotion,
    /// Knowledge sources consulted.
    pub knowledge_sources: Vec<KnowledgeSource>,
    /// Suggested follow-up actions.
    pub follow_ups: Vec<FollowUpAction>,
    /// Escalation recommendation with reason.
    pub escalation: EscalationRecommendation,
    /// Provider that answered, or "template" for the degraded path.
    pub model_used: String,
    /// Fallback chain depth that answered (0 = first choice);
    /// [`FALLBACK_LEVEL_TEMPLATE`] marks the template degradation path.
    pub fallback_level: u8,
    /// End-to-end turn latency.
    pub processing_ms: u64,
    /// Token usage of the winning generation attempt.
    pub tokens: TokenUsage,
    /// Analysis tasks that failed or timed out this turn.
    pub degraded_analysis: Vec<AnalysisTask>,
}

impl AiResponse {
    /// Returns true if the response came from the template degradation path.
    pub fn is_template_fallback(&self) -> bool {
        self.fallback_level == FALLBACK_LEVEL_TEMPLATE
    }

    /// Returns true if any analysis signal was degraded this turn.
    pub fn is_partial_analysis(&self) -> bool {
        !self.degraded_analysis.is_empty()
    }

    /// Snapshot of response fields for the rule evaluation context.
    pub fn rule_context(&self) -> serde_json::Value {
        serde_json::json!({
            "text_len": self.text.len(),
            "confidence": self.confidence,
            "intent": self.intent.label,
            "intent_confidence": self.intent.confidence,
            "sentiment": self.sentiment.score(),
            "emotion": self.emotion.label,
            "emotion_intensity": self.emotion.intensity,
            "escalation_recommended": self.escalation.recommended,
            "template_fallback": self.is_template_fallback(),
            "fallback_level": self.fallback_level,
            "degraded_analysis": self.is_partial_analysis(),
        })
    }
}
