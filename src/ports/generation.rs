//! Generation Port - Interface for response-generating AI providers.
//!
//! Providers are interchangeable behind this port; the orchestrator's
//! fallback chain walks an ordered list of them and judges each attempt by
//! the same validation rules.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::ai::{KnowledgeSource, TokenUsage};
use crate::domain::analysis::{Emotion, Intent};

/// Port for AI response generation.
#[async_trait]
pub trait GenerationProvider: Send + Sync {
    /// Generates a response for one turn.
    async fn generate(&self, request: &GenerationRequest)
        -> Result<GeneratedText, GenerationError>;

    /// Static information about this provider.
    fn provider_info(&self) -> ProviderInfo;
}

/// What a provider needs to answer one turn.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    /// The inbound user message.
    pub message: String,
    /// Active topic, if the conversation has one.
    pub topic: Option<String>,
    /// Classified intent steering the answer.
    pub intent: Intent,
    /// Detected emotion steering the tone.
    pub emotion: Emotion,
    /// Knowledge snippets retrieved for this turn.
    pub knowledge: Vec<KnowledgeSource>,
    /// Generation tuning.
    pub options: GenerationOptions,
}

/// Tuning knobs for one generation call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenerationOptions {
    /// Sampling temperature; lower is more conservative.
    pub temperature: f32,
    /// Hard cap on generated tokens.
    pub max_tokens: u32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            max_tokens: 512,
        }
    }
}

/// One provider's answer.
#[derive(Debug, Clone)]
pub struct GeneratedText {
    /// The generated response text.
    pub text: String,
    /// Provider self-reported confidence in `[0.0, 1.0]`.
    pub confidence: f64,
    /// Model identifier that produced the text.
    pub model: String,
    /// Token usage for the call.
    pub tokens: TokenUsage,
}

/// Provider identity and capabilities.
#[derive(Debug, Clone)]
pub struct ProviderInfo {
    /// Provider name (e.g. "primary", "budget").
    pub name: String,
    /// Model identifier.
    pub model: String,
    /// Whether the provider is tuned for de-escalating upset users.
    pub deescalation_tuned: bool,
}

impl ProviderInfo {
    /// Creates provider info.
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            deescalation_tuned: false,
        }
    }

    /// Marks the provider as de-escalation tuned.
    pub fn with_deescalation(mut self) -> Self {
        self.deescalation_tuned = true;
        self
    }
}

/// Generation provider errors.
#[derive(Debug, Error)]
pub enum GenerationError {
    /// Provider rejected the call or is down.
    #[error("provider unavailable: {0}")]
    Unavailable(String),

    /// Rate limited by the provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider refused to answer on safety grounds.
    #[error("content filtered: {reason}")]
    ContentFiltered { reason: String },

    /// The call exceeded its per-attempt deadline.
    #[error("generation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Provider answered, but the text failed output validation.
    #[error("invalid output: {0}")]
    InvalidOutput(String),
}

impl GenerationError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates an invalid-output error.
    pub fn invalid_output(message: impl Into<String>) -> Self {
        Self::InvalidOutput(message.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_are_moderate() {
        let options = GenerationOptions::default();
        assert!(options.temperature > 0.0 && options.temperature < 1.0);
        assert!(options.max_tokens > 0);
    }

    #[test]
    fn provider_info_builder_sets_deescalation() {
        let info = ProviderInfo::new("empathy", "empathy-1").with_deescalation();
        assert!(info.deescalation_tuned);
        assert!(!ProviderInfo::new("a", "b").deescalation_tuned);
    }
}
