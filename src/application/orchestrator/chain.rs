//! Ordered generation fallback chain.
//!
//! Walks the routed provider list one attempt per provider: a failure,
//! timeout, or rejected output moves straight to the next provider, never a
//! retry in place. When the chain is exhausted (or the turn deadline has
//! passed) the turn degrades to a provider-independent template response.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{timeout, Instant};
use tracing::warn;

use crate::domain::ai::{TokenUsage, FALLBACK_LEVEL_TEMPLATE};
use crate::ports::{GenerationProvider, GenerationRequest};

/// Name recorded as the model/provider for template responses.
pub const TEMPLATE_MODEL: &str = "template";

/// What the chain produced for one turn.
#[derive(Debug, Clone)]
pub struct ChainOutcome {
    pub text: String,
    /// Generation confidence; 0.0 on the template path.
    pub confidence: f64,
    pub provider: String,
    pub model: String,
    pub tokens: TokenUsage,
    /// Chain position that answered, or [`FALLBACK_LEVEL_TEMPLATE`].
    pub fallback_level: u8,
}

impl ChainOutcome {
    fn template(text: String) -> Self {
        Self {
            text,
            confidence: 0.0,
            provider: TEMPLATE_MODEL.to_string(),
            model: TEMPLATE_MODEL.to_string(),
            tokens: TokenUsage::default(),
            fallback_level: FALLBACK_LEVEL_TEMPLATE,
        }
    }
}

/// Walks routed providers with per-attempt deadlines and output validation.
pub struct FallbackChain {
    attempt_timeout: Duration,
    max_response_chars: usize,
}

impl FallbackChain {
    /// Creates a chain with the given per-attempt deadline and response
    /// length bound.
    pub fn new(attempt_timeout: Duration, max_response_chars: usize) -> Self {
        Self {
            attempt_timeout,
            max_response_chars,
        }
    }

    /// Generates a response, degrading to a template when every provider in
    /// the routed order fails or `deadline` passes.
    pub async fn generate(
        &self,
        providers: &[Arc<dyn GenerationProvider>],
        request: &GenerationRequest,
        deadline: Instant,
    ) -> ChainOutcome {
        for (level, provider) in providers.iter().enumerate() {
            let name = provider.provider_info().name;
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!(provider = %name, "turn deadline reached, degrading to template");
                break;
            }

            let attempt = self.attempt_timeout.min(remaining);
            match timeout(attempt, provider.generate(request)).await {
                Ok(Ok(generated)) => match self.validate(&generated.text, request) {
                    Ok(()) => {
                        return ChainOutcome {
                            text: generated.text,
                            confidence: generated.confidence.clamp(0.0, 1.0),
                            provider: name,
                            model: generated.model,
                            tokens: generated.tokens,
                            fallback_level: chain_level(level),
                        };
                    }
                    Err(reason) => {
                        warn!(provider = %name, %reason, "provider output rejected, falling back");
                    }
                },
                Ok(Err(err)) => {
                    warn!(provider = %name, error = %err, "provider failed, falling back");
                }
                Err(_) => {
                    warn!(provider = %name, timeout_ms = attempt.as_millis() as u64, "provider timed out, falling back");
                }
            }
        }
        ChainOutcome::template(template_text(request.topic.as_deref()))
    }

    /// Output validation applied to every provider's answer.
    fn validate(&self, text: &str, request: &GenerationRequest) -> Result<(), String> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err("empty response".to_string());
        }
        if text.chars().count() > self.max_response_chars {
            return Err(format!(
                "response exceeds {} characters",
                self.max_response_chars
            ));
        }
        // A response that is just the user's message echoed back answers
        // nothing.
        if trimmed.eq_ignore_ascii_case(request.message.trim()) {
            return Err("response echoes the user message".to_string());
        }
        let lowered = trimmed.to_lowercase();
        if let Some(marker) = PROMPT_MARKERS.iter().find(|m| lowered.contains(*m)) {
            return Err(format!("response leaks prompt scaffolding ({marker})"));
        }
        Ok(())
    }
}

/// Substrings that mark leaked prompt scaffolding in generated text.
/// Matched case-insensitively against the trimmed response.
const PROMPT_MARKERS: &[&str] = &["<|", "[inst]", "### system", "### instruction"];

/// Canned response used when no provider could answer.
fn template_text(topic: Option<&str>) -> String {
    match topic {
        Some(topic) => format!(
            "I'm sorry, I'm having trouble answering your question about {topic} right now. \
             A member of our support team will follow up with you shortly."
        ),
        None => "I'm sorry, I'm having trouble answering right now. \
                 A member of our support team will follow up with you shortly."
            .to_string(),
    }
}

/// Clamps a chain index into the non-sentinel range.
fn chain_level(level: usize) -> u8 {
    level.min(usize::from(FALLBACK_LEVEL_TEMPLATE - 1)) as u8
}
