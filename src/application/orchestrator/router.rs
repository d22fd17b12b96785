//! Provider routing.
//!
//! Orders the configured generation providers for one turn based on intent
//! complexity and emotional state, and derives deterministic generation
//! options from the analysis signals.

use std::sync::Arc;

use tracing::debug;

use crate::domain::analysis::{Emotion, Intent, IntentComplexity};
use crate::ports::{GenerationOptions, GenerationProvider};

/// Routes turns to an ordered list of generation providers.
///
/// Providers are configured strongest-first. Simple intents flip the order
/// to prefer the cheaper end of the list; distressed users are routed to
/// de-escalation-tuned providers first regardless of complexity.
pub struct ProviderRouter {
    providers: Vec<Arc<dyn GenerationProvider>>,
    default_options: GenerationOptions,
}

impl ProviderRouter {
    /// Creates a router over a strongest-first provider list.
    pub fn new(providers: Vec<Arc<dyn GenerationProvider>>) -> Self {
        Self {
            providers,
            default_options: GenerationOptions::default(),
        }
    }

    /// Number of configured providers.
    pub fn provider_count(&self) -> usize {
        self.providers.len()
    }

    /// Orders providers for one turn.
    pub fn order_for(&self, intent: &Intent, emotion: &Emotion) -> Vec<Arc<dyn GenerationProvider>> {
        let mut ordered: Vec<Arc<dyn GenerationProvider>> = match intent.complexity() {
            // Cheap end of the list first for easy questions.
            IntentComplexity::Low => self.providers.iter().rev().cloned().collect(),
            IntentComplexity::Medium | IntentComplexity::High => self.providers.to_vec(),
        };

        if emotion.needs_deescalation() {
            // Stable partition: tuned providers first, relative order kept.
            let (tuned, rest): (Vec<_>, Vec<_>) = ordered
                .into_iter()
                .partition(|p| p.provider_info().deescalation_tuned);
            ordered = tuned;
            ordered.extend(rest);
        }

        debug!(
            complexity = ?intent.complexity(),
            deescalation = emotion.needs_deescalation(),
            order = ?ordered.iter().map(|p| p.provider_info().name).collect::<Vec<_>>(),
            "provider order selected"
        );
        ordered
    }

    /// Generation options for one turn.
    ///
    /// Temperature is a pure function of emotional intensity: the more
    /// intense the emotion, the more conservative the sampling. Identical
    /// analysis always yields identical options.
    pub fn options_for(&self, emotion: &Emotion) -> GenerationOptions {
        GenerationOptions {
            temperature: temperature_for_intensity(emotion.intensity),
            max_tokens: self.default_options.max_tokens,
        }
    }
}

/// Maps emotional intensity in `[0.0, 1.0]` to a sampling temperature,
/// linearly from 0.7 (calm) down to 0.2 (maximum intensity).
pub fn temperature_for_intensity(intensity: f64) -> f32 {
    let intensity = intensity.clamp(0.0, 1.0) as f32;
    0.7 - 0.5 * intensity
}
