//! Orchestrator configuration

use serde::Deserialize;
use std::time::Duration;

use super::error::ValidationError;

/// Timeouts and bounds for the per-turn AI pipeline
#[derive(Debug, Clone, Deserialize)]
pub struct OrchestratorConfig {
    /// Per-task deadline for the analysis fan-out, in milliseconds
    #[serde(default = "default_analysis_timeout_ms")]
    pub analysis_timeout_ms: u64,

    /// Per-attempt deadline for one generation provider, in milliseconds
    #[serde(default = "default_provider_timeout_ms")]
    pub provider_timeout_ms: u64,

    /// Overall deadline for one turn, in milliseconds
    #[serde(default = "default_turn_deadline_ms")]
    pub turn_deadline_ms: u64,

    /// Below this overall confidence the orchestrator recommends escalation
    #[serde(default = "default_confidence_threshold")]
    pub confidence_threshold: f64,

    /// Knowledge retrieval result bound
    #[serde(default = "default_knowledge_top_k")]
    pub knowledge_top_k: usize,

    /// Upper bound on accepted response length, in characters
    #[serde(default = "default_max_response_chars")]
    pub max_response_chars: usize,
}

impl OrchestratorConfig {
    /// Per-task analysis deadline as a Duration
    pub fn analysis_timeout(&self) -> Duration {
        Duration::from_millis(self.analysis_timeout_ms)
    }

    /// Per-attempt provider deadline as a Duration
    pub fn provider_timeout(&self) -> Duration {
        Duration::from_millis(self.provider_timeout_ms)
    }

    /// Overall turn deadline as a Duration
    pub fn turn_deadline(&self) -> Duration {
        Duration::from_millis(self.turn_deadline_ms)
    }

    /// Validate orchestrator configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.analysis_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("analysis_timeout_ms"));
        }
        if self.provider_timeout_ms == 0 {
            return Err(ValidationError::InvalidTimeout("provider_timeout_ms"));
        }
        // A turn must have room for at least one analysis and one attempt.
        if self.turn_deadline_ms < self.analysis_timeout_ms.max(self.provider_timeout_ms) {
            return Err(ValidationError::InvalidTimeout("turn_deadline_ms"));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold) {
            return Err(ValidationError::InvalidConfidenceThreshold);
        }
        if self.knowledge_top_k == 0 {
            return Err(ValidationError::InvalidKnowledgeTopK);
        }
        if self.max_response_chars == 0 {
            return Err(ValidationError::InvalidMaxResponseChars);
        }
        Ok(())
    }
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            analysis_timeout_ms: default_analysis_timeout_ms(),
            provider_timeout_ms: default_provider_timeout_ms(),
            turn_deadline_ms: default_turn_deadline_ms(),
            confidence_threshold: default_confidence_threshold(),
            knowledge_top_k: default_knowledge_top_k(),
            max_response_chars: default_max_response_chars(),
        }
    }
}

fn default_analysis_timeout_ms() -> u64 {
    1_500
}

fn default_provider_timeout_ms() -> u64 {
    8_000
}

fn default_turn_deadline_ms() -> u64 {
    30_000
}

fn default_confidence_threshold() -> f64 {
    0.7
}

fn default_knowledge_top_k() -> usize {
    5
}

fn default_max_response_chars() -> usize {
    4_000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_orchestrator_defaults() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.confidence_threshold, 0.7);
        assert_eq!(config.knowledge_top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_turn_deadline_must_cover_one_attempt() {
        let config = OrchestratorConfig {
            provider_timeout_ms: 8_000,
            turn_deadline_ms: 5_000,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidTimeout("turn_deadline_ms"))
        );
    }

    #[test]
    fn test_confidence_threshold_bounds() {
        let config = OrchestratorConfig {
            confidence_threshold: 1.2,
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ValidationError::InvalidConfidenceThreshold)
        );
    }

    #[test]
    fn test_timeout_durations() {
        let config = OrchestratorConfig::default();
        assert_eq!(config.analysis_timeout(), Duration::from_millis(1_500));
        assert_eq!(config.turn_deadline(), Duration::from_millis(30_000));
    }
}
