//! Conversation lifecycle configuration

use chrono::Duration;
use serde::Deserialize;

use super::error::ValidationError;

/// Conversation lifecycle thresholds
#[derive(Debug, Clone, Deserialize)]
pub struct ConversationConfig {
    /// Minutes of user silence before an idle conversation is abandoned
    #[serde(default = "default_inactivity_timeout_mins")]
    pub inactivity_timeout_mins: i64,

    /// Maximum depth of the topic context stack
    #[serde(default = "default_max_context_depth")]
    pub max_context_depth: usize,
}

impl ConversationConfig {
    /// Inactivity threshold as a chrono Duration
    pub fn inactivity_timeout(&self) -> Duration {
        Duration::minutes(self.inactivity_timeout_mins)
    }

    /// Validate conversation configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.inactivity_timeout_mins < 1 {
            return Err(ValidationError::InvalidInactivityTimeout);
        }
        if self.max_context_depth == 0 {
            return Err(ValidationError::InvalidContextDepth);
        }
        Ok(())
    }
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            inactivity_timeout_mins: default_inactivity_timeout_mins(),
            max_context_depth: default_max_context_depth(),
        }
    }
}

fn default_inactivity_timeout_mins() -> i64 {
    30
}

fn default_max_context_depth() -> usize {
    5
}
