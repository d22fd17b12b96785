//! Application configuration module
//!
//! Typed configuration sections with serde defaults, parsed from JSON by the
//! embedding application and validated before the service starts.
//!
//! # Example
//!
//! ```
//! use deskflow::config::AppConfig;
//!
//! let config = AppConfig::from_json("{}").unwrap();
//! assert_eq!(config.orchestrator.confidence_threshold, 0.7);
//! ```

mod conversation;
mod error;
mod orchestrator;

pub use conversation::ConversationConfig;
pub use error::{ConfigError, ValidationError};
pub use orchestrator::OrchestratorConfig;

use serde::Deserialize;

/// Root application configuration
///
/// Every field has a sensible default; an empty JSON object is a valid
/// configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Per-turn AI pipeline timeouts and bounds
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,

    /// Conversation lifecycle thresholds
    #[serde(default)]
    pub conversation: ConversationConfig,
}

impl AppConfig {
    /// Parse and validate configuration from a JSON document
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration sections
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.orchestrator.validate()?;
        self.conversation.validate()?;
        Ok(())
    }
}
