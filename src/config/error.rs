//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration parsing failed: {0}")]
    ParseError(#[from] serde_json::Error),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("Invalid timeout: {0}")]
    InvalidTimeout(&'static str),

    #[error("Confidence threshold must be within [0.0, 1.0]")]
    InvalidConfidenceThreshold,

    #[error("knowledge_top_k must be at least 1")]
    InvalidKnowledgeTopK,

    #[error("max_response_chars must be at least 1")]
    InvalidMaxResponseChars,

    #[error("Inactivity timeout must be at least 1 minute")]
    InvalidInactivityTimeout,

    #[error("max_context_depth must be at least 1")]
    InvalidContextDepth,
}
