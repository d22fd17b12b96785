//! Analysis Ports - Interfaces for per-message analysis collaborators.
//!
//! Four independent ports, one per analysis signal, so each collaborator can
//! fail or time out without taking the others down. The orchestrator fans
//! out to all four concurrently and degrades any signal whose port errors.

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::analysis::{Emotion, Entity, Intent, Sentiment};

/// Errors from analysis collaborators.
#[derive(Debug, Error)]
pub enum AnalysisError {
    /// Collaborator is temporarily unavailable.
    #[error("analyzer unavailable: {0}")]
    Unavailable(String),

    /// Collaborator returned something we could not interpret.
    #[error("malformed analyzer response: {0}")]
    Malformed(String),

    /// The analysis call exceeded its deadline.
    #[error("analysis timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl AnalysisError {
    /// Creates an unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable(message.into())
    }

    /// Creates a malformed-response error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::Malformed(message.into())
    }
}

/// Port for intent classification.
#[async_trait]
pub trait IntentClassifier: Send + Sync {
    /// Classifies the primary intent of a message, with secondary candidates.
    async fn classify(&self, message: &str) -> Result<Intent, AnalysisError>;
}

/// Port for entity extraction.
#[async_trait]
pub trait EntityExtractor: Send + Sync {
    /// Extracts typed entities from a message.
    async fn extract(&self, message: &str) -> Result<Vec<Entity>, AnalysisError>;
}

/// Port for sentiment scoring.
#[async_trait]
pub trait SentimentAnalyzer: Send + Sync {
    /// Scores message sentiment in `[-1.0, 1.0]`.
    async fn analyze(&self, message: &str) -> Result<Sentiment, AnalysisError>;
}

/// Port for emotion detection.
#[async_trait]
pub trait EmotionDetector: Send + Sync {
    /// Detects the dominant emotion and its intensity.
    async fn detect(&self, message: &str) -> Result<Emotion, AnalysisError>;
}
