//! Concurrent analysis fan-out.
//!
//! Runs the four analysis tasks concurrently, each under its own deadline.
//! A task that fails or times out degrades to its unknown/neutral value and
//! is recorded so downstream consumers know which signals are real.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::timeout;
use tracing::warn;

use crate::domain::analysis::{AnalysisTask, Emotion, Intent, Sentiment};
use crate::domain::conversation::MessageAnalysis;
use crate::ports::{
    AnalysisError, EmotionDetector, EntityExtractor, IntentClassifier, SentimentAnalyzer,
};

/// Fans one message out to all analysis collaborators.
pub struct AnalysisPipeline {
    intents: Arc<dyn IntentClassifier>,
    entities: Arc<dyn EntityExtractor>,
    sentiment: Arc<dyn SentimentAnalyzer>,
    emotions: Arc<dyn EmotionDetector>,
    task_timeout: Duration,
}

impl AnalysisPipeline {
    /// Creates a pipeline over the four analysis ports.
    pub fn new(
        intents: Arc<dyn IntentClassifier>,
        entities: Arc<dyn EntityExtractor>,
        sentiment: Arc<dyn SentimentAnalyzer>,
        emotions: Arc<dyn EmotionDetector>,
        task_timeout: Duration,
    ) -> Self {
        Self {
            intents,
            entities,
            sentiment,
            emotions,
            task_timeout,
        }
    }

    /// Analyzes one message; never fails, degrading signals instead.
    pub async fn analyze(&self, message: &str) -> MessageAnalysis {
        let (intent, entities, sentiment, emotion) = tokio::join!(
            timeout(self.task_timeout, self.intents.classify(message)),
            timeout(self.task_timeout, self.entities.extract(message)),
            timeout(self.task_timeout, self.sentiment.analyze(message)),
            timeout(self.task_timeout, self.emotions.detect(message)),
        );

        let mut degraded = Vec::new();
        let intent = unwrap_or_degrade(AnalysisTask::Intent, intent, &mut degraded)
            .unwrap_or_else(Intent::unknown);
        let entities = unwrap_or_degrade(AnalysisTask::Entities, entities, &mut degraded)
            .unwrap_or_default();
        let sentiment = unwrap_or_degrade(AnalysisTask::Sentiment, sentiment, &mut degraded)
            .unwrap_or_else(Sentiment::neutral);
        let emotion = unwrap_or_degrade(AnalysisTask::Emotion, emotion, &mut degraded)
            .unwrap_or_else(Emotion::unknown);

        MessageAnalysis {
            intent,
            entities,
            sentiment,
            emotion,
            degraded,
        }
    }
}

/// Collapses a timed, fallible task result to `Option`, recording the
/// degradation and the cause.
fn unwrap_or_degrade<T>(
    task: AnalysisTask,
    result: Result<Result<T, AnalysisError>, tokio::time::error::Elapsed>,
    degraded: &mut Vec<AnalysisTask>,
) -> Option<T> {
    match result {
        Ok(Ok(value)) => Some(value),
        Ok(Err(err)) => {
            warn!(?task, error = %err, "analysis task failed, degrading");
            degraded.push(task);
            None
        }
        Err(_) => {
            warn!(?task, "analysis task timed out, degrading");
            degraded.push(task);
            None
        }
    }
}
