//! Mock analysis and generation adapters for testing.
//!
//! Keyword-driven analyzers give deterministic signals per message, and the
//! scripted generation provider returns queued responses or errors, so tests
//! exercise the pipeline without real AI services.

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

use crate::domain::ai::TokenUsage;
use crate::domain::analysis::{Emotion, Entity, Intent, Sentiment};
use crate::ports::{
    AnalysisError, EmotionDetector, EntityExtractor, GeneratedText, GenerationError,
    GenerationProvider, GenerationRequest, IntentClassifier, ProviderInfo, SentimentAnalyzer,
};

/// Keyword-driven intent classifier.
///
/// The first configured keyword found in the message wins; otherwise the
/// default intent is returned.
pub struct MockIntentClassifier {
    rules: Vec<(String, Intent)>,
    default: Intent,
    failing: bool,
}

impl MockIntentClassifier {
    /// Creates a classifier with the given fallback intent.
    pub fn new(default: Intent) -> Self {
        Self {
            rules: Vec::new(),
            default,
            failing: false,
        }
    }

    /// Maps messages containing `keyword` to `intent`.
    pub fn with_keyword(mut self, keyword: impl Into<String>, intent: Intent) -> Self {
        self.rules.push((keyword.into(), intent));
        self
    }

    /// Creates a classifier that always errors.
    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            default: Intent::unknown(),
            failing: true,
        }
    }
}

#[async_trait]
impl IntentClassifier for MockIntentClassifier {
    async fn classify(&self, message: &str) -> Result<Intent, AnalysisError> {
        if self.failing {
            return Err(AnalysisError::unavailable("intent classifier down"));
        }
        let lowered = message.to_lowercase();
        for (keyword, intent) in &self.rules {
            if lowered.contains(keyword.as_str()) {
                return Ok(intent.clone());
            }
        }
        Ok(self.default.clone())
    }
}

/// Keyword-driven entity extractor.
pub struct MockEntityExtractor {
    rules: Vec<(String, Entity)>,
    failing: bool,
}

impl MockEntityExtractor {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            failing: false,
        }
    }

    /// Emits `entity` for messages containing `keyword`.
    pub fn with_entity(mut self, keyword: impl Into<String>, entity: Entity) -> Self {
        self.rules.push((keyword.into(), entity));
        self
    }

    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            failing: true,
        }
    }
}

impl Default for MockEntityExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EntityExtractor for MockEntityExtractor {
    async fn extract(&self, message: &str) -> Result<Vec<Entity>, AnalysisError> {
        if self.failing {
            return Err(AnalysisError::unavailable("entity extractor down"));
        }
        let lowered = message.to_lowercase();
        Ok(self
            .rules
            .iter()
            .filter(|(keyword, _)| lowered.contains(keyword.as_str()))
            .map(|(_, entity)| entity.clone())
            .collect())
    }
}

/// Keyword-driven sentiment analyzer with a neutral default.
pub struct MockSentimentAnalyzer {
    rules: Vec<(String, f64)>,
    failing: bool,
}

impl MockSentimentAnalyzer {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            failing: false,
        }
    }

    /// Scores messages containing `keyword` with `score`.
    pub fn with_keyword(mut self, keyword: impl Into<String>, score: f64) -> Self {
        self.rules.push((keyword.into(), score));
        self
    }

    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            failing: true,
        }
    }
}

impl Default for MockSentimentAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SentimentAnalyzer for MockSentimentAnalyzer {
    async fn analyze(&self, message: &str) -> Result<Sentiment, AnalysisError> {
        if self.failing {
            return Err(AnalysisError::unavailable("sentiment analyzer down"));
        }
        let lowered = message.to_lowercase();
        for (keyword, score) in &self.rules {
            if lowered.contains(keyword.as_str()) {
                return Ok(Sentiment::new(*score));
            }
        }
        Ok(Sentiment::neutral())
    }
}

/// Keyword-driven emotion detector with an unknown default.
pub struct MockEmotionDetector {
    rules: Vec<(String, Emotion)>,
    failing: bool,
}

impl MockEmotionDetector {
    pub fn new() -> Self {
        Self {
            rules: Vec::new(),
            failing: false,
        }
    }

    /// Detects `emotion` in messages containing `keyword`.
    pub fn with_keyword(mut self, keyword: impl Into<String>, emotion: Emotion) -> Self {
        self.rules.push((keyword.into(), emotion));
        self
    }

    pub fn failing() -> Self {
        Self {
            rules: Vec::new(),
            failing: true,
        }
    }
}

impl Default for MockEmotionDetector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmotionDetector for MockEmotionDetector {
    async fn detect(&self, message: &str) -> Result<Emotion, AnalysisError> {
        if self.failing {
            return Err(AnalysisError::unavailable("emotion detector down"));
        }
        let lowered = message.to_lowercase();
        for (keyword, emotion) in &self.rules {
            if lowered.contains(keyword.as_str()) {
                return Ok(emotion.clone());
            }
        }
        Ok(Emotion::new("neutral", 0.1))
    }
}

/// A scripted generation response.
#[derive(Debug, Clone)]
pub enum MockGeneration {
    /// Answer with the given text and confidence.
    Success { text: String, confidence: f64 },
    /// Fail with a provider error.
    Unavailable,
    /// Refuse on safety grounds.
    ContentFiltered,
}

/// Scripted generation provider.
///
/// Responses are consumed in order; once exhausted, every further call
/// repeats the last configured behavior (or a canned success when nothing
/// was configured). Calls are recorded for verification.
pub struct MockGenerationProvider {
    info: ProviderInfo,
    script: Mutex<VecDeque<MockGeneration>>,
    last: Mutex<Option<MockGeneration>>,
    delay: Duration,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
}

impl MockGenerationProvider {
    /// Creates a provider with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        let model = format!("{name}-model");
        Self {
            info: ProviderInfo::new(name, model),
            script: Mutex::new(VecDeque::new()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Marks the provider as de-escalation tuned.
    pub fn deescalation_tuned(mut self) -> Self {
        self.info = self.info.with_deescalation();
        self
    }

    /// Queues a successful answer.
    pub fn with_answer(self, text: impl Into<String>, confidence: f64) -> Self {
        self.script.lock().unwrap().push_back(MockGeneration::Success {
            text: text.into(),
            confidence,
        });
        self
    }

    /// Queues a provider failure.
    pub fn with_failure(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(MockGeneration::Unavailable);
        self
    }

    /// Queues a safety refusal.
    pub fn with_refusal(self) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(MockGeneration::ContentFiltered);
        self
    }

    /// Adds simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of generation calls received.
    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    /// Recorded generation calls.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        self.calls.lock().unwrap().clone()
    }

    fn next_behavior(&self) -> MockGeneration {
        let mut script = self.script.lock().unwrap();
        if let Some(next) = script.pop_front() {
            *self.last.lock().unwrap() = Some(next.clone());
            return next;
        }
        self.last
            .lock()
            .unwrap()
            .clone()
            .unwrap_or(MockGeneration::Success {
                text: "Happy to help with that.".to_string(),
                confidence: 0.9,
            })
    }
}

#[async_trait]
impl GenerationProvider for MockGenerationProvider {
    async fn generate(
        &self,
        request: &GenerationRequest,
    ) -> Result<GeneratedText, GenerationError> {
        self.calls.lock().unwrap().push(request.clone());
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        match self.next_behavior() {
            MockGeneration::Success { text, confidence } => Ok(GeneratedText {
                text,
                confidence,
                model: self.info.model.clone(),
                tokens: TokenUsage::new(120, 40),
            }),
            MockGeneration::Unavailable => Err(GenerationError::unavailable("scripted outage")),
            MockGeneration::ContentFiltered => Err(GenerationError::ContentFiltered {
                reason: "scripted refusal".to_string(),
            }),
        }
    }

    fn provider_info(&self) -> ProviderInfo {
        self.info.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest {
            message: "my invoice looks wrong".to_string(),
            topic: None,
            intent: Intent::new("billing_question", 0.9),
            emotion: Emotion::new("neutral", 0.1),
            knowledge: vec![],
            options: Default::default(),
        }
    }

    #[tokio::test]
    async fn classifier_matches_keywords_before_default() {
        let classifier = MockIntentClassifier::new(Intent::new("general", 0.6))
            .with_keyword("refund", Intent::new("refund_request", 0.9));

        let hit = classifier.classify("I want a REFUND now").await.unwrap();
        assert_eq!(hit.label, "refund_request");

        let miss = classifier.classify("hello there").await.unwrap();
        assert_eq!(miss.label, "general");
    }

    #[tokio::test]
    async fn failing_analyzers_error() {
        assert!(MockIntentClassifier::failing().classify("x").await.is_err());
        assert!(MockSentimentAnalyzer::failing().analyze("x").await.is_err());
    }

    #[tokio::test]
    async fn provider_consumes_script_in_order_then_repeats_last() {
        let provider = MockGenerationProvider::new("scripted")
            .with_failure()
            .with_answer("second try", 0.8);

        assert!(provider.generate(&request()).await.is_err());
        let ok = provider.generate(&request()).await.unwrap();
        assert_eq!(ok.text, "second try");
        // Script exhausted: last behavior repeats.
        let again = provider.generate(&request()).await.unwrap();
        assert_eq!(again.text, "second try");
        assert_eq!(provider.call_count(), 3);
    }
}
